//! # Status Conditions
//!
//! Condition types shared by every managed CRD, plus the mark operation that
//! is the only sanctioned way to mutate them. `last_transition_time` is bumped
//! only when a condition's status or reason actually changes, so the field
//! stays meaningful across repeated reconciliations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents a status condition for a managed resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g. "Ready", "RulesCompiled", "KeyRotated")
    pub r#type: String,
    /// Status of condition
    pub status: ConditionStatus,
    /// Last transition time (RFC 3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Machine-readable reason for the condition's status
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message describing the condition
    #[serde(default)]
    pub message: Option<String>,
    /// Severity of the condition when status is not True
    #[serde(default)]
    pub severity: Option<ConditionSeverity>,
}

/// Status of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Severity distinguishes errors that block the resource from warnings that
/// decay on the next successful cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionSeverity {
    Error,
    Warning,
    Info,
}

/// Mark a condition on a condition list.
///
/// Inserts the condition if absent. On an existing condition, the message is
/// always refreshed but `last_transition_time` moves only when status or
/// reason changed.
pub fn mark_condition(
    conditions: &mut Vec<Condition>,
    r#type: &str,
    status: ConditionStatus,
    reason: Option<&str>,
    message: Option<&str>,
    severity: Option<ConditionSeverity>,
) {
    let now = chrono::Utc::now().to_rfc3339();
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == r#type) {
        let transitioned = existing.status != status || existing.reason.as_deref() != reason;
        existing.status = status;
        existing.reason = reason.map(str::to_string);
        existing.message = message.map(str::to_string);
        existing.severity = severity;
        if transitioned {
            existing.last_transition_time = Some(now);
        }
        return;
    }
    conditions.push(Condition {
        r#type: r#type.to_string(),
        status,
        last_transition_time: Some(now),
        reason: reason.map(str::to_string),
        message: message.map(str::to_string),
        severity,
    });
}

/// Check whether a condition of the given type is currently True
#[must_use]
pub fn condition_is_true(conditions: &[Condition], r#type: &str) -> bool {
    conditions
        .iter()
        .find(|c| c.r#type == r#type)
        .is_some_and(|c| c.status == ConditionStatus::True)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_condition_inserts_when_absent() {
        let mut conditions = Vec::new();
        mark_condition(
            &mut conditions,
            "Ready",
            ConditionStatus::True,
            Some("ReconciliationSucceeded"),
            None,
            None,
        );

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].r#type, "Ready");
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert!(conditions[0].last_transition_time.is_some());
    }

    #[test]
    fn test_mark_condition_preserves_transition_time_when_unchanged() {
        let mut conditions = Vec::new();
        mark_condition(
            &mut conditions,
            "Ready",
            ConditionStatus::False,
            Some("Provisioning"),
            Some("instance is booting"),
            Some(ConditionSeverity::Info),
        );
        let first_transition = conditions[0].last_transition_time.clone();

        // Same status and reason, new message: the message refreshes but the
        // transition timestamp must not move
        mark_condition(
            &mut conditions,
            "Ready",
            ConditionStatus::False,
            Some("Provisioning"),
            Some("still booting"),
            Some(ConditionSeverity::Info),
        );

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].message.as_deref(), Some("still booting"));
        assert_eq!(conditions[0].last_transition_time, first_transition);
    }

    #[test]
    fn test_mark_condition_bumps_transition_time_on_status_change() {
        let mut conditions = Vec::new();
        mark_condition(
            &mut conditions,
            "Ready",
            ConditionStatus::False,
            Some("Provisioning"),
            None,
            None,
        );
        // Force an observable difference in the stored timestamp
        conditions[0].last_transition_time = Some("2001-01-01T00:00:00Z".to_string());

        mark_condition(
            &mut conditions,
            "Ready",
            ConditionStatus::True,
            Some("ReconciliationSucceeded"),
            None,
            None,
        );

        assert_ne!(
            conditions[0].last_transition_time.as_deref(),
            Some("2001-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_distinct_types_coexist() {
        let mut conditions = Vec::new();
        mark_condition(&mut conditions, "Ready", ConditionStatus::True, None, None, None);
        mark_condition(
            &mut conditions,
            "RulesCompiled",
            ConditionStatus::False,
            Some("TooManyRules"),
            None,
            Some(ConditionSeverity::Error),
        );

        assert_eq!(conditions.len(), 2);
        assert!(condition_is_true(&conditions, "Ready"));
        assert!(!condition_is_true(&conditions, "RulesCompiled"));
    }

    #[test]
    fn test_condition_is_true_for_missing_type() {
        assert!(!condition_is_true(&[], "Ready"));
    }
}
