//! PlacementGroup CRD - instance affinity/anti-affinity grouping.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::Condition;

#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cloud-infra.microscaler.io",
    version = "v1",
    kind = "PlacementGroup",
    namespaced,
    status = "PlacementGroupStatus",
    derive = "PartialEq",
    shortname = "pg",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PlacementGroupSpec {
    /// Provider id of the group once created or adopted
    #[serde(default)]
    pub external_id: Option<String>,
    /// Group label. Defaults to the object name.
    #[serde(default)]
    pub label: Option<String>,
    /// Provider region the group lives in
    pub region: String,
    #[serde(default)]
    pub placement_policy: PlacementPolicy,
    /// Strict groups refuse instance creation when the policy cannot be
    /// satisfied; non-strict groups fall back to best effort
    #[serde(default = "default_true")]
    pub is_strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    Affinity,
    #[default]
    AntiAffinity,
}

fn default_true() -> bool {
    true
}

/// Status of a PlacementGroup resource
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementGroupStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl_managed_object!(PlacementGroup, PlacementGroupStatus);
