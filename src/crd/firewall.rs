//! CloudFirewall CRD - declarative ACL rules compiled into provider rule sets.
//!
//! The declared rule lists are the compiler's input; the provider-facing rule
//! set (chunked by address count, policy inverted) never appears in the spec.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::Condition;

/// CloudFirewall declares inbound/outbound ACL rules plus the default policy
/// for unmatched traffic.
#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cloud-infra.microscaler.io",
    version = "v1",
    kind = "CloudFirewall",
    namespaced,
    status = "CloudFirewallStatus",
    derive = "PartialEq",
    shortname = "cfw",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CloudFirewallSpec {
    /// Provider id of the firewall once created or adopted
    #[serde(default)]
    pub external_id: Option<String>,
    /// Firewall label. Defaults to the object name.
    #[serde(default)]
    pub label: Option<String>,
    /// Tags applied to the provider firewall
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ordered inbound rules
    #[serde(default)]
    pub inbound: Vec<FirewallRuleSpec>,
    /// Declared inbound policy. `ACCEPT` means the rule list is an
    /// allow-list: unmatched inbound traffic is dropped.
    #[serde(default)]
    pub inbound_policy: RulePolicy,
    /// Ordered outbound rules
    #[serde(default)]
    pub outbound: Vec<FirewallRuleSpec>,
    /// Declared outbound policy, allow-list/deny-list semantics as above
    #[serde(default)]
    pub outbound_policy: RulePolicy,
}

/// A single declarative firewall rule
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleSpec {
    pub action: RuleAction,
    /// Rule label; chunked provider rules share this as their prefix
    pub label: String,
    pub protocol: RuleProtocol,
    /// Port or port range ("443", "8000-8080", "80,443"). Omitted for
    /// protocols without ports (ICMP).
    #[serde(default)]
    pub ports: Option<String>,
    pub addresses: RuleAddresses,
}

/// Source (inbound) or destination (outbound) addresses of a rule,
/// by address family
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleAddresses {
    /// IPv4 CIDRs
    #[serde(default)]
    pub ipv4: Option<Vec<String>>,
    /// IPv6 CIDRs
    #[serde(default)]
    pub ipv6: Option<Vec<String>>,
}

/// Action taken by a rule on matching traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleAction {
    Accept,
    Drop,
}

/// Transport protocol matched by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleProtocol {
    Tcp,
    Udp,
    Icmp,
}

/// Declared list policy; also the type of the compiled default policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RulePolicy {
    #[default]
    Accept,
    Drop,
}

impl RulePolicy {
    /// Allow-list/deny-list inversion: a declared `ACCEPT` policy compiles
    /// to an effective default of `DROP` for unmatched traffic, and vice
    /// versa.
    #[must_use]
    pub fn invert(self) -> Self {
        match self {
            Self::Accept => Self::Drop,
            Self::Drop => Self::Accept,
        }
    }
}

/// Status of a CloudFirewall resource
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudFirewallStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Number of provider rules produced by the last successful compilation
    #[serde(default)]
    pub compiled_rule_count: Option<i32>,
}

impl_managed_object!(CloudFirewall, CloudFirewallStatus);
