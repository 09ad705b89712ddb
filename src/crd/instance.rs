//! ComputeInstance CRD - a virtual machine, optionally attached to a
//! firewall, placement group, and VLAN.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::Condition;

/// ComputeInstance declares a provider virtual machine.
///
/// Instance creation is the provider's expensive call class: it is gated by
/// the per-credential quota tracker and deferred (requeued) while the quota
/// window is exhausted.
#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cloud-infra.microscaler.io",
    version = "v1",
    kind = "ComputeInstance",
    namespaced,
    status = "ComputeInstanceStatus",
    derive = "PartialEq",
    shortname = "cvm",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"State", "type":"string", "jsonPath":".status.instanceState"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ComputeInstanceSpec {
    /// Provider id of the instance once created or adopted
    #[serde(default)]
    pub external_id: Option<String>,
    /// Instance label. Defaults to the object name.
    #[serde(default)]
    pub label: Option<String>,
    /// Provider region the instance lives in
    pub region: String,
    /// Provider instance type (e.g. "g6-standard-2")
    pub instance_type: String,
    /// Image the instance boots from
    #[serde(default)]
    pub image: Option<String>,
    /// Tags applied to the provider instance
    #[serde(default)]
    pub tags: Vec<String>,
    /// Provider id of a firewall to attach
    #[serde(default)]
    pub firewall_id: Option<String>,
    /// Provider id of a placement group to join at creation
    #[serde(default)]
    pub placement_group_id: Option<String>,
    /// VLAN attachment; an address is allocated from the named network's
    /// VLAN range at creation
    #[serde(default)]
    pub vlan: Option<VlanAttachment>,
}

/// VLAN attachment request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VlanAttachment {
    /// VLAN label; also the allocation key in the IP registry
    pub label: String,
    /// CIDR addresses are allocated from
    pub cidr: String,
}

/// Status of a ComputeInstance resource
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputeInstanceStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Public IPv4 assigned by the provider
    #[serde(default)]
    pub ipv4: Option<String>,
    /// VLAN address allocated for this instance
    #[serde(default)]
    pub vlan_ip: Option<String>,
    /// Last observed provider state ("provisioning", "running", ...)
    #[serde(default)]
    pub instance_state: Option<String>,
}

impl_managed_object!(ComputeInstance, ComputeInstanceStatus);
