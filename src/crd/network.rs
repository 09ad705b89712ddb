//! VpcNetwork CRD - a private network with subnets and an optional VLAN range.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::Condition;

/// VpcNetwork declares a provider VPC with its subnets.
///
/// The VLAN CIDR, when set, backs the per-network IP allocation used by
/// `ComputeInstance` VLAN attachments; the allocation set is released when
/// the network is torn down.
#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cloud-infra.microscaler.io",
    version = "v1",
    kind = "VpcNetwork",
    namespaced,
    status = "VpcNetworkStatus",
    derive = "PartialEq",
    shortname = "vpcnet",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VpcNetworkSpec {
    /// Provider id of the VPC once created or adopted.
    /// Set by the controller; transitions absent -> present and is only
    /// cleared when the external VPC is confirmed gone.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Provider region the VPC lives in
    pub region: String,
    /// VPC label. Defaults to the object name.
    #[serde(default)]
    pub label: Option<String>,
    /// Free-form description forwarded to the provider
    #[serde(default)]
    pub description: Option<String>,
    /// Subnets created inside the VPC
    #[serde(default)]
    pub subnets: Vec<SubnetSpec>,
    /// CIDR of the VLAN address range instances may allocate from
    /// (e.g. "10.0.0.0/24"). The first host address is reserved for the
    /// gateway and never handed out.
    #[serde(default)]
    pub vlan_cidr: Option<String>,
}

/// A single subnet inside the VPC
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    pub label: String,
    /// IPv4 CIDR of the subnet
    pub ipv4: String,
}

/// Status of a VpcNetwork resource
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpcNetworkStatus {
    /// Whether the VPC exists and matches the declared state
    #[serde(default)]
    pub ready: bool,
    /// Machine-readable reason for the last failure
    #[serde(default)]
    pub failure_reason: Option<String>,
    /// Human-readable message for the last failure
    #[serde(default)]
    pub failure_message: Option<String>,
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl_managed_object!(VpcNetwork, VpcNetworkStatus);
