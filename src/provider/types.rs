//! Wire types for the provider RPC facade.
//!
//! One resource struct plus create/update option structs per kind. Update
//! options use `Option` fields with `None` meaning "leave unchanged", so a
//! partial update serializes only the fields being written.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// VPC networks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Vpc {
    pub id: String,
    pub label: String,
    pub region: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subnets: Vec<VpcSubnet>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VpcSubnet {
    pub id: String,
    pub label: String,
    pub ipv4: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VpcCreateOpts {
    pub label: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<VpcSubnetCreateOpts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VpcSubnetCreateOpts {
    pub label: String,
    pub ipv4: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VpcUpdateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Firewalls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Firewall {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub rules: FirewallRuleSet,
}

/// Provider-facing rule set: the ACL compiler's output
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FirewallRuleSet {
    #[serde(default)]
    pub inbound: Vec<ProviderRule>,
    /// Effective default policy for unmatched inbound traffic
    pub inbound_policy: String,
    #[serde(default)]
    pub outbound: Vec<ProviderRule>,
    /// Effective default policy for unmatched outbound traffic
    pub outbound_policy: String,
}

/// One provider rule entry; addresses never exceed the per-rule cap and
/// carry exactly one address family
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderRule {
    pub action: String,
    pub label: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
    pub addresses: ProviderRuleAddresses,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ProviderRuleAddresses {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirewallCreateOpts {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub rules: FirewallRuleSet,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FirewallUpdateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<FirewallRuleSet>,
}

// ---------------------------------------------------------------------------
// Load balancers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Balancer {
    pub id: String,
    pub label: String,
    pub region: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ports: Vec<BalancerPort>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BalancerPort {
    pub port: u16,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_timeout_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancerCreateOpts {
    pub label: String,
    pub region: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<BalancerPort>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BalancerUpdateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<BalancerPort>>,
}

// ---------------------------------------------------------------------------
// Object storage buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Bucket {
    pub id: String,
    pub label: String,
    pub region: String,
    pub hostname: String,
    #[serde(default)]
    pub acl: Option<String>,
    #[serde(default)]
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCreateOpts {
    pub label: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BucketUpdateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_enabled: Option<bool>,
}

// ---------------------------------------------------------------------------
// Object storage access keys
// ---------------------------------------------------------------------------

/// A provider access key.
///
/// The provider returns the full key material on both create and get; the
/// secret-missing recovery path depends on fetch-by-id returning the secret
/// so an out-of-band-deleted credential Secret can be restored without
/// invalidating the key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObjectKey {
    pub id: String,
    pub label: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub bucket_access: Vec<BucketAccessGrant>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BucketAccessGrant {
    pub bucket_name: String,
    pub region: String,
    pub permissions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectKeyCreateOpts {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bucket_access: Vec<BucketAccessGrant>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ObjectKeyUpdateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Placement groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlacementGroup {
    pub id: String,
    pub label: String,
    pub region: String,
    pub placement_policy: String,
    pub is_strict: bool,
    #[serde(default)]
    pub member_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementGroupCreateOpts {
    pub label: String,
    pub region: String,
    pub placement_policy: String,
    pub is_strict: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PlacementGroupUpdateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Compute instances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Instance {
    pub id: String,
    pub label: String,
    pub region: String,
    pub instance_type: String,
    /// Provider lifecycle state: "provisioning", "running", "offline", ...
    pub status: String,
    #[serde(default)]
    pub ipv4: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub placement_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceCreateOpts {
    pub label: String,
    pub region: String,
    pub instance_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firewall_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<VlanInterfaceOpts>,
}

/// VLAN interface attached at instance creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlanInterfaceOpts {
    pub label: String,
    /// Address assigned from the VLAN range, in CIDR notation
    pub ipam_address: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InstanceUpdateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
