//! LoadBalancer CRD - provider load balancer with port configurations.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::Condition;

#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cloud-infra.microscaler.io",
    version = "v1",
    kind = "LoadBalancer",
    namespaced,
    status = "LoadBalancerStatus",
    derive = "PartialEq",
    shortname = "clb",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    /// Provider id of the balancer once created or adopted
    #[serde(default)]
    pub external_id: Option<String>,
    /// Provider region the balancer lives in
    pub region: String,
    /// Balancer label. Defaults to the object name.
    #[serde(default)]
    pub label: Option<String>,
    /// Tags applied to the provider balancer
    #[serde(default)]
    pub tags: Vec<String>,
    /// Per-port frontend configuration
    #[serde(default)]
    pub port_configs: Vec<PortConfig>,
}

/// Frontend configuration for one balancer port
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    pub port: u16,
    pub protocol: PortProtocol,
    #[serde(default)]
    pub check: Option<HealthCheckSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PortProtocol {
    Http,
    Https,
    Tcp,
}

/// Backend health check attached to a port
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckSpec {
    #[serde(default)]
    pub interval_secs: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u32>,
    #[serde(default)]
    pub attempts: Option<u32>,
    /// HTTP path probed for http/https checks
    #[serde(default)]
    pub path: Option<String>,
}

/// Status of a LoadBalancer resource
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// DNS name assigned by the provider
    #[serde(default)]
    pub hostname: Option<String>,
    /// Public IPv4 assigned by the provider
    #[serde(default)]
    pub ipv4: Option<String>,
}

impl_managed_object!(LoadBalancer, LoadBalancerStatus);
