//! # Provider Facade
//!
//! Typed wrapper over the cloud provider's RPC API, one facade trait per
//! resource kind plus the [`CloudApi`] umbrella the reconcilers consume.
//!
//! The facade is deliberately narrow: list/get/create/update/delete per
//! kind, typed option structs, and a typed error the engine can classify.
//! The production implementation (`rest.rs`) is a reqwest client; the
//! test-suite substitutes a scripted fake behind the same traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod filter;
pub mod quota;
pub mod rest;
pub mod types;

pub use filter::ListFilter;
pub use quota::{credential_fingerprint, QuotaRegistry, QuotaState, QUOTA_CLOCK_SKEW};
pub use rest::{ClientOptions, RestClient};
pub use types::*;

/// Errors surfaced by the provider facade
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The external resource does not exist
    #[error("provider resource not found: {0}")]
    NotFound(String),
    /// The provider throttled the call; the quota window resets at the
    /// given time
    #[error("provider rate limited, quota resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },
    /// The provider rejected the request as malformed (4xx). The declared
    /// spec needs fixing; retrying is pointless.
    #[error("provider rejected request: {0}")]
    BadRequest(String),
    /// Any other provider API failure
    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },
    /// Transport-level failure (connection, TLS, DNS)
    #[error("provider transport error: {0}")]
    Transport(String),
    /// The per-call deadline expired
    #[error("provider request timed out")]
    Timeout,
}

impl ProviderError {
    /// Whether a retry can reasonably succeed without a spec change
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transport(_) | Self::Timeout => true,
            Self::Api { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }
}

#[async_trait]
pub trait VpcApi: Send + Sync {
    async fn list_vpcs(&self, filter: &ListFilter) -> Result<Vec<Vpc>, ProviderError>;
    async fn get_vpc(&self, id: &str) -> Result<Vpc, ProviderError>;
    async fn create_vpc(&self, opts: VpcCreateOpts) -> Result<Vpc, ProviderError>;
    async fn update_vpc(&self, id: &str, opts: VpcUpdateOpts) -> Result<Vpc, ProviderError>;
    async fn delete_vpc(&self, id: &str) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait FirewallApi: Send + Sync {
    async fn list_firewalls(&self, filter: &ListFilter) -> Result<Vec<Firewall>, ProviderError>;
    async fn get_firewall(&self, id: &str) -> Result<Firewall, ProviderError>;
    async fn create_firewall(&self, opts: FirewallCreateOpts) -> Result<Firewall, ProviderError>;
    async fn update_firewall(
        &self,
        id: &str,
        opts: FirewallUpdateOpts,
    ) -> Result<Firewall, ProviderError>;
    async fn delete_firewall(&self, id: &str) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait BalancerApi: Send + Sync {
    async fn list_balancers(&self, filter: &ListFilter) -> Result<Vec<Balancer>, ProviderError>;
    async fn get_balancer(&self, id: &str) -> Result<Balancer, ProviderError>;
    async fn create_balancer(&self, opts: BalancerCreateOpts) -> Result<Balancer, ProviderError>;
    async fn update_balancer(
        &self,
        id: &str,
        opts: BalancerUpdateOpts,
    ) -> Result<Balancer, ProviderError>;
    async fn delete_balancer(&self, id: &str) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait BucketApi: Send + Sync {
    async fn list_buckets(&self, filter: &ListFilter) -> Result<Vec<Bucket>, ProviderError>;
    async fn get_bucket(&self, id: &str) -> Result<Bucket, ProviderError>;
    async fn create_bucket(&self, opts: BucketCreateOpts) -> Result<Bucket, ProviderError>;
    async fn update_bucket(&self, id: &str, opts: BucketUpdateOpts)
        -> Result<Bucket, ProviderError>;
    async fn delete_bucket(&self, id: &str) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait ObjectKeyApi: Send + Sync {
    async fn list_object_keys(&self, filter: &ListFilter)
        -> Result<Vec<ObjectKey>, ProviderError>;
    async fn get_object_key(&self, id: &str) -> Result<ObjectKey, ProviderError>;
    async fn create_object_key(
        &self,
        opts: ObjectKeyCreateOpts,
    ) -> Result<ObjectKey, ProviderError>;
    async fn update_object_key(
        &self,
        id: &str,
        opts: ObjectKeyUpdateOpts,
    ) -> Result<ObjectKey, ProviderError>;
    async fn delete_object_key(&self, id: &str) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait PlacementApi: Send + Sync {
    async fn list_placement_groups(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<PlacementGroup>, ProviderError>;
    async fn get_placement_group(&self, id: &str) -> Result<PlacementGroup, ProviderError>;
    async fn create_placement_group(
        &self,
        opts: PlacementGroupCreateOpts,
    ) -> Result<PlacementGroup, ProviderError>;
    async fn update_placement_group(
        &self,
        id: &str,
        opts: PlacementGroupUpdateOpts,
    ) -> Result<PlacementGroup, ProviderError>;
    async fn delete_placement_group(&self, id: &str) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait InstanceApi: Send + Sync {
    async fn list_instances(&self, filter: &ListFilter) -> Result<Vec<Instance>, ProviderError>;
    async fn get_instance(&self, id: &str) -> Result<Instance, ProviderError>;
    /// The expensive call class: responses carry quota headers that feed the
    /// quota registry, and callers gate on the registry before invoking
    async fn create_instance(&self, opts: InstanceCreateOpts) -> Result<Instance, ProviderError>;
    async fn update_instance(
        &self,
        id: &str,
        opts: InstanceUpdateOpts,
    ) -> Result<Instance, ProviderError>;
    async fn delete_instance(&self, id: &str) -> Result<(), ProviderError>;
}

/// Umbrella facade consumed by the reconcilers
pub trait CloudApi:
    VpcApi + FirewallApi + BalancerApi + BucketApi + ObjectKeyApi + PlacementApi + InstanceApi
{
}

impl<T> CloudApi for T where
    T: VpcApi + FirewallApi + BalancerApi + BucketApi + ObjectKeyApi + PlacementApi + InstanceApi
{
}
