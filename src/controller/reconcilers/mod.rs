//! # Per-Kind Reconcilers
//!
//! One [`ReconcileHandler`](crate::controller::engine::ReconcileHandler)
//! implementation per managed kind. Cross-kind behavior (finalizers,
//! adoption fan-out, error policy, commit) lives in the engine; these
//! modules hold only what is genuinely kind-specific - ACL compilation for
//! firewalls, the rotation state machine for access keys, the quota gate
//! and VLAN allocation for instances.

pub mod helpers;

mod access_key;
mod balancer;
mod bucket;
mod firewall;
mod instance;
mod network;
mod placement;

pub use access_key::ObjectAccessKeyReconciler;
pub use balancer::LoadBalancerReconciler;
pub use bucket::ObjectBucketReconciler;
pub use firewall::CloudFirewallReconciler;
pub use instance::ComputeInstanceReconciler;
pub use network::VpcNetworkReconciler;
pub use placement::PlacementGroupReconciler;
