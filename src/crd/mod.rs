//! # Custom Resource Definitions
//!
//! CRD types for the cloud infrastructure controller.
//!
//! One CRD per managed resource kind, each carrying a user-authored `spec`
//! (desired state, including the adopted provider resource id) and an
//! engine-authored `status` (observed state). The [`ManagedObject`] trait is
//! the reconcile engine's uniform view over all kinds; it is implemented per
//! kind by the `impl_managed_object!` macro so the engine, scope, and object
//! store stay fully generic.
//!
//! ## Module Structure
//!
//! - `condition.rs` - shared condition types and the mark operation
//! - `network.rs` - VpcNetwork (VPC with subnets and optional VLAN range)
//! - `firewall.rs` - CloudFirewall (declarative ACL rules)
//! - `balancer.rs` - LoadBalancer (port configurations and health checks)
//! - `bucket.rs` - ObjectBucket (object storage bucket)
//! - `access_key.rs` - ObjectAccessKey (rotatable object storage credential)
//! - `placement.rs` - PlacementGroup (instance anti-affinity grouping)
//! - `instance.rs` - ComputeInstance (virtual machine)

use std::fmt;

pub mod condition;

pub use condition::{
    condition_is_true, mark_condition, Condition, ConditionSeverity, ConditionStatus,
};

/// Identity of a managed object inside the object store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub namespace: String,
    pub name: String,
}

impl ObjectId {
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The reconcile engine's view of a managed CRD.
///
/// `PartialEq` is required so the scope can diff the in-memory object against
/// its entry snapshot and skip the store write when nothing changed.
pub trait ManagedObject: Clone + PartialEq + Send + Sync + 'static {
    /// Namespace/name identity within the object store
    fn object_id(&self) -> ObjectId;

    /// Store-assigned UID, used as the unique ownership tag on external resources
    fn uid(&self) -> Option<&str>;

    /// Adopted external resource id, absent until creation/adoption
    fn external_id(&self) -> Option<&str>;

    /// Record the external resource id (absent -> present transition)
    fn set_external_id(&mut self, id: &str);

    /// Forget the external resource id after confirmed external deletion or
    /// a vanished external counterpart (404 on the update path)
    fn clear_external_id(&mut self);

    /// Whether removal from the store has been requested
    fn deletion_requested(&self) -> bool;

    fn has_finalizer(&self, finalizer: &str) -> bool;
    fn add_finalizer(&mut self, finalizer: &str);
    fn remove_finalizer(&mut self, finalizer: &str);

    /// Mark the resource ready/unready, updating the Ready condition
    fn set_ready(&mut self, ready: bool);

    /// Record a failure in status. Transient failures decay on the next
    /// successful cycle; permanent failures stay until the spec is fixed.
    fn set_failure(&mut self, reason: &str, message: &str, transient: bool);

    /// Clear any recorded failure after a successful cycle
    fn clear_failure(&mut self);

    /// Mark a condition through the shared mark operation
    fn mark_condition(
        &mut self,
        r#type: &str,
        status: ConditionStatus,
        reason: Option<&str>,
        message: Option<&str>,
        severity: Option<ConditionSeverity>,
    );
}

/// Implement [`ManagedObject`] for a CRD whose spec carries `external_id` and
/// whose status struct carries the common `ready`/`failure_reason`/
/// `failure_message`/`conditions` fields.
macro_rules! impl_managed_object {
    ($kind:ty, $status:ty) => {
        impl $kind {
            fn status_or_default(&mut self) -> &mut $status {
                self.status.get_or_insert_with(<$status>::default)
            }
        }

        impl crate::crd::ManagedObject for $kind {
            fn object_id(&self) -> crate::crd::ObjectId {
                crate::crd::ObjectId {
                    namespace: self
                        .metadata
                        .namespace
                        .clone()
                        .unwrap_or_else(|| "default".to_string()),
                    name: self.metadata.name.clone().unwrap_or_default(),
                }
            }

            fn uid(&self) -> Option<&str> {
                self.metadata.uid.as_deref()
            }

            fn external_id(&self) -> Option<&str> {
                self.spec.external_id.as_deref()
            }

            fn set_external_id(&mut self, id: &str) {
                self.spec.external_id = Some(id.to_string());
            }

            fn clear_external_id(&mut self) {
                self.spec.external_id = None;
            }

            fn deletion_requested(&self) -> bool {
                self.metadata.deletion_timestamp.is_some()
            }

            fn has_finalizer(&self, finalizer: &str) -> bool {
                self.metadata
                    .finalizers
                    .as_ref()
                    .is_some_and(|f| f.iter().any(|x| x == finalizer))
            }

            fn add_finalizer(&mut self, finalizer: &str) {
                let finalizers = self.metadata.finalizers.get_or_insert_with(Vec::new);
                if !finalizers.iter().any(|x| x == finalizer) {
                    finalizers.push(finalizer.to_string());
                }
            }

            fn remove_finalizer(&mut self, finalizer: &str) {
                if let Some(finalizers) = self.metadata.finalizers.as_mut() {
                    finalizers.retain(|x| x != finalizer);
                }
            }

            fn set_ready(&mut self, ready: bool) {
                let status = self.status_or_default();
                status.ready = ready;
                if ready {
                    crate::crd::mark_condition(
                        &mut status.conditions,
                        "Ready",
                        crate::crd::ConditionStatus::True,
                        Some("ReconciliationSucceeded"),
                        None,
                        None,
                    );
                } else {
                    crate::crd::mark_condition(
                        &mut status.conditions,
                        "Ready",
                        crate::crd::ConditionStatus::False,
                        Some("ReconciliationInProgress"),
                        None,
                        Some(crate::crd::ConditionSeverity::Info),
                    );
                }
            }

            fn set_failure(&mut self, reason: &str, message: &str, transient: bool) {
                let status = self.status_or_default();
                status.ready = false;
                status.failure_reason = Some(reason.to_string());
                status.failure_message = Some(message.to_string());
                let severity = if transient {
                    crate::crd::ConditionSeverity::Warning
                } else {
                    crate::crd::ConditionSeverity::Error
                };
                crate::crd::mark_condition(
                    &mut status.conditions,
                    "Ready",
                    crate::crd::ConditionStatus::False,
                    Some(reason),
                    Some(message),
                    Some(severity),
                );
            }

            fn clear_failure(&mut self) {
                if let Some(status) = self.status.as_mut() {
                    status.failure_reason = None;
                    status.failure_message = None;
                }
            }

            fn mark_condition(
                &mut self,
                r#type: &str,
                status: crate::crd::ConditionStatus,
                reason: Option<&str>,
                message: Option<&str>,
                severity: Option<crate::crd::ConditionSeverity>,
            ) {
                crate::crd::mark_condition(
                    &mut self.status_or_default().conditions,
                    r#type,
                    status,
                    reason,
                    message,
                    severity,
                );
            }
        }
    };
}

mod access_key;
mod balancer;
mod bucket;
mod firewall;
mod instance;
mod network;
mod placement;

pub use access_key::{
    AccessPermission, BucketAccessSpec, ObjectAccessKey, ObjectAccessKeySpec, ObjectAccessKeyStatus,
};
pub use balancer::{
    HealthCheckSpec, LoadBalancer, LoadBalancerSpec, LoadBalancerStatus, PortConfig, PortProtocol,
};
pub use bucket::{BucketAcl, ObjectBucket, ObjectBucketSpec, ObjectBucketStatus};
pub use firewall::{
    CloudFirewall, CloudFirewallSpec, CloudFirewallStatus, FirewallRuleSpec, RuleAction,
    RuleAddresses, RulePolicy, RuleProtocol,
};
pub use instance::{ComputeInstance, ComputeInstanceSpec, ComputeInstanceStatus, VlanAttachment};
pub use network::{SubnetSpec, VpcNetwork, VpcNetworkSpec, VpcNetworkStatus};
pub use placement::{PlacementGroup, PlacementGroupSpec, PlacementGroupStatus, PlacementPolicy};
