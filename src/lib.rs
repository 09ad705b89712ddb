//! # Cloud Infrastructure Controller
//!
//! A Kubernetes controller that continuously drives externally-hosted cloud
//! resources - virtual networks, firewalls, load balancers, object storage
//! buckets and access keys, placement groups, and compute instances -
//! toward their declared state, recovering from partial failure and
//! respecting the provider's rate limits.
//!
//! ## Overview
//!
//! Every managed kind shares one convergence engine:
//!
//! 1. **Watch** - a `kube_runtime::Controller` per CRD delivers changed
//!    objects to the engine (`controller::runtime`)
//! 2. **Scope** - each invocation opens a unit of work that snapshots the
//!    object and commits at most one store write when the cycle ends,
//!    whatever the exit path (`controller::scope`)
//! 3. **Dispatch** - the engine routes to the kind's create/update/delete
//!    handler, owning finalizers, idempotent adoption, 404 self-healing,
//!    and the error taxonomy (`controller::engine`)
//! 4. **Domain logic** - firewall ACL compilation, access-key rotation, and
//!    per-credential API quota gating live in pure, separately tested
//!    modules (`controller::acl`, `controller::rotation`, `provider::quota`)
//!
//! ## Features
//!
//! - **Idempotent creation**: external resources are tagged with the owning
//!   object's UID and adopted instead of duplicated after a crash
//! - **Crash-safe key rotation**: new key first, references moved, old key
//!   revoked last; failed revocations are recorded, never fatal
//! - **Rate-limit awareness**: instance creation is gated on the provider's
//!   advertised quota window, per credential
//! - **Prometheus metrics** and health probes over HTTP
//!
//! ## Usage
//!
//! See the [README.md](../README.md) for deployment instructions.

pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod provider;
pub mod secrets;
pub mod server;
pub mod store;

pub use controller::{Context, Outcome, ReconcileEngine, ReconcileError, ReconcileHandler, Scope};
pub use crd::{
    CloudFirewall, ComputeInstance, LoadBalancer, ManagedObject, ObjectAccessKey, ObjectBucket,
    ObjectId, PlacementGroup, VpcNetwork,
};
