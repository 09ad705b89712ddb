//! # Controller Core
//!
//! The declarative convergence engine: the reconcile state machine shared by
//! every resource kind, the per-cycle unit of work, and the domain
//! algorithms embedded in it.
//!
//! ## Module Structure
//!
//! - `engine.rs` - generic reconcile loop and handler trait
//! - `scope.rs` - per-cycle unit of work with deferred single commit
//! - `error.rs` - error taxonomy and requeue policy
//! - `acl.rs` - pure firewall rule compilation
//! - `rotation.rs` - access-key rotation state machine
//! - `ipalloc.rs` - keyed VLAN address allocation
//! - `backoff.rs` - Fibonacci retry backoff
//! - `runtime.rs` - kube watch-stream front-end
//! - `reconcilers/` - one handler per managed kind

pub mod acl;
pub mod backoff;
pub mod engine;
pub mod error;
pub mod ipalloc;
pub mod reconcilers;
pub mod rotation;
pub mod runtime;
pub mod scope;

pub use engine::{Context, Outcome, ReconcileEngine, ReconcileHandler};
pub use error::{ErrorPolicy, ReconcileError};
pub use scope::Scope;
