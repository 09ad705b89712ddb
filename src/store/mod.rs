//! # Object Store
//!
//! The declarative object store collaborator: get/write/list over managed
//! objects with optimistic-concurrency conflict signalling on write.
//!
//! The reconcile engine only ever talks to the [`ObjectStore`] trait; the
//! production implementation is backed by the Kubernetes API (`kube.rs`),
//! and an in-memory implementation (`memory.rs`) backs the test-suite.

use async_trait::async_trait;
use thiserror::Error;

use crate::crd::ObjectId;

pub mod kube;
pub mod memory;

pub use self::kube::KubeStore;
pub use memory::InMemoryStore;

/// Errors surfaced by the object store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist
    #[error("object not found")]
    NotFound,
    /// The write lost an optimistic-concurrency race; the caller re-fetches
    /// and redoes the cycle
    #[error("optimistic concurrency conflict on write")]
    Conflict,
    /// Any other store request failure
    #[error("object store request failed: {0}")]
    Api(String),
    /// The object could not be serialized for the write
    #[error("object serialization failed: {0}")]
    Serialization(String),
}

/// Key-value object store with optimistic concurrency and label-indexed
/// list queries.
#[async_trait]
pub trait ObjectStore<R>: Send + Sync {
    /// Fetch an object by identity. Absent objects are `Ok(None)`, not an
    /// error - an absent object means reconciliation is a no-op.
    async fn get(&self, id: &ObjectId) -> Result<Option<R>, StoreError>;

    /// Persist the object. The write carries the object's observed revision;
    /// a concurrent writer surfaces as [`StoreError::Conflict`].
    async fn write(&self, resource: &R) -> Result<(), StoreError>;

    /// List objects matching a label selector
    async fn list(&self, label_selector: &str) -> Result<Vec<R>, StoreError>;
}
