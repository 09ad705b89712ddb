//! # Scope (unit of work)
//!
//! One scope is opened per reconcile invocation and committed exactly once
//! when the invocation ends, whatever the exit path. Opening captures a
//! snapshot of the resource; handlers mutate the in-memory resource freely;
//! commit diffs against the snapshot and issues at most one object-store
//! write. Handlers must never write to the store themselves - the single
//! deferred write is what prevents lost-update races with the watch layer.

use std::sync::Arc;

use tracing::debug;

use crate::crd::ManagedObject;
use crate::provider::CloudApi;
use crate::store::{ObjectStore, StoreError};

/// Per-cycle unit of work: the resource, its provider client, and the
/// deferred commit
pub struct Scope<R: ManagedObject> {
    resource: R,
    snapshot: R,
    store: Arc<dyn ObjectStore<R>>,
    cloud: Arc<dyn CloudApi>,
}

impl<R: ManagedObject> std::fmt::Debug for Scope<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

impl<R: ManagedObject> Scope<R> {
    /// Capture the resource's state at entry and take exclusive ownership of
    /// the in-memory object for the cycle
    pub fn open(resource: R, store: Arc<dyn ObjectStore<R>>, cloud: Arc<dyn CloudApi>) -> Self {
        let snapshot = resource.clone();
        Self {
            resource,
            snapshot,
            store,
            cloud,
        }
    }

    #[must_use]
    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    /// Provider client for this cycle
    #[must_use]
    pub fn cloud(&self) -> &Arc<dyn CloudApi> {
        &self.cloud
    }

    /// Whether the resource differs from its entry snapshot
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.resource != self.snapshot
    }

    /// Persist any mutations made during the cycle.
    ///
    /// Consumes the scope: there is no way to write twice. A clean resource
    /// skips the write entirely so unchanged cycles generate no watch
    /// traffic.
    pub async fn commit(self) -> Result<(), StoreError> {
        if !self.is_dirty() {
            debug!("scope clean on commit, skipping store write");
            return Ok(());
        }
        self.store.write(&self.resource).await
    }
}
