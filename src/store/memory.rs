//! In-memory object store.
//!
//! Backs the test-suite and local dry-runs. Supports injecting write
//! failures (including optimistic-concurrency conflicts) and counts writes
//! so tests can assert the commit-exactly-once contract.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ObjectStore, StoreError};
use crate::crd::{ManagedObject, ObjectId};

/// Lock-protected map of objects keyed by namespace/name
#[derive(Debug, Default)]
pub struct InMemoryStore<R> {
    objects: Mutex<HashMap<ObjectId, R>>,
    injected_write_errors: Mutex<Vec<StoreError>>,
    write_count: Mutex<u32>,
}

impl<R: ManagedObject> InMemoryStore<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            injected_write_errors: Mutex::new(Vec::new()),
            write_count: Mutex::new(0),
        }
    }

    /// Seed an object directly, bypassing write accounting
    pub fn insert(&self, resource: R) {
        let id = resource.object_id();
        self.objects
            .lock()
            .expect("store mutex poisoned")
            .insert(id, resource);
    }

    /// Remove an object directly (simulates store-side garbage collection)
    pub fn remove(&self, id: &ObjectId) -> Option<R> {
        self.objects.lock().expect("store mutex poisoned").remove(id)
    }

    /// Fetch a snapshot of an object without going through the trait
    #[must_use]
    pub fn get_sync(&self, id: &ObjectId) -> Option<R> {
        self.objects
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned()
    }

    /// Queue an error for the next write; queued errors are consumed in order
    pub fn fail_next_write(&self, err: StoreError) {
        self.injected_write_errors
            .lock()
            .expect("store mutex poisoned")
            .push(err);
    }

    /// Number of successful writes since construction
    #[must_use]
    pub fn write_count(&self) -> u32 {
        *self.write_count.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl<R: ManagedObject> ObjectStore<R> for InMemoryStore<R> {
    async fn get(&self, id: &ObjectId) -> Result<Option<R>, StoreError> {
        Ok(self
            .objects
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned())
    }

    async fn write(&self, resource: &R) -> Result<(), StoreError> {
        let injected = self
            .injected_write_errors
            .lock()
            .expect("store mutex poisoned")
            .pop();
        if let Some(err) = injected {
            return Err(err);
        }

        let id = resource.object_id();
        self.objects
            .lock()
            .expect("store mutex poisoned")
            .insert(id, resource.clone());
        *self.write_count.lock().expect("store mutex poisoned") += 1;
        Ok(())
    }

    async fn list(&self, _label_selector: &str) -> Result<Vec<R>, StoreError> {
        // Label indexing is a real-store concern; the in-memory store returns
        // everything and lets the test filter
        Ok(self
            .objects
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect())
    }
}
