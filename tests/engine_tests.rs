//! Engine behavior: finalizer protocol, idempotent adoption, commit
//! semantics, self-healing, and deletion ordering, driven against the
//! in-memory store and the scripted fake provider.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::Resource as _;

use cloud_infra_controller::constants::{FINALIZER, TRANSIENT_REQUEUE_SECS};
use cloud_infra_controller::controller::engine::{Context, Outcome};
use cloud_infra_controller::controller::reconcilers::ComputeInstanceReconciler;
use cloud_infra_controller::controller::{ReconcileError, ReconcileHandler, Scope};
use cloud_infra_controller::crd::{ComputeInstance, ManagedObject, ObjectId};
use cloud_infra_controller::store::{InMemoryStore, StoreError};

use common::{
    engine_for, instance_object, mark_deleting, owner_tag_for, reconcile_settled, test_world,
};

#[tokio::test]
async fn test_absent_object_is_a_successful_noop() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::<ComputeInstance>::new());
    let engine = engine_for(&world, &store, ComputeInstanceReconciler);

    let outcome = engine
        .reconcile(&ObjectId::new("default", "ghost"))
        .await
        .expect("absent object reconciles as a no-op");

    assert_eq!(outcome.requeue_after, None);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_finalizer_is_persisted_before_any_external_work() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, ComputeInstanceReconciler);

    let object = instance_object("web-1", "uid-1");
    let id = object.object_id();
    store.insert(object);

    let outcome = engine.reconcile(&id).await.expect("first cycle");

    // The finalizer cycle commits and asks to come right back
    assert_eq!(outcome.requeue_after, Some(Duration::ZERO));
    assert_eq!(store.write_count(), 1);
    let stored = store.get_sync(&id).expect("object kept");
    assert!(stored.has_finalizer(FINALIZER));
    // No provider mutation happened yet
    assert_eq!(world.cloud.call_count("create_instance"), 0);
}

#[tokio::test]
async fn test_create_then_adopt_is_idempotent() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, ComputeInstanceReconciler);

    let object = instance_object("web-1", "uid-1");
    let id = object.object_id();
    store.insert(object);

    reconcile_settled(&engine, &id).await.expect("creates");
    let first_external = store
        .get_sync(&id)
        .and_then(|o| o.external_id().map(str::to_string))
        .expect("external id recorded");
    assert_eq!(world.cloud.call_count("create_instance"), 1);

    // Simulate a crash after the external create but before the commit: the
    // stored object forgets its external id while the instance lives on
    let mut stored = store.get_sync(&id).expect("object kept");
    stored.clear_external_id();
    store.insert(stored);

    reconcile_settled(&engine, &id).await.expect("re-enters create");

    // The unique-tag list found the orphan and adopted it instead of
    // creating a twin
    assert_eq!(world.cloud.call_count("create_instance"), 1);
    let adopted = store
        .get_sync(&id)
        .and_then(|o| o.external_id().map(str::to_string))
        .expect("external id re-adopted");
    assert_eq!(adopted, first_external);
}

#[tokio::test]
async fn test_duplicate_unique_tag_matches_are_fatal() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, ComputeInstanceReconciler);

    let tag = owner_tag_for("uid-1");
    world
        .cloud
        .seed_instance("inst-a", "web-1", vec![tag.clone()], "running");
    world
        .cloud
        .seed_instance("inst-b", "web-1", vec![tag], "running");

    let mut object = instance_object("web-1", "uid-1");
    object.add_finalizer(FINALIZER);
    let id = object.object_id();
    store.insert(object);

    let err = engine
        .reconcile(&id)
        .await
        .expect_err("two matches must never be auto-resolved");
    assert!(matches!(err, ReconcileError::InvariantViolation(_)));

    let stored = store.get_sync(&id).expect("object kept");
    let status = stored.status.expect("status written");
    assert_eq!(status.failure_reason.as_deref(), Some("InvariantViolation"));
    assert!(!status.ready);
    // Neither candidate was adopted
    assert!(store.get_sync(&id).expect("kept").external_id().is_none());
}

struct MutateThenFail;

#[async_trait]
impl ReconcileHandler<ComputeInstance> for MutateThenFail {
    fn kind(&self) -> &'static str {
        "ComputeInstance"
    }

    async fn create(
        &self,
        scope: &mut Scope<ComputeInstance>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        scope.resource_mut().set_external_id("ext-9");
        Err(ReconcileError::Validation("declared image does not exist".to_string()))
    }

    async fn update(
        &self,
        _scope: &mut Scope<ComputeInstance>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        Ok(Outcome::done())
    }

    async fn delete(
        &self,
        _scope: &mut Scope<ComputeInstance>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        Ok(Outcome::done())
    }
}

#[tokio::test]
async fn test_mutations_commit_exactly_once_even_when_the_handler_fails() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, MutateThenFail);

    let mut object = instance_object("web-1", "uid-1");
    object.add_finalizer(FINALIZER);
    let id = object.object_id();
    store.insert(object);

    let err = engine.reconcile(&id).await.expect_err("handler fails");
    assert!(matches!(err, ReconcileError::Validation(_)));

    // Exactly one write, carrying both the handler's mutation and the
    // failure condition
    assert_eq!(store.write_count(), 1);
    let stored = store.get_sync(&id).expect("object kept");
    assert_eq!(stored.external_id(), Some("ext-9"));
    let status = stored.status.expect("status written");
    assert_eq!(status.failure_reason.as_deref(), Some("ValidationFailed"));
    assert!(status
        .failure_message
        .as_deref()
        .is_some_and(|m| m.contains("declared image")));
}

struct TransientFail;

#[async_trait]
impl ReconcileHandler<ComputeInstance> for TransientFail {
    fn kind(&self) -> &'static str {
        "ComputeInstance"
    }

    async fn create(
        &self,
        _scope: &mut Scope<ComputeInstance>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        Err(ReconcileError::TransientExternal {
            message: "provider returned 503".to_string(),
            retry_after: None,
        })
    }

    async fn update(
        &self,
        _scope: &mut Scope<ComputeInstance>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        Ok(Outcome::done())
    }

    async fn delete(
        &self,
        _scope: &mut Scope<ComputeInstance>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        Ok(Outcome::done())
    }
}

#[tokio::test]
async fn test_transient_errors_requeue_with_a_decaying_condition() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, TransientFail);

    let mut object = instance_object("web-1", "uid-1");
    object.add_finalizer(FINALIZER);
    let id = object.object_id();
    store.insert(object);

    let outcome = engine
        .reconcile(&id)
        .await
        .expect("transient errors do not surface");
    assert_eq!(
        outcome.requeue_after,
        Some(Duration::from_secs(TRANSIENT_REQUEUE_SECS))
    );

    let stored = store.get_sync(&id).expect("object kept");
    let status = stored.status.as_ref().expect("status written");
    assert_eq!(status.failure_reason.as_deref(), Some("RetryableError"));

    // A later successful cycle decays the failure
    let healthy = engine_for(&world, &store, ComputeInstanceReconciler);
    reconcile_settled(&healthy, &id).await.expect("succeeds");
    let stored = store.get_sync(&id).expect("object kept");
    let status = stored.status.expect("status written");
    assert_eq!(status.failure_reason, None);
    assert!(status.ready);
}

#[tokio::test]
async fn test_vanished_external_resource_self_heals() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, ComputeInstanceReconciler);

    let mut object = instance_object("web-1", "uid-1");
    object.add_finalizer(FINALIZER);
    object.set_external_id("inst-gone");
    let id = object.object_id();
    store.insert(object);

    // Update path hits 404: the reference is cleared, not treated as fatal
    let outcome = engine.reconcile(&id).await.expect("self-heals");
    assert_eq!(outcome.requeue_after, Some(Duration::ZERO));
    assert!(store.get_sync(&id).expect("kept").external_id().is_none());

    // The follow-up cycle re-creates
    reconcile_settled(&engine, &id).await.expect("re-creates");
    assert_eq!(world.cloud.call_count("create_instance"), 1);
    assert!(store.get_sync(&id).expect("kept").external_id().is_some());
}

#[tokio::test]
async fn test_commit_conflict_is_retried_by_redoing_the_cycle() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, ComputeInstanceReconciler);

    let object = instance_object("web-1", "uid-1");
    let id = object.object_id();
    store.insert(object);
    store.fail_next_write(StoreError::Conflict);

    let outcome = engine
        .reconcile(&id)
        .await
        .expect("conflicts never surface as failures");
    assert_eq!(outcome.requeue_after, Some(Duration::ZERO));

    // One successful write after the conflicted attempt
    assert_eq!(store.write_count(), 1);
    assert!(store.get_sync(&id).expect("kept").has_finalizer(FINALIZER));
}

#[tokio::test]
async fn test_deletion_holds_the_finalizer_until_confirmed_absent() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, ComputeInstanceReconciler);

    let mut object = instance_object("web-1", "uid-1");
    mark_deleting(&mut object);
    object.set_external_id("inst-7");
    let id = object.object_id();
    store.insert(object);
    world
        .cloud
        .seed_instance("inst-7", "web-1", vec![owner_tag_for("uid-1")], "running");

    // Cycle 1: deletion is requested at the provider, finalizer stays
    let outcome = engine.reconcile(&id).await.expect("deletion requested");
    assert!(outcome.requeue_after.is_some());
    assert!(store.get_sync(&id).expect("kept").has_finalizer(FINALIZER));
    assert_eq!(world.cloud.call_count("delete_instance"), 1);

    // Cycle 2: the instance is gone, so the finalizer is released
    let outcome = engine.reconcile(&id).await.expect("confirmed absent");
    assert_eq!(outcome.requeue_after, None);
    let stored = store.get_sync(&id).expect("kept until the store collects it");
    assert!(!stored.has_finalizer(FINALIZER));
    assert!(stored.external_id().is_none());
}

#[tokio::test]
async fn test_deletion_without_our_finalizer_owes_no_cleanup() {
    let world = test_world();
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_for(&world, &store, ComputeInstanceReconciler);

    let mut object = instance_object("web-1", "uid-1");
    object.meta_mut().deletion_timestamp =
        Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(chrono::Utc::now()));
    let id = object.object_id();
    store.insert(object);

    let outcome = engine.reconcile(&id).await.expect("nothing to do");
    assert_eq!(outcome.requeue_after, None);
    assert_eq!(world.cloud.call_count(""), 0);
}
