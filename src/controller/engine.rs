//! # Reconcile Engine
//!
//! The control loop shared by every resource kind. One invocation is:
//! fetch the object -> open a [`Scope`] -> dispatch to the kind's
//! create/update/delete handler -> commit the scope -> derive the requeue.
//!
//! The engine owns the cross-kind protocol so handlers stay small:
//!
//! - absent objects are a successful no-op (already deleted)
//! - the finalizer is added and persisted before any create/update work, so
//!   a crash after external creation still revisits delete handling
//! - deletion dispatches the delete handler and removes the finalizer only
//!   once the external resource is confirmed absent
//! - a vanished external counterpart (404 on the update path) clears the
//!   external reference and re-enters the create path next cycle
//! - errors are classified per the taxonomy in [`crate::controller::error`]
//!   and recorded in status *before* the scope commits
//! - commit conflicts refetch and redo the whole cycle; other commit errors
//!   are joined with the handler result, never dropped

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::constants::{DEFAULT_CYCLE_TIMEOUT_SECS, FINALIZER, MAX_COMMIT_RETRIES};
use crate::controller::error::{ErrorPolicy, ReconcileError};
use crate::controller::ipalloc::VlanIpRegistry;
use crate::controller::scope::Scope;
use crate::crd::{ConditionSeverity, ConditionStatus, ManagedObject, ObjectId};
use crate::observability::{metrics, EventRecorder, EventType};
use crate::provider::{CloudApi, QuotaRegistry};
use crate::secrets::SecretStore;
use crate::store::{ObjectStore, StoreError};

/// Result of a successful cycle: when to look at the object again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// `None` means converged; the front-end applies its normal resync
    pub requeue_after: Option<Duration>,
}

impl Outcome {
    #[must_use]
    pub fn done() -> Self {
        Self {
            requeue_after: None,
        }
    }

    #[must_use]
    pub fn requeue(after: Duration) -> Self {
        Self {
            requeue_after: Some(after),
        }
    }

    #[must_use]
    pub fn requeue_secs(secs: u64) -> Self {
        Self::requeue(Duration::from_secs(secs))
    }
}

/// Shared collaborators handed to every handler. Keyed mutable state (quota,
/// VLAN addresses) lives here explicitly rather than as package-level state.
pub struct Context {
    pub cloud: Arc<dyn CloudApi>,
    pub secrets: Arc<dyn SecretStore>,
    pub quotas: Arc<QuotaRegistry>,
    pub vlan_ips: Arc<VlanIpRegistry>,
    pub recorder: Arc<dyn EventRecorder>,
    /// Fingerprint of the credential the provider client calls with; keys
    /// the quota registry
    pub credential_fingerprint: String,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("credential_fingerprint", &self.credential_fingerprint)
            .finish_non_exhaustive()
    }
}

/// Per-kind reconcile logic. Implemented once per resource kind; everything
/// cross-kind lives in the engine.
#[async_trait]
pub trait ReconcileHandler<R: ManagedObject>: Send + Sync {
    /// Kind name for logs and events
    fn kind(&self) -> &'static str;

    /// Bring a resource with no external counterpart into existence
    /// (idempotently: adopt before creating)
    async fn create(&self, scope: &mut Scope<R>, ctx: &Context) -> Result<Outcome, ReconcileError>;

    /// Converge an existing external resource toward the declared state
    async fn update(&self, scope: &mut Scope<R>, ctx: &Context) -> Result<Outcome, ReconcileError>;

    /// Tear down the external resource. Return [`Outcome::done`] only once
    /// the external counterpart is confirmed absent; the engine removes the
    /// finalizer on that signal.
    async fn delete(&self, scope: &mut Scope<R>, ctx: &Context) -> Result<Outcome, ReconcileError>;
}

/// Generic per-kind control loop
pub struct ReconcileEngine<R: ManagedObject, H: ReconcileHandler<R>> {
    store: Arc<dyn ObjectStore<R>>,
    handler: H,
    ctx: Arc<Context>,
    cycle_timeout: Duration,
}

impl<R: ManagedObject, H: ReconcileHandler<R>> std::fmt::Debug for ReconcileEngine<R, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileEngine")
            .field("kind", &self.handler.kind())
            .field("cycle_timeout", &self.cycle_timeout)
            .finish_non_exhaustive()
    }
}

impl<R: ManagedObject, H: ReconcileHandler<R>> ReconcileEngine<R, H> {
    pub fn new(store: Arc<dyn ObjectStore<R>>, handler: H, ctx: Arc<Context>) -> Self {
        Self {
            store,
            handler,
            ctx,
            cycle_timeout: Duration::from_secs(DEFAULT_CYCLE_TIMEOUT_SECS),
        }
    }

    /// Override the per-invocation deadline
    #[must_use]
    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Run one reconcile invocation for the identified object.
    ///
    /// Commit conflicts are absorbed here: the cycle refetches and redoes
    /// its work up to [`MAX_COMMIT_RETRIES`] times before surfacing.
    pub async fn reconcile(&self, id: &ObjectId) -> Result<Outcome, ReconcileError> {
        metrics::increment_reconciliations();
        let start = Instant::now();
        let kind = self.handler.kind();

        let mut conflict_retries = 0;
        let result = loop {
            let Some(resource) = self.store.get(id).await.map_err(ReconcileError::from)? else {
                debug!("{} {} is gone from the store, nothing to reconcile", kind, id);
                break Ok(Outcome::done());
            };

            let mut scope = Scope::open(
                resource,
                Arc::clone(&self.store),
                Arc::clone(&self.ctx.cloud),
            );
            let cycle_result = self.run_cycle(id, &mut scope).await;

            // Commit runs on every exit path of the cycle, success or error
            match scope.commit().await {
                Ok(()) => break cycle_result,
                Err(StoreError::Conflict) => {
                    metrics::increment_commit_conflicts();
                    if conflict_retries < MAX_COMMIT_RETRIES {
                        conflict_retries += 1;
                        debug!(
                            "commit conflict for {} {}, redoing cycle (attempt {})",
                            kind, id, conflict_retries
                        );
                        continue;
                    }
                    break Err(ReconcileError::CommitConflict);
                }
                Err(commit_err) => {
                    // The commit failure is joined with whatever the handler
                    // produced so neither is lost
                    let handler_result = match cycle_result {
                        Ok(_) => "handler succeeded".to_string(),
                        Err(e) => e.to_string(),
                    };
                    break Err(ReconcileError::CommitFailed {
                        commit: commit_err.to_string(),
                        handler_result,
                    });
                }
            }
        };

        metrics::observe_reconcile_duration(start.elapsed().as_secs_f64());
        result
    }

    /// Dispatch under the invocation deadline and fold the error policy into
    /// the resource's status before the scope commits.
    async fn run_cycle(
        &self,
        id: &ObjectId,
        scope: &mut Scope<R>,
    ) -> Result<Outcome, ReconcileError> {
        let kind = self.handler.kind();
        let dispatched = match tokio::time::timeout(self.cycle_timeout, self.dispatch(scope)).await
        {
            Ok(result) => result,
            // Deadline expiry cancels in-flight provider calls; treated like
            // any transient external failure
            Err(_) => Err(ReconcileError::DeadlineExceeded),
        };

        match dispatched {
            Ok(outcome) => {
                scope.resource_mut().clear_failure();
                Ok(outcome)
            }
            Err(err) => match err.policy() {
                ErrorPolicy::Transient { retry_after } => {
                    warn!(
                        "transient failure reconciling {} {}: {} (requeue in {:?})",
                        kind, id, err, retry_after
                    );
                    scope
                        .resource_mut()
                        .set_failure(err.reason(), &err.to_string(), true);
                    metrics::increment_requeues("transient-error");
                    Ok(Outcome::requeue(retry_after))
                }
                ErrorPolicy::Fatal => {
                    error!("fatal failure reconciling {} {}: {}", kind, id, err);
                    scope
                        .resource_mut()
                        .set_failure(err.reason(), &err.to_string(), false);
                    metrics::increment_reconciliation_errors();
                    self.ctx
                        .recorder
                        .publish(id, kind, EventType::Warning, err.reason(), &err.to_string())
                        .await;
                    Err(err)
                }
            },
        }
    }

    async fn dispatch(&self, scope: &mut Scope<R>) -> Result<Outcome, ReconcileError> {
        let kind = self.handler.kind();
        let id = scope.resource().object_id();

        if scope.resource().deletion_requested() {
            if !scope.resource().has_finalizer(FINALIZER) {
                debug!(
                    "{} {} deleting without our finalizer, no external cleanup owed",
                    kind, id
                );
                return Ok(Outcome::done());
            }
            let outcome = self.handler.delete(scope, &self.ctx).await?;
            if outcome.requeue_after.is_none() {
                // External resource confirmed absent (or never existed):
                // release the object from the store
                info!("{} {} external cleanup complete, releasing finalizer", kind, id);
                scope.resource_mut().remove_finalizer(FINALIZER);
            }
            return Ok(outcome);
        }

        if !scope.resource().has_finalizer(FINALIZER) {
            // Persisted by this cycle's commit before any external mutation;
            // the immediate requeue re-enters with the finalizer in place
            scope.resource_mut().add_finalizer(FINALIZER);
            return Ok(Outcome::requeue(Duration::ZERO));
        }

        if scope.resource().external_id().is_none() {
            return self.handler.create(scope, &self.ctx).await;
        }

        match self.handler.update(scope, &self.ctx).await {
            Err(ReconcileError::NotFoundExternal(what)) => {
                // Self-healing: forget the vanished counterpart and let the
                // next cycle re-create it
                warn!(
                    "external resource behind {} {} vanished ({}), clearing reference for re-creation",
                    kind, id, what
                );
                scope.resource_mut().mark_condition(
                    "Ready",
                    ConditionStatus::False,
                    Some("ExternalResourceVanished"),
                    Some(&what),
                    Some(ConditionSeverity::Warning),
                );
                scope.resource_mut().clear_external_id();
                Ok(Outcome::requeue(Duration::ZERO))
            }
            other => other,
        }
    }
}
