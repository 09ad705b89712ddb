//! # Controller Runtime
//!
//! Front-end plumbing: turns watch events into engine invocations, one
//! `kube_runtime::Controller` per resource kind behind a single generic
//! runner. Fatal engine errors land in `error_policy`, which applies
//! per-resource Fibonacci backoff; a successful cycle resets that state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use kube::{Api, Client, Resource};
use kube_runtime::controller::Action;
use kube_runtime::{watcher, Controller};
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::constants::DEFAULT_RESYNC_SECS;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::engine::{ReconcileEngine, ReconcileHandler};
use crate::controller::error::ReconcileError;
use crate::crd::ManagedObject;
use crate::observability::metrics;

/// Backoff state for a specific resource.
/// Tracks error count and backoff calculator for progressive retries.
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::new(30, 600), // 30s min, 10m max
            error_count: 0,
        }
    }

    fn increment_error(&mut self) {
        self.error_count += 1;
    }

    fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Context shared by one kind's watch stream
pub struct ControllerContext<R: ManagedObject, H: ReconcileHandler<R>> {
    engine: ReconcileEngine<R, H>,
    // Backoff state per resource (identified by namespace/name)
    backoff_states: Mutex<HashMap<String, BackoffState>>,
}

impl<R: ManagedObject, H: ReconcileHandler<R>> std::fmt::Debug for ControllerContext<R, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Watch one kind across all namespaces and drive the engine until shutdown
pub async fn run_controller<R, H>(client: Client, engine: ReconcileEngine<R, H>)
where
    R: Resource<DynamicType = ()> + ManagedObject + DeserializeOwned + std::fmt::Debug,
    H: ReconcileHandler<R> + 'static,
{
    let api: Api<R> = Api::all(client);
    let ctx = Arc::new(ControllerContext {
        engine,
        backoff_states: Mutex::new(HashMap::new()),
    });

    Controller::new(api, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile_object, error_policy, ctx)
        .for_each(|_| std::future::ready(()))
        .await;

    info!("controller stopped");
}

async fn reconcile_object<R, H>(
    object: Arc<R>,
    ctx: Arc<ControllerContext<R, H>>,
) -> Result<Action, ReconcileError>
where
    R: Resource<DynamicType = ()> + ManagedObject + DeserializeOwned + std::fmt::Debug,
    H: ReconcileHandler<R> + 'static,
{
    let id = object.object_id();
    let outcome = ctx.engine.reconcile(&id).await?;

    // Success: return this resource to its normal schedule
    if let Ok(mut states) = ctx.backoff_states.lock() {
        if let Some(state) = states.get_mut(&id.to_string()) {
            state.reset();
        }
    }

    Ok(match outcome.requeue_after {
        Some(after) => Action::requeue(after),
        None => {
            metrics::increment_requeues("timer");
            Action::requeue(Duration::from_secs(DEFAULT_RESYNC_SECS))
        }
    })
}

fn error_policy<R, H>(
    object: Arc<R>,
    err: &ReconcileError,
    ctx: Arc<ControllerContext<R, H>>,
) -> Action
where
    R: Resource<DynamicType = ()> + ManagedObject + DeserializeOwned + std::fmt::Debug,
    H: ReconcileHandler<R> + 'static,
{
    let key = object.object_id().to_string();
    let backoff_secs = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(key.clone()).or_insert_with(BackoffState::new);
            state.increment_error();
            let secs = state.backoff.next_backoff_secs();
            error!(
                "reconciliation failed for {} (error count: {}): {}",
                key, state.error_count, err
            );
            secs
        }
        Err(_) => {
            error!("reconciliation failed for {} (backoff state poisoned): {}", key, err);
            60
        }
    };

    metrics::increment_requeues("error-backoff");
    Action::requeue(Duration::from_secs(backoff_secs))
}
