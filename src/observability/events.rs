//! # Event Recording
//!
//! Structured event recorder collaborator. The engine and reconcilers emit
//! Normal/Warning events through the [`EventRecorder`] trait; the production
//! implementation publishes Kubernetes events, and tests substitute a no-op
//! or capturing recorder.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::Client;
use kube_runtime::events::{Event, EventType as KubeEventType, Recorder, Reporter};
use tracing::{debug, warn};

use crate::constants::{API_GROUP, API_VERSION, FIELD_MANAGER};
use crate::crd::ObjectId;

/// Event class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Normal,
    Warning,
}

/// Structured event sink
#[async_trait]
pub trait EventRecorder: Send + Sync {
    /// Record an event against a managed object. Failures are logged by the
    /// implementation, never surfaced: event delivery must not fail a cycle.
    async fn publish(
        &self,
        object: &ObjectId,
        kind: &str,
        event_type: EventType,
        reason: &str,
        message: &str,
    );
}

/// Kubernetes events implementation
pub struct KubeEventRecorder {
    recorder: Recorder,
}

impl std::fmt::Debug for KubeEventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEventRecorder").finish_non_exhaustive()
    }
}

impl KubeEventRecorder {
    #[must_use]
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: FIELD_MANAGER.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventRecorder for KubeEventRecorder {
    async fn publish(
        &self,
        object: &ObjectId,
        kind: &str,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        let reference = ObjectReference {
            api_version: Some(format!("{API_GROUP}/{API_VERSION}")),
            kind: Some(kind.to_string()),
            name: Some(object.name.clone()),
            namespace: Some(object.namespace.clone()),
            ..Default::default()
        };
        let event = Event {
            type_: match event_type {
                EventType::Normal => KubeEventType::Normal,
                EventType::Warning => KubeEventType::Warning,
            },
            reason: reason.to_string(),
            note: Some(message.to_string()),
            action: "Reconcile".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, &reference).await {
            warn!("failed to publish event for {} {}: {}", kind, object, e);
        }
    }
}

/// Recorder that only logs; used by tests and dry runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventRecorder;

#[async_trait]
impl EventRecorder for NoopEventRecorder {
    async fn publish(
        &self,
        object: &ObjectId,
        kind: &str,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        debug!(
            "event {:?} for {} {}: {} - {}",
            event_type, kind, object, reason, message
        );
    }
}
