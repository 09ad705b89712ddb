//! # Observability
//!
//! Observability modules for metrics and event recording.
//!
//! - `metrics`: Prometheus metrics collection
//! - `events`: structured event recorder collaborator

pub mod events;
pub mod metrics;

pub use events::{EventRecorder, EventType, KubeEventRecorder, NoopEventRecorder};
