//! # Reconcile Error Taxonomy
//!
//! Typed errors returned by handlers and classified by the engine:
//!
//! - **Validation** / **Capacity** / **InvariantViolation** are fatal: the
//!   status records a persistent failure, a warning event is emitted, and the
//!   error surfaces to the caller whose own backoff applies.
//! - **TransientExternal** / **Store** / **DeadlineExceeded** decay: the
//!   status records a decaying failure condition and the cycle requeues with
//!   a bounded delay.
//! - **NotFoundExternal** self-heals on the update path: the engine clears
//!   the external reference and the next cycle re-creates.
//! - **CommitConflict** never reaches users: the engine refetches and redoes
//!   the cycle.

use std::time::Duration;

use thiserror::Error;

use crate::constants::TRANSIENT_REQUEUE_SECS;
use crate::provider::{ProviderError, QUOTA_CLOCK_SKEW};
use crate::store::StoreError;

/// Errors surfaced by reconcile handlers and the engine
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The declared spec is invalid or the provider rejected it; the user
    /// must fix the spec
    #[error("invalid spec: {0}")]
    Validation(String),

    /// A compiled artifact exceeds a provider limit (rule count, address
    /// count); fatal, same policy as validation
    #[error("capacity exceeded: {0}")]
    Capacity(String),

    /// The provider failed in a way a retry can fix
    #[error("transient provider error: {message}")]
    TransientExternal {
        message: String,
        /// Preferred retry delay (rate-limit reset hints); engine default
        /// otherwise
        retry_after: Option<Duration>,
    },

    /// The external counterpart vanished (404 on the update path)
    #[error("external resource vanished: {0}")]
    NotFoundExternal(String),

    /// A unique-tag filter matched more than one external resource, or
    /// external state contradicts an engine invariant; requires operator
    /// intervention and is never auto-resolved
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The invocation deadline expired; in-flight calls were cancelled
    #[error("reconcile deadline exceeded")]
    DeadlineExceeded,

    /// Optimistic-concurrency conflict writing the object; retried by
    /// refetching, surfaced only when retries run out
    #[error("optimistic concurrency conflict on commit")]
    CommitConflict,

    /// Object store failure other than a conflict
    #[error("object store error: {0}")]
    Store(String),

    /// Commit failed on a non-conflict error. The handler's own result is
    /// carried so neither failure is dropped.
    #[error("status commit failed: {commit} (handler result: {handler_result})")]
    CommitFailed {
        commit: String,
        handler_result: String,
    },

    /// Wrapped collaborator errors (credential resolution and the like)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Requeue policy derived from an error's class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Persistent failure condition, warning event, no requeue
    Fatal,
    /// Decaying failure condition, bounded-delay requeue
    Transient { retry_after: Duration },
}

impl ReconcileError {
    /// Classify this error into the engine's requeue policy
    #[must_use]
    pub fn policy(&self) -> ErrorPolicy {
        let default_delay = Duration::from_secs(TRANSIENT_REQUEUE_SECS);
        match self {
            Self::Validation(_)
            | Self::Capacity(_)
            | Self::InvariantViolation(_)
            | Self::CommitFailed { .. } => ErrorPolicy::Fatal,
            Self::TransientExternal { retry_after, .. } => ErrorPolicy::Transient {
                retry_after: retry_after.unwrap_or(default_delay),
            },
            Self::NotFoundExternal(_)
            | Self::DeadlineExceeded
            | Self::CommitConflict
            | Self::Store(_)
            | Self::Other(_) => ErrorPolicy::Transient {
                retry_after: default_delay,
            },
        }
    }

    /// Machine-readable reason recorded in the failure condition
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationFailed",
            Self::Capacity(_) => "CapacityExceeded",
            Self::TransientExternal { .. } => "RetryableError",
            Self::NotFoundExternal(_) => "ExternalResourceVanished",
            Self::InvariantViolation(_) => "InvariantViolation",
            Self::DeadlineExceeded => "DeadlineExceeded",
            Self::CommitConflict | Self::Store(_) => "StoreError",
            Self::CommitFailed { .. } => "CommitFailed",
            Self::Other(_) => "ReconcileFailed",
        }
    }
}

impl From<ProviderError> for ReconcileError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(what) => Self::NotFoundExternal(what),
            ProviderError::RateLimited { reset_at } => {
                let wait = (reset_at - chrono::Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO)
                    + QUOTA_CLOCK_SKEW;
                Self::TransientExternal {
                    message: format!("rate limited until {reset_at}"),
                    retry_after: Some(wait),
                }
            }
            ProviderError::BadRequest(message) => Self::Validation(message),
            ProviderError::Timeout => Self::TransientExternal {
                message: "provider request timed out".to_string(),
                retry_after: None,
            },
            ProviderError::Transport(message) => Self::TransientExternal {
                message,
                retry_after: None,
            },
            ProviderError::Api { status, message } => {
                if status >= 500 {
                    Self::TransientExternal {
                        message: format!("provider returned {status}: {message}"),
                        retry_after: None,
                    }
                } else {
                    // Non-retryable client error (auth, conflict with manual
                    // changes): the spec or credentials need fixing
                    Self::Validation(format!("provider returned {status}: {message}"))
                }
            }
        }
    }
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::CommitConflict,
            other => Self::Store(other.to_string()),
        }
    }
}
