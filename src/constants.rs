//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// API group for all managed CRDs
pub const API_GROUP: &str = "cloud-infra.microscaler.io";

/// API version served for all managed CRDs
pub const API_VERSION: &str = "v1";

/// Finalizer placed on every managed object before external resources are
/// created, removed only once external cleanup is confirmed
pub const FINALIZER: &str = "cloud-infra.microscaler.io/finalizer";

/// Field manager name used for object store writes
pub const FIELD_MANAGER: &str = "cloud-infra-controller";

/// Tag carrying the owning object's UID on external provider resources.
/// The idempotent-creation list filter matches on this tag.
pub const OWNED_BY_TAG: &str = "cloud-infra.microscaler.io/owned-by";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default requeue interval after a successful reconciliation (seconds)
pub const DEFAULT_RESYNC_SECS: u64 = 600;

/// Default deadline for a single reconcile invocation (seconds).
/// Expiry cancels in-flight provider calls and reports a transient error.
pub const DEFAULT_CYCLE_TIMEOUT_SECS: u64 = 120;

/// Bounded requeue delay applied to transient provider errors (seconds)
pub const TRANSIENT_REQUEUE_SECS: u64 = 30;

/// Requeue delay while an external resource is still provisioning (seconds)
pub const PROVISIONING_REQUEUE_SECS: u64 = 15;

/// Maximum number of times a cycle is redone after an optimistic-concurrency
/// conflict on commit before the conflict is surfaced to the caller's backoff
pub const MAX_COMMIT_RETRIES: u32 = 3;

/// Default provider API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloud.microscaler.io/v1";

/// Environment variable holding the provider API token
pub const TOKEN_ENV: &str = "CLOUD_PROVIDER_TOKEN";

/// Default per-call timeout for provider requests (seconds)
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
