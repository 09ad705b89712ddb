//! Per-credential API quota tracking.
//!
//! The provider throttles its expensive call class (instance creation) with
//! remaining-quota and reset-time response headers. The registry stores the
//! most recent observation per credential fingerprint under a read/write
//! lock; callers consult [`QuotaRegistry::wait_hint`] before issuing a call
//! in that class. Entries are created lazily on the first observed response,
//! and distinct credentials never share or block on each other's state.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Absorbs clock skew between this process and the provider: an exhausted
/// quota waits one extra second past the advertised reset time.
pub const QUOTA_CLOCK_SKEW: Duration = Duration::from_secs(1);

/// Last observed quota window for one credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Keyed store of quota observations, one entry per credential fingerprint.
///
/// Passed by reference into engine construction rather than living as
/// package-level state.
#[derive(Debug, Default)]
pub struct QuotaRegistry {
    inner: RwLock<HashMap<String, QuotaState>>,
}

impl QuotaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the quota headers of a response for the given credential
    pub fn observe(&self, fingerprint: &str, remaining: u32, reset_at: DateTime<Utc>) {
        let mut inner = self.inner.write().expect("quota lock poisoned");
        inner.insert(fingerprint.to_string(), QuotaState { remaining, reset_at });
    }

    /// How long the caller must wait before issuing a call in the expensive
    /// class. `None` means proceed immediately; that includes credentials
    /// with no observation yet and windows whose reset time has passed.
    #[must_use]
    pub fn wait_hint(&self, fingerprint: &str, now: DateTime<Utc>) -> Option<Duration> {
        let inner = self.inner.read().expect("quota lock poisoned");
        let state = inner.get(fingerprint)?;
        if state.remaining > 0 || now >= state.reset_at {
            return None;
        }
        let until_reset = (state.reset_at - now).to_std().unwrap_or(Duration::ZERO);
        Some(until_reset + QUOTA_CLOCK_SKEW)
    }

    /// Current observation for a credential, if any
    #[must_use]
    pub fn snapshot(&self, fingerprint: &str) -> Option<QuotaState> {
        self.inner
            .read()
            .expect("quota lock poisoned")
            .get(fingerprint)
            .copied()
    }
}

/// Stable fingerprint of a provider credential. Quota state is keyed by this
/// rather than the raw token so the token never appears in logs or metrics.
#[must_use]
pub fn credential_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}
