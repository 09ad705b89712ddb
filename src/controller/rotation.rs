//! # Key Rotation State Machine
//!
//! Pure decision logic for object storage access-key lifecycle:
//!
//! ```text
//! Uninitialized -> Current -> PendingRotation -> Current
//!                     |
//!                     v (credential secret deleted out-of-band)
//!               SecretMissing -> Current (secret restored, key untouched)
//! ```
//!
//! The decision is computed from the declared generation, the recorded
//! status, and whether the externally-persisted credential secret still
//! exists. Driving the provider and secret-store calls is the access-key
//! reconciler's job; keeping the decision pure keeps it testable.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crd::ObjectAccessKeyStatus;

/// Secret data key holding the access key id
pub const SECRET_KEY_ACCESS: &str = "access_key";
/// Secret data key holding the secret key
pub const SECRET_KEY_SECRET: &str = "secret_key";

/// What the current cycle must do to converge the access key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationStep {
    /// No key was ever issued: create one, persist references and the
    /// credential secret. There is no old key to revoke.
    CreateInitial,
    /// The declared generation moved past the issued one: create the new
    /// key *first*, move references to it, then attempt to revoke the old
    /// key. A failed revocation is recorded, never fatal - a stale key is a
    /// lesser failure than blocked rotation.
    Rotate { old_key_id: String },
    /// The credential secret was deleted out-of-band: fetch the existing
    /// key by reference and recreate the secret. Regenerating here would
    /// invalidate a key every consumer has cached.
    RestoreSecret { key_id: String },
    /// Issued key matches the declared generation and the secret exists
    UpToDate,
}

/// Decide the next step for an access key.
///
/// Secret recovery is checked before any create/rotate decision: a missing
/// secret with a live key reference must never trigger key regeneration.
#[must_use]
pub fn plan(
    spec_generation: i64,
    status: &ObjectAccessKeyStatus,
    secret_exists: bool,
) -> RotationStep {
    match status.access_key_ref.as_deref() {
        Some(key_id) => {
            if !secret_exists {
                return RotationStep::RestoreSecret {
                    key_id: key_id.to_string(),
                };
            }
            if status.last_key_generation != Some(spec_generation) {
                return RotationStep::Rotate {
                    old_key_id: key_id.to_string(),
                };
            }
            RotationStep::UpToDate
        }
        None => RotationStep::CreateInitial,
    }
}

/// In-memory key material, wiped on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never land in logs
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}
