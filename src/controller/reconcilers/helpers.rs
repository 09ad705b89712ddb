//! Shared reconciler helpers: the idempotent-creation protocol pieces.

use crate::constants::OWNED_BY_TAG;
use crate::controller::error::ReconcileError;
use crate::crd::{ManagedObject, ObjectId};

/// Resolve the unique-adoption list result.
///
/// Zero matches means create; exactly one means adopt (a crash between the
/// external create and the store commit left it behind); more than one is an
/// invariant violation - either a controller bug or manual tampering - and
/// guessing which copy to adopt would be worse than stopping.
pub fn adopt_single<T>(
    mut matches: Vec<T>,
    kind: &str,
    selector: &str,
) -> Result<Option<T>, ReconcileError> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        n => Err(ReconcileError::InvariantViolation(format!(
            "found {n} {kind} resources matching unique selector {selector:?}; \
             refusing to adopt, remove the duplicates manually"
        ))),
    }
}

/// Ownership tag placed on created external resources and used as the
/// unique adoption filter
pub fn owner_tag(resource: &impl ManagedObject) -> Result<String, ReconcileError> {
    let uid = resource.uid().ok_or_else(|| {
        ReconcileError::Validation(
            "object carries no UID; cannot derive its ownership tag".to_string(),
        )
    })?;
    Ok(format!("{OWNED_BY_TAG}={uid}"))
}

/// External resource label: the declared label, or the object name
#[must_use]
pub fn label_or_name(label: Option<&str>, id: &ObjectId) -> String {
    label.map_or_else(|| id.name.clone(), str::to_string)
}

/// External id, which the engine guarantees on the update path
pub fn external_id_required(resource: &impl ManagedObject) -> Result<String, ReconcileError> {
    resource.external_id().map(str::to_string).ok_or_else(|| {
        ReconcileError::InvariantViolation(
            "update dispatched for a resource without an external id".to_string(),
        )
    })
}
