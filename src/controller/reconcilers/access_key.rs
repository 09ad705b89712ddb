//! ObjectAccessKey reconciler: drives the key rotation state machine.
//!
//! Ordering rules this handler must never break:
//! - rotation creates the new key and moves every reference *before*
//!   touching the old key; a failed revocation is recorded as a stale key,
//!   never a cycle failure
//! - a missing credential secret restores from the existing key by
//!   reference; the key itself is never regenerated on that path
//! - deletion revokes the key first and reports done only on confirmed
//!   revocation (or confirmed absence), so the engine releases the
//!   finalizer only when nothing can leak

use async_trait::async_trait;
use tracing::{info, warn};

use super::helpers::{adopt_single, external_id_required, label_or_name};
use crate::controller::engine::{Context, Outcome, ReconcileHandler};
use crate::controller::error::ReconcileError;
use crate::controller::rotation::{
    self, KeyMaterial, RotationStep, SECRET_KEY_ACCESS, SECRET_KEY_SECRET,
};
use crate::controller::scope::Scope;
use crate::crd::{
    AccessPermission, BucketAccessSpec, ConditionStatus, ManagedObject, ObjectAccessKey, ObjectId,
};
use crate::observability::EventType;
use crate::provider::types::{BucketAccessGrant, ObjectKey, ObjectKeyCreateOpts};
use crate::provider::{ListFilter, ProviderError};
use crate::secrets::SecretData;

#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectAccessKeyReconciler;

fn effective_secret_name(explicit: Option<&str>, id: &ObjectId) -> String {
    explicit.map_or_else(|| format!("{}-obj-key", id.name), str::to_string)
}

fn render_grants(access: &[BucketAccessSpec]) -> Vec<BucketAccessGrant> {
    access
        .iter()
        .map(|a| BucketAccessGrant {
            bucket_name: a.bucket_name.clone(),
            region: a.region.clone(),
            permissions: match a.permissions {
                AccessPermission::ReadOnly => "read_only".to_string(),
                AccessPermission::ReadWrite => "read_write".to_string(),
            },
        })
        .collect()
}

fn material_of(key: &ObjectKey) -> KeyMaterial {
    KeyMaterial {
        access_key: key.access_key.clone(),
        secret_key: key.secret_key.clone(),
    }
}

/// Move every reference to the given key: adopted external id, status
/// pointers, and the recorded generation
fn record_key(scope: &mut Scope<ObjectAccessKey>, key: &ObjectKey, generation: i64, secret: &str) {
    scope.resource_mut().set_external_id(&key.id);
    let status = scope
        .resource_mut()
        .status
        .get_or_insert_with(Default::default);
    status.access_key_ref = Some(key.id.clone());
    status.last_key_generation = Some(generation);
    status.secret_name = Some(secret.to_string());
}

async fn persist_credentials(
    ctx: &Context,
    namespace: &str,
    name: &str,
    material: &KeyMaterial,
) -> Result<(), ReconcileError> {
    let mut data = SecretData::new();
    data.insert(
        SECRET_KEY_ACCESS.to_string(),
        material.access_key.as_bytes().to_vec(),
    );
    data.insert(
        SECRET_KEY_SECRET.to_string(),
        material.secret_key.as_bytes().to_vec(),
    );
    ctx.secrets.put(namespace, name, data).await?;
    Ok(())
}

#[async_trait]
impl ReconcileHandler<ObjectAccessKey> for ObjectAccessKeyReconciler {
    fn kind(&self) -> &'static str {
        "ObjectAccessKey"
    }

    async fn create(
        &self,
        scope: &mut Scope<ObjectAccessKey>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();
        let label = label_or_name(spec.label.as_deref(), &id);
        let secret_name = effective_secret_name(spec.secret_name.as_deref(), &id);

        let matches = scope
            .cloud()
            .list_object_keys(&ListFilter::by_label(&label))
            .await?;
        let key = match adopt_single(matches, "object storage key", &label)? {
            Some(existing) => {
                info!("adopting existing object storage key {} for {}", existing.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Adopted",
                        &format!("adopted existing access key {}", existing.id),
                    )
                    .await;
                existing
            }
            None => {
                let opts = ObjectKeyCreateOpts {
                    label,
                    bucket_access: render_grants(&spec.bucket_access),
                };
                let created = scope.cloud().create_object_key(opts).await?;
                info!("created object storage key {} for {}", created.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Created",
                        &format!("created access key {}", created.id),
                    )
                    .await;
                created
            }
        };

        let material = material_of(&key);
        persist_credentials(ctx, &id.namespace, &secret_name, &material).await?;
        record_key(scope, &key, spec.key_generation, &secret_name);
        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn update(
        &self,
        scope: &mut Scope<ObjectAccessKey>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let external_id = external_id_required(scope.resource())?;
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();
        let secret_name = effective_secret_name(spec.secret_name.as_deref(), &id);
        let status_snapshot = scope.resource().status.clone().unwrap_or_default();

        let secret_exists = ctx
            .secrets
            .get(&id.namespace, &secret_name)
            .await?
            .is_some();

        match rotation::plan(spec.key_generation, &status_snapshot, secret_exists) {
            RotationStep::UpToDate => {
                // A vanished key surfaces as NotFound here and self-heals
                // through the engine's re-create path
                let _ = scope.cloud().get_object_key(&external_id).await?;
            }
            RotationStep::CreateInitial => {
                // External id is adopted but status lost its references
                // (e.g. a manual status wipe): re-sync from the live key
                // without rotating
                let key = scope.cloud().get_object_key(&external_id).await?;
                let material = material_of(&key);
                persist_credentials(ctx, &id.namespace, &secret_name, &material).await?;
                record_key(scope, &key, spec.key_generation, &secret_name);
            }
            RotationStep::RestoreSecret { key_id } => {
                // Fetch by reference, never regenerate: consumers hold the
                // existing key material
                let key = scope.cloud().get_object_key(&key_id).await?;
                let material = material_of(&key);
                persist_credentials(ctx, &id.namespace, &secret_name, &material).await?;
                info!("restored credential secret {}/{} for {}", id.namespace, secret_name, id);
                scope.resource_mut().mark_condition(
                    "CredentialSecret",
                    ConditionStatus::True,
                    Some("SecretRestored"),
                    Some("credential secret was recreated from the live key"),
                    None,
                );
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "SecretRestored",
                        "credential secret deleted out-of-band; restored from the live key",
                    )
                    .await;
            }
            RotationStep::Rotate { old_key_id } => {
                // Create the replacement first so consumers never observe a
                // reference to a revoked key
                let opts = ObjectKeyCreateOpts {
                    label: label_or_name(spec.label.as_deref(), &id),
                    bucket_access: render_grants(&spec.bucket_access),
                };
                let new_key = scope.cloud().create_object_key(opts).await?;
                let material = material_of(&new_key);
                persist_credentials(ctx, &id.namespace, &secret_name, &material).await?;
                record_key(scope, &new_key, spec.key_generation, &secret_name);

                match scope.cloud().delete_object_key(&old_key_id).await {
                    Ok(()) => {
                        info!("rotated access key for {}: {} -> {}", id, old_key_id, new_key.id);
                    }
                    Err(ProviderError::NotFound(_)) => {
                        info!("old access key {} for {} already gone", old_key_id, id);
                    }
                    Err(e) => {
                        // A stale key is a lesser failure than blocking the
                        // rotation; record it for manual cleanup
                        warn!(
                            "failed to revoke old access key {} for {}: {}",
                            old_key_id, id, e
                        );
                        let status = scope
                            .resource_mut()
                            .status
                            .get_or_insert_with(Default::default);
                        if !status.stale_key_ids.contains(&old_key_id) {
                            status.stale_key_ids.push(old_key_id.clone());
                        }
                        ctx.recorder
                            .publish(
                                &id,
                                self.kind(),
                                EventType::Warning,
                                "StaleKeyNotRevoked",
                                &format!(
                                    "old access key {old_key_id} could not be revoked and needs manual cleanup"
                                ),
                            )
                            .await;
                    }
                }

                scope.resource_mut().mark_condition(
                    "KeyRotated",
                    ConditionStatus::True,
                    Some("RotationSucceeded"),
                    None,
                    None,
                );
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "KeyRotated",
                        &format!("access key rotated to generation {}", spec.key_generation),
                    )
                    .await;
            }
        }

        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn delete(
        &self,
        scope: &mut Scope<ObjectAccessKey>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();
        let secret_name = effective_secret_name(spec.secret_name.as_deref(), &id);

        // Revoke before anything else; the finalizer is released only after
        // this cycle reports done, so a crash here re-runs the revocation
        if let Some(external_id) = scope.resource().external_id().map(str::to_string) {
            match scope.cloud().delete_object_key(&external_id).await {
                Ok(()) => info!("revoked access key {} for {}", external_id, id),
                Err(ProviderError::NotFound(_)) => {
                    info!("access key {} for {} already revoked", external_id, id);
                }
                Err(e) => return Err(e.into()),
            }
            scope.resource_mut().clear_external_id();
        }

        ctx.secrets.delete(&id.namespace, &secret_name).await?;
        if let Some(status) = scope.resource_mut().status.as_mut() {
            status.access_key_ref = None;
        }
        Ok(Outcome::done())
    }
}
