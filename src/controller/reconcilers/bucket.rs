//! ObjectBucket reconciler.
//!
//! Buckets carry no provider tags, so adoption filters on the label, which
//! the provider keeps unique per region.

use async_trait::async_trait;
use tracing::info;

use super::helpers::{adopt_single, external_id_required, label_or_name};
use crate::controller::engine::{Context, Outcome, ReconcileHandler};
use crate::controller::error::ReconcileError;
use crate::controller::scope::Scope;
use crate::crd::{BucketAcl, ManagedObject, ObjectBucket};
use crate::observability::EventType;
use crate::provider::types::{Bucket, BucketCreateOpts, BucketUpdateOpts};
use crate::provider::{ListFilter, ProviderError};

#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectBucketReconciler;

fn render_acl(acl: Option<BucketAcl>) -> Option<String> {
    acl.map(|a| {
        match a {
            BucketAcl::Private => "private",
            BucketAcl::PublicRead => "public-read",
        }
        .to_string()
    })
}

fn record_observed(scope: &mut Scope<ObjectBucket>, bucket: &Bucket) {
    let status = scope
        .resource_mut()
        .status
        .get_or_insert_with(Default::default);
    status.hostname = Some(bucket.hostname.clone());
}

#[async_trait]
impl ReconcileHandler<ObjectBucket> for ObjectBucketReconciler {
    fn kind(&self) -> &'static str {
        "ObjectBucket"
    }

    async fn create(
        &self,
        scope: &mut Scope<ObjectBucket>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();
        let label = label_or_name(spec.label.as_deref(), &id);

        let matches = scope
            .cloud()
            .list_buckets(&ListFilter::by_label(&label))
            .await?;
        let bucket = match adopt_single(matches, "bucket", &label)? {
            Some(existing) => {
                info!("adopting existing bucket {} for {}", existing.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Adopted",
                        &format!("adopted existing bucket {}", existing.id),
                    )
                    .await;
                existing
            }
            None => {
                let opts = BucketCreateOpts {
                    label: label.clone(),
                    region: spec.region.clone(),
                    acl: render_acl(spec.acl),
                    cors_enabled: spec.cors_enabled,
                };
                let created = scope.cloud().create_bucket(opts).await?;
                info!("created bucket {} for {}", created.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Created",
                        &format!("created bucket {}", created.id),
                    )
                    .await;
                created
            }
        };

        scope.resource_mut().set_external_id(&bucket.id);
        record_observed(scope, &bucket);
        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn update(
        &self,
        scope: &mut Scope<ObjectBucket>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let external_id = external_id_required(scope.resource())?;
        let spec = scope.resource().spec.clone();

        let bucket = scope.cloud().get_bucket(&external_id).await?;

        let desired_acl = render_acl(spec.acl);
        let observed = if (desired_acl.is_some() && bucket.acl != desired_acl)
            || (spec.cors_enabled.is_some() && bucket.cors_enabled != spec.cors_enabled)
        {
            let opts = BucketUpdateOpts {
                acl: desired_acl,
                cors_enabled: spec.cors_enabled,
            };
            scope.cloud().update_bucket(&external_id, opts).await?
        } else {
            bucket
        };

        record_observed(scope, &observed);
        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn delete(
        &self,
        scope: &mut Scope<ObjectBucket>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        if let Some(external_id) = scope.resource().external_id().map(str::to_string) {
            match scope.cloud().delete_bucket(&external_id).await {
                Ok(()) => info!("deleted bucket {} for {}", external_id, id),
                Err(ProviderError::NotFound(_)) => {
                    info!("bucket {} for {} already gone", external_id, id);
                }
                Err(e) => return Err(e.into()),
            }
            scope.resource_mut().clear_external_id();
        }
        Ok(Outcome::done())
    }
}
