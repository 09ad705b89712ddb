//! PlacementGroup reconciler.
//!
//! Placement groups also carry no provider tags; adoption filters on label.

use async_trait::async_trait;
use tracing::info;

use super::helpers::{adopt_single, external_id_required, label_or_name};
use crate::controller::engine::{Context, Outcome, ReconcileHandler};
use crate::controller::error::ReconcileError;
use crate::controller::scope::Scope;
use crate::crd::{ManagedObject, PlacementGroup, PlacementPolicy};
use crate::observability::EventType;
use crate::provider::types::{PlacementGroupCreateOpts, PlacementGroupUpdateOpts};
use crate::provider::{ListFilter, ProviderError};

#[derive(Debug, Default, Clone, Copy)]
pub struct PlacementGroupReconciler;

fn render_policy(policy: PlacementPolicy) -> String {
    match policy {
        PlacementPolicy::Affinity => "affinity".to_string(),
        PlacementPolicy::AntiAffinity => "anti_affinity".to_string(),
    }
}

#[async_trait]
impl ReconcileHandler<PlacementGroup> for PlacementGroupReconciler {
    fn kind(&self) -> &'static str {
        "PlacementGroup"
    }

    async fn create(
        &self,
        scope: &mut Scope<PlacementGroup>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();
        let label = label_or_name(spec.label.as_deref(), &id);

        let matches = scope
            .cloud()
            .list_placement_groups(&ListFilter::by_label(&label))
            .await?;
        let group = match adopt_single(matches, "placement group", &label)? {
            Some(existing) => {
                info!("adopting existing placement group {} for {}", existing.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Adopted",
                        &format!("adopted existing placement group {}", existing.id),
                    )
                    .await;
                existing
            }
            None => {
                let opts = PlacementGroupCreateOpts {
                    label,
                    region: spec.region.clone(),
                    placement_policy: render_policy(spec.placement_policy),
                    is_strict: spec.is_strict,
                };
                let created = scope.cloud().create_placement_group(opts).await?;
                info!("created placement group {} for {}", created.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Created",
                        &format!("created placement group {}", created.id),
                    )
                    .await;
                created
            }
        };

        scope.resource_mut().set_external_id(&group.id);
        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn update(
        &self,
        scope: &mut Scope<PlacementGroup>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let external_id = external_id_required(scope.resource())?;
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();

        let group = scope.cloud().get_placement_group(&external_id).await?;

        // Policy and strictness are create-time fixed on the provider side;
        // only the label converges on the update path
        let desired_label = label_or_name(spec.label.as_deref(), &id);
        if group.label != desired_label {
            let opts = PlacementGroupUpdateOpts {
                label: Some(desired_label),
            };
            scope
                .cloud()
                .update_placement_group(&external_id, opts)
                .await?;
        }

        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn delete(
        &self,
        scope: &mut Scope<PlacementGroup>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        if let Some(external_id) = scope.resource().external_id().map(str::to_string) {
            match scope.cloud().delete_placement_group(&external_id).await {
                Ok(()) => info!("deleted placement group {} for {}", external_id, id),
                Err(ProviderError::NotFound(_)) => {
                    info!("placement group {} for {} already gone", external_id, id);
                }
                Err(e) => return Err(e.into()),
            }
            scope.resource_mut().clear_external_id();
        }
        Ok(Outcome::done())
    }
}
