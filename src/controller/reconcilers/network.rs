//! VpcNetwork reconciler.

use async_trait::async_trait;
use tracing::info;

use super::helpers::{adopt_single, external_id_required, label_or_name, owner_tag};
use crate::controller::engine::{Context, Outcome, ReconcileHandler};
use crate::controller::error::ReconcileError;
use crate::controller::scope::Scope;
use crate::crd::{ManagedObject, VpcNetwork};
use crate::observability::EventType;
use crate::provider::types::{VpcCreateOpts, VpcSubnetCreateOpts, VpcUpdateOpts};
use crate::provider::{ListFilter, ProviderError};

#[derive(Debug, Default, Clone, Copy)]
pub struct VpcNetworkReconciler;

#[async_trait]
impl ReconcileHandler<VpcNetwork> for VpcNetworkReconciler {
    fn kind(&self) -> &'static str {
        "VpcNetwork"
    }

    async fn create(
        &self,
        scope: &mut Scope<VpcNetwork>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        let tag = owner_tag(scope.resource())?;
        let spec = scope.resource().spec.clone();

        let matches = scope.cloud().list_vpcs(&ListFilter::by_tag(&tag)).await?;
        let vpc = match adopt_single(matches, "VPC", &tag)? {
            Some(existing) => {
                info!("adopting existing VPC {} for {}", existing.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Adopted",
                        &format!("adopted existing VPC {}", existing.id),
                    )
                    .await;
                existing
            }
            None => {
                let opts = VpcCreateOpts {
                    label: label_or_name(spec.label.as_deref(), &id),
                    region: spec.region.clone(),
                    description: spec.description.clone(),
                    tags: vec![tag],
                    subnets: spec
                        .subnets
                        .iter()
                        .map(|s| VpcSubnetCreateOpts {
                            label: s.label.clone(),
                            ipv4: s.ipv4.clone(),
                        })
                        .collect(),
                };
                let created = scope.cloud().create_vpc(opts).await?;
                info!("created VPC {} for {}", created.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Created",
                        &format!("created VPC {}", created.id),
                    )
                    .await;
                created
            }
        };

        scope.resource_mut().set_external_id(&vpc.id);
        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn update(
        &self,
        scope: &mut Scope<VpcNetwork>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let external_id = external_id_required(scope.resource())?;
        let spec = scope.resource().spec.clone();
        let id = scope.resource().object_id();

        let vpc = scope.cloud().get_vpc(&external_id).await?;

        let desired_label = label_or_name(spec.label.as_deref(), &id);
        if vpc.label != desired_label || vpc.description != spec.description {
            let opts = VpcUpdateOpts {
                label: Some(desired_label),
                description: spec.description.clone(),
                tags: None,
            };
            scope.cloud().update_vpc(&external_id, opts).await?;
        }

        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn delete(
        &self,
        scope: &mut Scope<VpcNetwork>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        if let Some(external_id) = scope.resource().external_id().map(str::to_string) {
            match scope.cloud().delete_vpc(&external_id).await {
                Ok(()) => info!("deleted VPC {} for {}", external_id, id),
                Err(ProviderError::NotFound(_)) => {
                    info!("VPC {} for {} already gone", external_id, id);
                }
                Err(e) => return Err(e.into()),
            }
            scope.resource_mut().clear_external_id();
        }

        // Network teardown releases every VLAN address allocated against it
        let spec = scope.resource().spec.clone();
        if spec.vlan_cidr.is_some() {
            let vlan = label_or_name(spec.label.as_deref(), &id);
            ctx.vlan_ips.release(&vlan);
        }

        Ok(Outcome::done())
    }
}
