//! LoadBalancer reconciler.

use async_trait::async_trait;
use tracing::info;

use super::helpers::{adopt_single, external_id_required, label_or_name, owner_tag};
use crate::controller::engine::{Context, Outcome, ReconcileHandler};
use crate::controller::error::ReconcileError;
use crate::controller::scope::Scope;
use crate::crd::{LoadBalancer, ManagedObject, PortConfig, PortProtocol};
use crate::observability::EventType;
use crate::provider::types::{Balancer, BalancerCreateOpts, BalancerPort, BalancerUpdateOpts};
use crate::provider::{ListFilter, ProviderError};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoadBalancerReconciler;

fn render_ports(configs: &[PortConfig]) -> Vec<BalancerPort> {
    configs
        .iter()
        .map(|c| BalancerPort {
            port: c.port,
            protocol: match c.protocol {
                PortProtocol::Http => "http".to_string(),
                PortProtocol::Https => "https".to_string(),
                PortProtocol::Tcp => "tcp".to_string(),
            },
            check_interval_secs: c.check.as_ref().and_then(|h| h.interval_secs),
            check_timeout_secs: c.check.as_ref().and_then(|h| h.timeout_secs),
            check_attempts: c.check.as_ref().and_then(|h| h.attempts),
            check_path: c.check.as_ref().and_then(|h| h.path.clone()),
        })
        .collect()
}

fn record_observed(scope: &mut Scope<LoadBalancer>, balancer: &Balancer) {
    let status = scope
        .resource_mut()
        .status
        .get_or_insert_with(Default::default);
    status.hostname.clone_from(&balancer.hostname);
    status.ipv4.clone_from(&balancer.ipv4);
}

#[async_trait]
impl ReconcileHandler<LoadBalancer> for LoadBalancerReconciler {
    fn kind(&self) -> &'static str {
        "LoadBalancer"
    }

    async fn create(
        &self,
        scope: &mut Scope<LoadBalancer>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        let tag = owner_tag(scope.resource())?;
        let spec = scope.resource().spec.clone();

        let matches = scope
            .cloud()
            .list_balancers(&ListFilter::by_tag(&tag))
            .await?;
        let balancer = match adopt_single(matches, "load balancer", &tag)? {
            Some(existing) => {
                info!("adopting existing balancer {} for {}", existing.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Adopted",
                        &format!("adopted existing load balancer {}", existing.id),
                    )
                    .await;
                existing
            }
            None => {
                let mut tags = spec.tags.clone();
                tags.push(tag);
                let opts = BalancerCreateOpts {
                    label: label_or_name(spec.label.as_deref(), &id),
                    region: spec.region.clone(),
                    tags,
                    ports: render_ports(&spec.port_configs),
                };
                let created = scope.cloud().create_balancer(opts).await?;
                info!("created balancer {} for {}", created.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Created",
                        &format!("created load balancer {}", created.id),
                    )
                    .await;
                created
            }
        };

        scope.resource_mut().set_external_id(&balancer.id);
        record_observed(scope, &balancer);
        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn update(
        &self,
        scope: &mut Scope<LoadBalancer>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let external_id = external_id_required(scope.resource())?;
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();

        let balancer = scope.cloud().get_balancer(&external_id).await?;

        let desired_label = label_or_name(spec.label.as_deref(), &id);
        let desired_ports = render_ports(&spec.port_configs);
        let observed = if balancer.label != desired_label || balancer.ports != desired_ports {
            let opts = BalancerUpdateOpts {
                label: Some(desired_label),
                tags: None,
                ports: Some(desired_ports),
            };
            scope.cloud().update_balancer(&external_id, opts).await?
        } else {
            balancer
        };

        record_observed(scope, &observed);
        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn delete(
        &self,
        scope: &mut Scope<LoadBalancer>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        if let Some(external_id) = scope.resource().external_id().map(str::to_string) {
            match scope.cloud().delete_balancer(&external_id).await {
                Ok(()) => info!("deleted balancer {} for {}", external_id, id),
                Err(ProviderError::NotFound(_)) => {
                    info!("balancer {} for {} already gone", external_id, id);
                }
                Err(e) => return Err(e.into()),
            }
            scope.resource_mut().clear_external_id();
        }
        Ok(Outcome::done())
    }
}
