//! ComputeInstance reconciler.
//!
//! Instance creation is the provider's expensive call class: the quota gate
//! runs before every creation attempt and defers the cycle until the quota
//! window resets instead of burning the call. Deletion is staged - the
//! provider tears instances down asynchronously, so the finalizer is held
//! until a follow-up cycle confirms the instance is gone.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::helpers::{adopt_single, external_id_required, label_or_name, owner_tag};
use crate::constants::PROVISIONING_REQUEUE_SECS;
use crate::controller::engine::{Context, Outcome, ReconcileHandler};
use crate::controller::error::ReconcileError;
use crate::controller::scope::Scope;
use crate::crd::{ComputeInstance, ConditionSeverity, ConditionStatus, ManagedObject};
use crate::observability::{metrics, EventType};
use crate::provider::types::{Instance, InstanceCreateOpts, InstanceUpdateOpts, VlanInterfaceOpts};
use crate::provider::{ListFilter, ProviderError};

/// Provider state in which the instance serves traffic
const STATE_RUNNING: &str = "running";

#[derive(Debug, Default, Clone, Copy)]
pub struct ComputeInstanceReconciler;

fn record_observed(scope: &mut Scope<ComputeInstance>, instance: &Instance) {
    let status = scope
        .resource_mut()
        .status
        .get_or_insert_with(Default::default);
    status.ipv4 = instance.ipv4.first().cloned();
    status.instance_state = Some(instance.status.clone());
}

#[async_trait]
impl ReconcileHandler<ComputeInstance> for ComputeInstanceReconciler {
    fn kind(&self) -> &'static str {
        "ComputeInstance"
    }

    async fn create(
        &self,
        scope: &mut Scope<ComputeInstance>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        // Gate the expensive call on the per-credential quota window
        if let Some(wait) = ctx
            .quotas
            .wait_hint(&ctx.credential_fingerprint, Utc::now())
        {
            info!(
                "provider quota exhausted, deferring instance creation for {:?}",
                wait
            );
            metrics::increment_rate_limit_waits();
            scope.resource_mut().mark_condition(
                "Ready",
                ConditionStatus::False,
                Some("QuotaExhausted"),
                Some("instance creation deferred until the provider quota window resets"),
                Some(ConditionSeverity::Warning),
            );
            metrics::increment_requeues("rate-limit");
            return Ok(Outcome::requeue(wait));
        }

        let id = scope.resource().object_id();
        let tag = owner_tag(scope.resource())?;
        let spec = scope.resource().spec.clone();

        let matches = scope
            .cloud()
            .list_instances(&ListFilter::by_tag(&tag))
            .await?;
        let mut allocated_vlan_ip = None;
        let instance = match adopt_single(matches, "instance", &tag)? {
            Some(existing) => {
                info!("adopting existing instance {} for {}", existing.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Adopted",
                        &format!("adopted existing instance {}", existing.id),
                    )
                    .await;
                existing
            }
            None => {
                let vlan = match &spec.vlan {
                    Some(v) => {
                        let addr = ctx.vlan_ips.allocate(&v.label, &v.cidr)?;
                        let prefix = v.cidr.rsplit_once('/').map_or("24", |(_, p)| p);
                        allocated_vlan_ip = Some(addr.to_string());
                        Some(VlanInterfaceOpts {
                            label: v.label.clone(),
                            ipam_address: format!("{addr}/{prefix}"),
                        })
                    }
                    None => None,
                };
                let mut tags = spec.tags.clone();
                tags.push(tag);
                let opts = InstanceCreateOpts {
                    label: label_or_name(spec.label.as_deref(), &id),
                    region: spec.region.clone(),
                    instance_type: spec.instance_type.clone(),
                    image: spec.image.clone(),
                    tags,
                    firewall_id: spec.firewall_id.clone(),
                    placement_group_id: spec.placement_group_id.clone(),
                    vlan,
                };
                let created = scope.cloud().create_instance(opts).await?;
                info!("created instance {} for {}", created.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Created",
                        &format!("created instance {}", created.id),
                    )
                    .await;
                created
            }
        };

        scope.resource_mut().set_external_id(&instance.id);
        record_observed(scope, &instance);
        if let Some(vlan_ip) = allocated_vlan_ip {
            let status = scope
                .resource_mut()
                .status
                .get_or_insert_with(Default::default);
            status.vlan_ip = Some(vlan_ip);
        }

        if instance.status == STATE_RUNNING {
            scope.resource_mut().set_ready(true);
            Ok(Outcome::done())
        } else {
            // Still provisioning; watch it without burning the quota
            scope.resource_mut().set_ready(false);
            Ok(Outcome::requeue_secs(PROVISIONING_REQUEUE_SECS))
        }
    }

    async fn update(
        &self,
        scope: &mut Scope<ComputeInstance>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let external_id = external_id_required(scope.resource())?;
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();

        let instance = scope.cloud().get_instance(&external_id).await?;

        let desired_label = label_or_name(spec.label.as_deref(), &id);
        let observed = if instance.label == desired_label {
            instance
        } else {
            let opts = InstanceUpdateOpts {
                label: Some(desired_label),
                tags: None,
            };
            scope.cloud().update_instance(&external_id, opts).await?
        };

        record_observed(scope, &observed);
        if observed.status == STATE_RUNNING {
            scope.resource_mut().set_ready(true);
            Ok(Outcome::done())
        } else {
            scope.resource_mut().set_ready(false);
            Ok(Outcome::requeue_secs(PROVISIONING_REQUEUE_SECS))
        }
    }

    async fn delete(
        &self,
        scope: &mut Scope<ComputeInstance>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        let Some(external_id) = scope.resource().external_id().map(str::to_string) else {
            return Ok(Outcome::done());
        };

        // The provider deletes asynchronously: confirm absence before
        // reporting done so the finalizer outlives the external instance
        match scope.cloud().get_instance(&external_id).await {
            Err(ProviderError::NotFound(_)) => {
                info!("instance {} for {} confirmed gone", external_id, id);
                scope.resource_mut().clear_external_id();
                Ok(Outcome::done())
            }
            Err(e) => Err(e.into()),
            Ok(_) => {
                match scope.cloud().delete_instance(&external_id).await {
                    Ok(()) => {
                        info!("requested deletion of instance {} for {}", external_id, id);
                    }
                    Err(ProviderError::NotFound(_)) => {
                        scope.resource_mut().clear_external_id();
                        return Ok(Outcome::done());
                    }
                    Err(e) => return Err(e.into()),
                }
                Ok(Outcome::requeue_secs(PROVISIONING_REQUEUE_SECS))
            }
        }
    }
}
