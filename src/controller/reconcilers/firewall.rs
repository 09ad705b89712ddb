//! CloudFirewall reconciler.
//!
//! Compilation happens before any provider call so validation and capacity
//! failures never leave a half-written firewall behind. The compiler is
//! deterministic, which makes the update-path diff against the external rule
//! set meaningful.

use async_trait::async_trait;
use tracing::{debug, info};

use super::helpers::{adopt_single, external_id_required, label_or_name, owner_tag};
use crate::controller::acl;
use crate::controller::engine::{Context, Outcome, ReconcileHandler};
use crate::controller::error::ReconcileError;
use crate::controller::scope::Scope;
use crate::crd::{CloudFirewall, ConditionSeverity, ConditionStatus, ManagedObject};
use crate::observability::EventType;
use crate::provider::types::{FirewallCreateOpts, FirewallRuleSet, FirewallUpdateOpts};
use crate::provider::{ListFilter, ProviderError};

#[derive(Debug, Default, Clone, Copy)]
pub struct CloudFirewallReconciler;

impl CloudFirewallReconciler {
    /// Compile the declared rules, folding failures into the RulesCompiled
    /// condition
    fn compile_marked(
        scope: &mut Scope<CloudFirewall>,
    ) -> Result<FirewallRuleSet, ReconcileError> {
        let spec = scope.resource().spec.clone();
        match acl::compile(&spec) {
            Ok(rules) => {
                let count = rules.inbound.len() + rules.outbound.len();
                scope.resource_mut().mark_condition(
                    "RulesCompiled",
                    ConditionStatus::True,
                    Some("CompilationSucceeded"),
                    None,
                    None,
                );
                let status = scope
                    .resource_mut()
                    .status
                    .get_or_insert_with(Default::default);
                status.compiled_rule_count = Some(i32::try_from(count).unwrap_or(i32::MAX));
                Ok(rules)
            }
            Err(err) => {
                let reconcile_err = ReconcileError::from(err);
                scope.resource_mut().mark_condition(
                    "RulesCompiled",
                    ConditionStatus::False,
                    Some(reconcile_err.reason()),
                    Some(&reconcile_err.to_string()),
                    Some(ConditionSeverity::Error),
                );
                Err(reconcile_err)
            }
        }
    }
}

#[async_trait]
impl ReconcileHandler<CloudFirewall> for CloudFirewallReconciler {
    fn kind(&self) -> &'static str {
        "CloudFirewall"
    }

    async fn create(
        &self,
        scope: &mut Scope<CloudFirewall>,
        ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let rules = Self::compile_marked(scope)?;
        let id = scope.resource().object_id();
        let tag = owner_tag(scope.resource())?;
        let spec = scope.resource().spec.clone();

        let matches = scope
            .cloud()
            .list_firewalls(&ListFilter::by_tag(&tag))
            .await?;
        let firewall = match adopt_single(matches, "firewall", &tag)? {
            Some(existing) => {
                info!("adopting existing firewall {} for {}", existing.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Adopted",
                        &format!("adopted existing firewall {}", existing.id),
                    )
                    .await;
                existing
            }
            None => {
                let mut tags = spec.tags.clone();
                tags.push(tag);
                let opts = FirewallCreateOpts {
                    label: label_or_name(spec.label.as_deref(), &id),
                    tags,
                    rules: rules.clone(),
                };
                let created = scope.cloud().create_firewall(opts).await?;
                info!("created firewall {} for {}", created.id, id);
                ctx.recorder
                    .publish(
                        &id,
                        self.kind(),
                        EventType::Normal,
                        "Created",
                        &format!("created firewall {}", created.id),
                    )
                    .await;
                created
            }
        };

        scope.resource_mut().set_external_id(&firewall.id);
        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn update(
        &self,
        scope: &mut Scope<CloudFirewall>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let rules = Self::compile_marked(scope)?;
        let external_id = external_id_required(scope.resource())?;
        let id = scope.resource().object_id();
        let spec = scope.resource().spec.clone();

        let firewall = scope.cloud().get_firewall(&external_id).await?;

        let desired_label = label_or_name(spec.label.as_deref(), &id);
        if firewall.rules != rules || firewall.label != desired_label {
            debug!("firewall {} drifted from declared rules, updating", external_id);
            let opts = FirewallUpdateOpts {
                label: Some(desired_label),
                tags: None,
                rules: Some(rules),
            };
            scope.cloud().update_firewall(&external_id, opts).await?;
        }

        scope.resource_mut().set_ready(true);
        Ok(Outcome::done())
    }

    async fn delete(
        &self,
        scope: &mut Scope<CloudFirewall>,
        _ctx: &Context,
    ) -> Result<Outcome, ReconcileError> {
        let id = scope.resource().object_id();
        if let Some(external_id) = scope.resource().external_id().map(str::to_string) {
            match scope.cloud().delete_firewall(&external_id).await {
                Ok(()) => info!("deleted firewall {} for {}", external_id, id),
                Err(ProviderError::NotFound(_)) => {
                    info!("firewall {} for {} already gone", external_id, id);
                }
                Err(e) => return Err(e.into()),
            }
            scope.resource_mut().clear_external_id();
        }
        Ok(Outcome::done())
    }
}
