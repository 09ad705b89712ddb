//! Shared test scaffolding: a scripted in-memory cloud provider behind the
//! facade traits, plus constructors for seeded managed objects and contexts.

#![allow(dead_code, reason = "each integration test binary uses a subset")]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use cloud_infra_controller::constants::FINALIZER;
use cloud_infra_controller::controller::engine::{Context, Outcome, ReconcileEngine};
use cloud_infra_controller::controller::ipalloc::VlanIpRegistry;
use cloud_infra_controller::controller::{ReconcileError, ReconcileHandler};
use cloud_infra_controller::crd::{
    CloudFirewall, CloudFirewallSpec, ComputeInstance, ComputeInstanceSpec, ManagedObject,
    ObjectAccessKey, ObjectAccessKeySpec, ObjectId,
};
use cloud_infra_controller::observability::NoopEventRecorder;
use cloud_infra_controller::provider::types as api;
use cloud_infra_controller::provider::{
    BalancerApi, BucketApi, CloudApi, FirewallApi, InstanceApi, ListFilter, ObjectKeyApi,
    PlacementApi, ProviderError, QuotaRegistry, VpcApi,
};
use cloud_infra_controller::secrets::InMemorySecretStore;
use cloud_infra_controller::store::{InMemoryStore, ObjectStore};

/// Credential fingerprint used by every test context
pub const TEST_FINGERPRINT: &str = "test-cred";

// ---------------------------------------------------------------------------
// Fake provider
// ---------------------------------------------------------------------------

/// In-memory provider implementing every facade trait, with a call log and
/// injectable failures
#[derive(Default)]
pub struct FakeCloud {
    pub vpcs: Mutex<Vec<api::Vpc>>,
    pub firewalls: Mutex<Vec<api::Firewall>>,
    pub balancers: Mutex<Vec<api::Balancer>>,
    pub buckets: Mutex<Vec<api::Bucket>>,
    pub object_keys: Mutex<Vec<api::ObjectKey>>,
    pub placement_groups: Mutex<Vec<api::PlacementGroup>>,
    pub instances: Mutex<Vec<api::Instance>>,
    pub calls: Mutex<Vec<String>>,
    /// Provider state newly created instances report
    pub instance_create_state: Mutex<String>,
    /// Captured options of the most recent instance creation
    pub last_instance_create: Mutex<Option<api::InstanceCreateOpts>>,
    /// Force `delete_object_key` to fail with a server error
    pub fail_object_key_delete: AtomicBool,
    next_id: AtomicU64,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            instance_create_state: Mutex::new("running".to_string()),
            ..Self::default()
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().expect("calls lock").push(call.into());
    }

    /// Number of logged calls whose name starts with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn seed_instance(&self, id: &str, label: &str, tags: Vec<String>, status: &str) {
        // Keep generated ids clear of seeded ones
        self.next_id.fetch_add(1, Ordering::SeqCst);
        self.instances.lock().expect("instances lock").push(api::Instance {
            id: id.to_string(),
            label: label.to_string(),
            region: "eu-central".to_string(),
            instance_type: "g6-standard-2".to_string(),
            status: status.to_string(),
            ipv4: vec!["203.0.113.10".to_string()],
            tags,
            placement_group_id: None,
        });
    }

    pub fn seed_object_key(&self, id: &str, label: &str) {
        self.next_id.fetch_add(1, Ordering::SeqCst);
        self.object_keys
            .lock()
            .expect("object keys lock")
            .push(api::ObjectKey {
                id: id.to_string(),
                label: label.to_string(),
                access_key: format!("AK-{id}"),
                secret_key: format!("SK-{id}"),
                bucket_access: Vec::new(),
            });
    }

    pub fn seed_firewall(&self, id: &str, label: &str, tags: Vec<String>) {
        self.next_id.fetch_add(1, Ordering::SeqCst);
        self.firewalls
            .lock()
            .expect("firewalls lock")
            .push(api::Firewall {
                id: id.to_string(),
                label: label.to_string(),
                tags,
                status: Some("enabled".to_string()),
                rules: api::FirewallRuleSet {
                    inbound: Vec::new(),
                    inbound_policy: "DROP".to_string(),
                    outbound: Vec::new(),
                    outbound_policy: "DROP".to_string(),
                },
            });
    }
}

fn not_found(path: &str, id: &str) -> ProviderError {
    ProviderError::NotFound(format!("{path}/{id}"))
}

fn filter_match(filter: &ListFilter, id: &str, label: &str, tags: &[String]) -> bool {
    if let Some(want) = &filter.id {
        return want == id;
    }
    if let Some(want) = &filter.label {
        return want == label;
    }
    if let Some(want) = &filter.tag {
        return tags.iter().any(|t| t == want);
    }
    true
}

#[async_trait]
impl VpcApi for FakeCloud {
    async fn list_vpcs(&self, filter: &ListFilter) -> Result<Vec<api::Vpc>, ProviderError> {
        self.log("list_vpcs");
        Ok(self
            .vpcs
            .lock()
            .expect("vpcs lock")
            .iter()
            .filter(|v| filter_match(filter, &v.id, &v.label, &v.tags))
            .cloned()
            .collect())
    }

    async fn get_vpc(&self, id: &str) -> Result<api::Vpc, ProviderError> {
        self.log(format!("get_vpc:{id}"));
        self.vpcs
            .lock()
            .expect("vpcs lock")
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| not_found("/networks", id))
    }

    async fn create_vpc(&self, opts: api::VpcCreateOpts) -> Result<api::Vpc, ProviderError> {
        self.log("create_vpc");
        let vpc = api::Vpc {
            id: self.next_id("vpc"),
            label: opts.label,
            region: opts.region,
            description: opts.description,
            tags: opts.tags,
            subnets: opts
                .subnets
                .into_iter()
                .enumerate()
                .map(|(i, s)| api::VpcSubnet {
                    id: format!("subnet-{i}"),
                    label: s.label,
                    ipv4: s.ipv4,
                })
                .collect(),
        };
        self.vpcs.lock().expect("vpcs lock").push(vpc.clone());
        Ok(vpc)
    }

    async fn update_vpc(
        &self,
        id: &str,
        opts: api::VpcUpdateOpts,
    ) -> Result<api::Vpc, ProviderError> {
        self.log(format!("update_vpc:{id}"));
        let mut vpcs = self.vpcs.lock().expect("vpcs lock");
        let vpc = vpcs
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| not_found("/networks", id))?;
        if let Some(label) = opts.label {
            vpc.label = label;
        }
        if opts.description.is_some() {
            vpc.description = opts.description;
        }
        Ok(vpc.clone())
    }

    async fn delete_vpc(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("delete_vpc:{id}"));
        let mut vpcs = self.vpcs.lock().expect("vpcs lock");
        let before = vpcs.len();
        vpcs.retain(|v| v.id != id);
        if vpcs.len() == before {
            return Err(not_found("/networks", id));
        }
        Ok(())
    }
}

#[async_trait]
impl FirewallApi for FakeCloud {
    async fn list_firewalls(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<api::Firewall>, ProviderError> {
        self.log("list_firewalls");
        Ok(self
            .firewalls
            .lock()
            .expect("firewalls lock")
            .iter()
            .filter(|f| filter_match(filter, &f.id, &f.label, &f.tags))
            .cloned()
            .collect())
    }

    async fn get_firewall(&self, id: &str) -> Result<api::Firewall, ProviderError> {
        self.log(format!("get_firewall:{id}"));
        self.firewalls
            .lock()
            .expect("firewalls lock")
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| not_found("/firewalls", id))
    }

    async fn create_firewall(
        &self,
        opts: api::FirewallCreateOpts,
    ) -> Result<api::Firewall, ProviderError> {
        self.log("create_firewall");
        let firewall = api::Firewall {
            id: self.next_id("fw"),
            label: opts.label,
            tags: opts.tags,
            status: Some("enabled".to_string()),
            rules: opts.rules,
        };
        self.firewalls
            .lock()
            .expect("firewalls lock")
            .push(firewall.clone());
        Ok(firewall)
    }

    async fn update_firewall(
        &self,
        id: &str,
        opts: api::FirewallUpdateOpts,
    ) -> Result<api::Firewall, ProviderError> {
        self.log(format!("update_firewall:{id}"));
        let mut firewalls = self.firewalls.lock().expect("firewalls lock");
        let firewall = firewalls
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found("/firewalls", id))?;
        if let Some(label) = opts.label {
            firewall.label = label;
        }
        if let Some(rules) = opts.rules {
            firewall.rules = rules;
        }
        Ok(firewall.clone())
    }

    async fn delete_firewall(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("delete_firewall:{id}"));
        let mut firewalls = self.firewalls.lock().expect("firewalls lock");
        let before = firewalls.len();
        firewalls.retain(|f| f.id != id);
        if firewalls.len() == before {
            return Err(not_found("/firewalls", id));
        }
        Ok(())
    }
}

#[async_trait]
impl BalancerApi for FakeCloud {
    async fn list_balancers(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<api::Balancer>, ProviderError> {
        self.log("list_balancers");
        Ok(self
            .balancers
            .lock()
            .expect("balancers lock")
            .iter()
            .filter(|b| filter_match(filter, &b.id, &b.label, &b.tags))
            .cloned()
            .collect())
    }

    async fn get_balancer(&self, id: &str) -> Result<api::Balancer, ProviderError> {
        self.log(format!("get_balancer:{id}"));
        self.balancers
            .lock()
            .expect("balancers lock")
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| not_found("/balancers", id))
    }

    async fn create_balancer(
        &self,
        opts: api::BalancerCreateOpts,
    ) -> Result<api::Balancer, ProviderError> {
        self.log("create_balancer");
        let balancer = api::Balancer {
            id: self.next_id("lb"),
            label: opts.label,
            region: opts.region,
            hostname: Some("lb.example.net".to_string()),
            ipv4: Some("203.0.113.20".to_string()),
            tags: opts.tags,
            ports: opts.ports,
        };
        self.balancers
            .lock()
            .expect("balancers lock")
            .push(balancer.clone());
        Ok(balancer)
    }

    async fn update_balancer(
        &self,
        id: &str,
        opts: api::BalancerUpdateOpts,
    ) -> Result<api::Balancer, ProviderError> {
        self.log(format!("update_balancer:{id}"));
        let mut balancers = self.balancers.lock().expect("balancers lock");
        let balancer = balancers
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| not_found("/balancers", id))?;
        if let Some(label) = opts.label {
            balancer.label = label;
        }
        if let Some(ports) = opts.ports {
            balancer.ports = ports;
        }
        Ok(balancer.clone())
    }

    async fn delete_balancer(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("delete_balancer:{id}"));
        let mut balancers = self.balancers.lock().expect("balancers lock");
        let before = balancers.len();
        balancers.retain(|b| b.id != id);
        if balancers.len() == before {
            return Err(not_found("/balancers", id));
        }
        Ok(())
    }
}

#[async_trait]
impl BucketApi for FakeCloud {
    async fn list_buckets(&self, filter: &ListFilter) -> Result<Vec<api::Bucket>, ProviderError> {
        self.log("list_buckets");
        Ok(self
            .buckets
            .lock()
            .expect("buckets lock")
            .iter()
            .filter(|b| filter_match(filter, &b.id, &b.label, &[]))
            .cloned()
            .collect())
    }

    async fn get_bucket(&self, id: &str) -> Result<api::Bucket, ProviderError> {
        self.log(format!("get_bucket:{id}"));
        self.buckets
            .lock()
            .expect("buckets lock")
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| not_found("/object-storage/buckets", id))
    }

    async fn create_bucket(
        &self,
        opts: api::BucketCreateOpts,
    ) -> Result<api::Bucket, ProviderError> {
        self.log("create_bucket");
        let bucket = api::Bucket {
            id: self.next_id("bkt"),
            hostname: format!("{}.{}.objects.example.net", opts.label, opts.region),
            label: opts.label,
            region: opts.region,
            acl: opts.acl,
            cors_enabled: opts.cors_enabled,
        };
        self.buckets
            .lock()
            .expect("buckets lock")
            .push(bucket.clone());
        Ok(bucket)
    }

    async fn update_bucket(
        &self,
        id: &str,
        opts: api::BucketUpdateOpts,
    ) -> Result<api::Bucket, ProviderError> {
        self.log(format!("update_bucket:{id}"));
        let mut buckets = self.buckets.lock().expect("buckets lock");
        let bucket = buckets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| not_found("/object-storage/buckets", id))?;
        if opts.acl.is_some() {
            bucket.acl = opts.acl;
        }
        if opts.cors_enabled.is_some() {
            bucket.cors_enabled = opts.cors_enabled;
        }
        Ok(bucket.clone())
    }

    async fn delete_bucket(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("delete_bucket:{id}"));
        let mut buckets = self.buckets.lock().expect("buckets lock");
        let before = buckets.len();
        buckets.retain(|b| b.id != id);
        if buckets.len() == before {
            return Err(not_found("/object-storage/buckets", id));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectKeyApi for FakeCloud {
    async fn list_object_keys(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<api::ObjectKey>, ProviderError> {
        self.log("list_object_keys");
        Ok(self
            .object_keys
            .lock()
            .expect("object keys lock")
            .iter()
            .filter(|k| filter_match(filter, &k.id, &k.label, &[]))
            .cloned()
            .collect())
    }

    async fn get_object_key(&self, id: &str) -> Result<api::ObjectKey, ProviderError> {
        self.log(format!("get_object_key:{id}"));
        self.object_keys
            .lock()
            .expect("object keys lock")
            .iter()
            .find(|k| k.id == id)
            .cloned()
            .ok_or_else(|| not_found("/object-storage/keys", id))
    }

    async fn create_object_key(
        &self,
        opts: api::ObjectKeyCreateOpts,
    ) -> Result<api::ObjectKey, ProviderError> {
        self.log("create_object_key");
        let id = self.next_id("key");
        let key = api::ObjectKey {
            access_key: format!("AK-{id}"),
            secret_key: format!("SK-{id}"),
            id,
            label: opts.label,
            bucket_access: opts.bucket_access,
        };
        self.object_keys
            .lock()
            .expect("object keys lock")
            .push(key.clone());
        Ok(key)
    }

    async fn update_object_key(
        &self,
        id: &str,
        opts: api::ObjectKeyUpdateOpts,
    ) -> Result<api::ObjectKey, ProviderError> {
        self.log(format!("update_object_key:{id}"));
        let mut keys = self.object_keys.lock().expect("object keys lock");
        let key = keys
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| not_found("/object-storage/keys", id))?;
        if let Some(label) = opts.label {
            key.label = label;
        }
        Ok(key.clone())
    }

    async fn delete_object_key(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("delete_object_key:{id}"));
        if self.fail_object_key_delete.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 500,
                message: "revocation backend unavailable".to_string(),
            });
        }
        let mut keys = self.object_keys.lock().expect("object keys lock");
        let before = keys.len();
        keys.retain(|k| k.id != id);
        if keys.len() == before {
            return Err(not_found("/object-storage/keys", id));
        }
        Ok(())
    }
}

#[async_trait]
impl PlacementApi for FakeCloud {
    async fn list_placement_groups(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<api::PlacementGroup>, ProviderError> {
        self.log("list_placement_groups");
        Ok(self
            .placement_groups
            .lock()
            .expect("placement groups lock")
            .iter()
            .filter(|g| filter_match(filter, &g.id, &g.label, &[]))
            .cloned()
            .collect())
    }

    async fn get_placement_group(&self, id: &str) -> Result<api::PlacementGroup, ProviderError> {
        self.log(format!("get_placement_group:{id}"));
        self.placement_groups
            .lock()
            .expect("placement groups lock")
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| not_found("/placement/groups", id))
    }

    async fn create_placement_group(
        &self,
        opts: api::PlacementGroupCreateOpts,
    ) -> Result<api::PlacementGroup, ProviderError> {
        self.log("create_placement_group");
        let group = api::PlacementGroup {
            id: self.next_id("pg"),
            label: opts.label,
            region: opts.region,
            placement_policy: opts.placement_policy,
            is_strict: opts.is_strict,
            member_count: Some(0),
        };
        self.placement_groups
            .lock()
            .expect("placement groups lock")
            .push(group.clone());
        Ok(group)
    }

    async fn update_placement_group(
        &self,
        id: &str,
        opts: api::PlacementGroupUpdateOpts,
    ) -> Result<api::PlacementGroup, ProviderError> {
        self.log(format!("update_placement_group:{id}"));
        let mut groups = self.placement_groups.lock().expect("placement groups lock");
        let group = groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found("/placement/groups", id))?;
        if let Some(label) = opts.label {
            group.label = label;
        }
        Ok(group.clone())
    }

    async fn delete_placement_group(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("delete_placement_group:{id}"));
        let mut groups = self.placement_groups.lock().expect("placement groups lock");
        let before = groups.len();
        groups.retain(|g| g.id != id);
        if groups.len() == before {
            return Err(not_found("/placement/groups", id));
        }
        Ok(())
    }
}

#[async_trait]
impl InstanceApi for FakeCloud {
    async fn list_instances(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<api::Instance>, ProviderError> {
        self.log("list_instances");
        Ok(self
            .instances
            .lock()
            .expect("instances lock")
            .iter()
            .filter(|i| filter_match(filter, &i.id, &i.label, &i.tags))
            .cloned()
            .collect())
    }

    async fn get_instance(&self, id: &str) -> Result<api::Instance, ProviderError> {
        self.log(format!("get_instance:{id}"));
        self.instances
            .lock()
            .expect("instances lock")
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| not_found("/instances", id))
    }

    async fn create_instance(
        &self,
        opts: api::InstanceCreateOpts,
    ) -> Result<api::Instance, ProviderError> {
        self.log("create_instance");
        *self
            .last_instance_create
            .lock()
            .expect("last instance create lock") = Some(opts.clone());
        let instance = api::Instance {
            id: self.next_id("inst"),
            label: opts.label,
            region: opts.region,
            instance_type: opts.instance_type,
            status: self
                .instance_create_state
                .lock()
                .expect("instance state lock")
                .clone(),
            ipv4: vec!["203.0.113.10".to_string()],
            tags: opts.tags,
            placement_group_id: opts.placement_group_id,
        };
        self.instances
            .lock()
            .expect("instances lock")
            .push(instance.clone());
        Ok(instance)
    }

    async fn update_instance(
        &self,
        id: &str,
        opts: api::InstanceUpdateOpts,
    ) -> Result<api::Instance, ProviderError> {
        self.log(format!("update_instance:{id}"));
        let mut instances = self.instances.lock().expect("instances lock");
        let instance = instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("/instances", id))?;
        if let Some(label) = opts.label {
            instance.label = label;
        }
        if let Some(tags) = opts.tags {
            instance.tags = tags;
        }
        Ok(instance.clone())
    }

    async fn delete_instance(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("delete_instance:{id}"));
        let mut instances = self.instances.lock().expect("instances lock");
        let before = instances.len();
        instances.retain(|i| i.id != id);
        if instances.len() == before {
            return Err(not_found("/instances", id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Contexts, engines, and seeded objects
// ---------------------------------------------------------------------------

pub struct TestWorld {
    pub cloud: Arc<FakeCloud>,
    pub secrets: Arc<InMemorySecretStore>,
    pub ctx: Arc<Context>,
}

pub fn test_world() -> TestWorld {
    let cloud = Arc::new(FakeCloud::new());
    let secrets = Arc::new(InMemorySecretStore::new());
    let cloud_dyn: Arc<dyn CloudApi> = Arc::clone(&cloud) as Arc<dyn CloudApi>;
    let ctx = Arc::new(Context {
        cloud: cloud_dyn,
        secrets: Arc::clone(&secrets) as Arc<dyn cloud_infra_controller::secrets::SecretStore>,
        quotas: Arc::new(QuotaRegistry::new()),
        vlan_ips: Arc::new(VlanIpRegistry::new()),
        recorder: Arc::new(NoopEventRecorder),
        credential_fingerprint: TEST_FINGERPRINT.to_string(),
    });
    TestWorld {
        cloud,
        secrets,
        ctx,
    }
}

pub fn engine_for<R, H>(
    world: &TestWorld,
    store: &Arc<InMemoryStore<R>>,
    handler: H,
) -> ReconcileEngine<R, H>
where
    R: ManagedObject,
    H: ReconcileHandler<R>,
{
    let store_dyn: Arc<dyn ObjectStore<R>> = Arc::clone(store) as Arc<dyn ObjectStore<R>>;
    ReconcileEngine::new(store_dyn, handler, Arc::clone(&world.ctx))
}

/// Drive reconcile until the outcome stops asking for an immediate requeue
/// (finalizer persistence and self-healing both use zero-delay requeues)
pub async fn reconcile_settled<R, H>(
    engine: &ReconcileEngine<R, H>,
    id: &ObjectId,
) -> Result<Outcome, ReconcileError>
where
    R: ManagedObject,
    H: ReconcileHandler<R>,
{
    for _ in 0..5 {
        let outcome = engine.reconcile(id).await?;
        if outcome.requeue_after != Some(Duration::ZERO) {
            return Ok(outcome);
        }
    }
    panic!("reconcile did not settle within 5 immediate requeues");
}

pub fn instance_object(name: &str, uid: &str) -> ComputeInstance {
    let mut object = ComputeInstance::new(
        name,
        ComputeInstanceSpec {
            external_id: None,
            label: None,
            region: "eu-central".to_string(),
            instance_type: "g6-standard-2".to_string(),
            image: Some("linux/debian12".to_string()),
            tags: Vec::new(),
            firewall_id: None,
            placement_group_id: None,
            vlan: None,
        },
    );
    object.metadata.namespace = Some("default".to_string());
    object.metadata.uid = Some(uid.to_string());
    object
}

pub fn firewall_object(name: &str, uid: &str, spec: CloudFirewallSpec) -> CloudFirewall {
    let mut object = CloudFirewall::new(name, spec);
    object.metadata.namespace = Some("default".to_string());
    object.metadata.uid = Some(uid.to_string());
    object
}

pub fn access_key_object(name: &str, uid: &str) -> ObjectAccessKey {
    let mut object = ObjectAccessKey::new(
        name,
        ObjectAccessKeySpec {
            external_id: None,
            label: None,
            key_generation: 0,
            bucket_access: Vec::new(),
            secret_name: None,
        },
    );
    object.metadata.namespace = Some("default".to_string());
    object.metadata.uid = Some(uid.to_string());
    object
}

/// Mark the object as deletion-requested with the controller finalizer held
pub fn mark_deleting<R: ManagedObject + kube::Resource>(object: &mut R) {
    object.add_finalizer(FINALIZER);
    object.meta_mut().deletion_timestamp = Some(Time(chrono::Utc::now()));
}

/// The owner tag the reconcilers derive for an object with this UID
pub fn owner_tag_for(uid: &str) -> String {
    format!("cloud-infra.microscaler.io/owned-by={uid}")
}
