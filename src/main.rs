//! # Cloud Infrastructure Controller
//!
//! Process bootstrap: tracing, metrics, the probe/metrics HTTP server, the
//! provider client, and one watch-driven controller per managed kind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use kube::Client;
use tracing::{error, info};

use cloud_infra_controller::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_CYCLE_TIMEOUT_SECS, DEFAULT_METRICS_PORT,
    DEFAULT_PROVIDER_TIMEOUT_SECS, TOKEN_ENV,
};
use cloud_infra_controller::controller::ipalloc::VlanIpRegistry;
use cloud_infra_controller::controller::reconcilers::{
    CloudFirewallReconciler, ComputeInstanceReconciler, LoadBalancerReconciler,
    ObjectAccessKeyReconciler, ObjectBucketReconciler, PlacementGroupReconciler,
    VpcNetworkReconciler,
};
use cloud_infra_controller::controller::runtime::run_controller;
use cloud_infra_controller::controller::{Context, ReconcileEngine};
use cloud_infra_controller::crd::{
    CloudFirewall, ComputeInstance, LoadBalancer, ObjectAccessKey, ObjectBucket, PlacementGroup,
    VpcNetwork,
};
use cloud_infra_controller::observability::{metrics, KubeEventRecorder};
use cloud_infra_controller::provider::{
    credential_fingerprint, ClientOptions, CloudApi, QuotaRegistry,
};
use cloud_infra_controller::secrets::KubeSecretStore;
use cloud_infra_controller::server::{start_server, ServerState};
use cloud_infra_controller::store::{KubeStore, ObjectStore};

/// Cloud Infrastructure Controller
#[derive(Parser, Debug)]
#[command(
    name = "cloud-infra-controller",
    about = "Drives cloud infrastructure resources toward their declared state",
    version
)]
struct Args {
    /// Port for metrics and health probes
    #[arg(long, default_value_t = DEFAULT_METRICS_PORT)]
    metrics_port: u16,

    /// Provider API base URL
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Per-call provider timeout in seconds
    #[arg(long, default_value_t = DEFAULT_PROVIDER_TIMEOUT_SECS)]
    provider_timeout_secs: u64,

    /// Automatic provider retries for transient failures (0 disables)
    #[arg(long, default_value_t = 2)]
    provider_retries: u32,

    /// Deadline for a single reconcile invocation in seconds
    #[arg(long, default_value_t = DEFAULT_CYCLE_TIMEOUT_SECS)]
    cycle_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloud_infra_controller=info".into()),
        )
        .init();

    // kube and reqwest share the process-wide TLS provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let args = Args::parse();
    info!(
        "Starting Cloud Infrastructure Controller (build {} {})",
        env!("BUILD_GIT_HASH"),
        env!("BUILD_DATETIME")
    );

    metrics::register_metrics().context("registering metrics")?;

    // Start HTTP server for metrics and probes
    let server_state = Arc::new(ServerState {
        is_ready: Arc::new(AtomicBool::new(false)),
    });
    let server_state_clone = Arc::clone(&server_state);
    let metrics_port = args.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(metrics_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Provider client: immutable once built, wired to the shared quota
    // registry so instance-creation responses feed the gate
    let token = std::env::var(TOKEN_ENV)
        .with_context(|| format!("provider token environment variable {TOKEN_ENV} is not set"))?;
    let quotas = Arc::new(QuotaRegistry::new());
    let options = ClientOptions {
        base_url: args.api_base_url.clone(),
        token: token.clone(),
        timeout: Duration::from_secs(args.provider_timeout_secs),
        retry_count: (args.provider_retries > 0).then_some(args.provider_retries),
    };
    let cloud: Arc<dyn CloudApi> = Arc::new(
        options
            .build(Arc::clone(&quotas))
            .context("building provider client")?,
    );

    let client = Client::try_default()
        .await
        .context("connecting to the Kubernetes API")?;

    let ctx = Arc::new(Context {
        cloud,
        secrets: Arc::new(KubeSecretStore::new(client.clone())),
        quotas,
        vlan_ips: Arc::new(VlanIpRegistry::new()),
        recorder: Arc::new(KubeEventRecorder::new(client.clone())),
        credential_fingerprint: credential_fingerprint(&token),
    });

    let kube_store = KubeStore::new(client.clone());
    let cycle_timeout = Duration::from_secs(args.cycle_timeout_secs);

    let networks: Arc<dyn ObjectStore<VpcNetwork>> = Arc::new(kube_store.clone());
    let firewalls: Arc<dyn ObjectStore<CloudFirewall>> = Arc::new(kube_store.clone());
    let balancers: Arc<dyn ObjectStore<LoadBalancer>> = Arc::new(kube_store.clone());
    let buckets: Arc<dyn ObjectStore<ObjectBucket>> = Arc::new(kube_store.clone());
    let keys: Arc<dyn ObjectStore<ObjectAccessKey>> = Arc::new(kube_store.clone());
    let groups: Arc<dyn ObjectStore<PlacementGroup>> = Arc::new(kube_store.clone());
    let instances: Arc<dyn ObjectStore<ComputeInstance>> = Arc::new(kube_store);

    let network_engine = ReconcileEngine::new(networks, VpcNetworkReconciler, Arc::clone(&ctx))
        .with_cycle_timeout(cycle_timeout);
    let firewall_engine = ReconcileEngine::new(firewalls, CloudFirewallReconciler, Arc::clone(&ctx))
        .with_cycle_timeout(cycle_timeout);
    let balancer_engine = ReconcileEngine::new(balancers, LoadBalancerReconciler, Arc::clone(&ctx))
        .with_cycle_timeout(cycle_timeout);
    let bucket_engine = ReconcileEngine::new(buckets, ObjectBucketReconciler, Arc::clone(&ctx))
        .with_cycle_timeout(cycle_timeout);
    let key_engine = ReconcileEngine::new(keys, ObjectAccessKeyReconciler, Arc::clone(&ctx))
        .with_cycle_timeout(cycle_timeout);
    let group_engine = ReconcileEngine::new(groups, PlacementGroupReconciler, Arc::clone(&ctx))
        .with_cycle_timeout(cycle_timeout);
    let instance_engine =
        ReconcileEngine::new(instances, ComputeInstanceReconciler, Arc::clone(&ctx))
            .with_cycle_timeout(cycle_timeout);

    // Mark as ready
    server_state.is_ready.store(true, Ordering::Relaxed);
    info!("watching 7 resource kinds across all namespaces");

    tokio::join!(
        run_controller(client.clone(), network_engine),
        run_controller(client.clone(), firewall_engine),
        run_controller(client.clone(), balancer_engine),
        run_controller(client.clone(), bucket_engine),
        run_controller(client.clone(), key_engine),
        run_controller(client.clone(), group_engine),
        run_controller(client, instance_engine),
    );

    info!("all controllers stopped");
    Ok(())
}
