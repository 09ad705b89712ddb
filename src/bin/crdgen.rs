//! # CRD Generator
//!
//! Generates Kubernetes CustomResourceDefinition (CRD) YAML from the Rust
//! type definitions, one document per managed kind.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/cloud-infra.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::Result;
use kube::core::CustomResourceExt;

use cloud_infra_controller::crd::{
    CloudFirewall, ComputeInstance, LoadBalancer, ObjectAccessKey, ObjectBucket, PlacementGroup,
    VpcNetwork,
};

fn main() -> Result<()> {
    let crds = [
        serde_yaml::to_string(&VpcNetwork::crd())?,
        serde_yaml::to_string(&CloudFirewall::crd())?,
        serde_yaml::to_string(&LoadBalancer::crd())?,
        serde_yaml::to_string(&ObjectBucket::crd())?,
        serde_yaml::to_string(&ObjectAccessKey::crd())?,
        serde_yaml::to_string(&PlacementGroup::crd())?,
        serde_yaml::to_string(&ComputeInstance::crd())?,
    ];
    println!("{}", crds.join("---\n"));
    Ok(())
}
