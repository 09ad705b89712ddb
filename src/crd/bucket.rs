//! ObjectBucket CRD - object storage bucket.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::Condition;

#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cloud-infra.microscaler.io",
    version = "v1",
    kind = "ObjectBucket",
    namespaced,
    status = "ObjectBucketStatus",
    derive = "PartialEq",
    shortname = "obkt",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBucketSpec {
    /// Provider id of the bucket once created or adopted
    #[serde(default)]
    pub external_id: Option<String>,
    /// Bucket label. Defaults to the object name. Bucket labels are unique
    /// per region on the provider side.
    #[serde(default)]
    pub label: Option<String>,
    /// Object storage region/cluster hosting the bucket
    pub region: String,
    /// Canned ACL applied at creation
    #[serde(default)]
    pub acl: Option<BucketAcl>,
    /// Whether CORS is enabled on the bucket
    #[serde(default)]
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum BucketAcl {
    #[serde(rename = "private")]
    Private,
    #[serde(rename = "public-read")]
    PublicRead,
}

/// Status of an ObjectBucket resource
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBucketStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// S3-compatible endpoint hostname for the bucket
    #[serde(default)]
    pub hostname: Option<String>,
}

impl_managed_object!(ObjectBucket, ObjectBucketStatus);
