//! ObjectAccessKey CRD - rotatable object storage credential.
//!
//! Bumping `keyGeneration` requests a rotation: a new provider key is created
//! first, references move to it, and only then is the old key revoked. A
//! failed revocation is recorded in `status.staleKeyIds` rather than failing
//! the cycle.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::Condition;

#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cloud-infra.microscaler.io",
    version = "v1",
    kind = "ObjectAccessKey",
    namespaced,
    status = "ObjectAccessKeyStatus",
    derive = "PartialEq",
    shortname = "oak",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ObjectAccessKeySpec {
    /// Provider id of the live access key once created or adopted
    #[serde(default)]
    pub external_id: Option<String>,
    /// Key label. Defaults to the object name.
    #[serde(default)]
    pub label: Option<String>,
    /// Rotation counter. A value different from `status.lastKeyGeneration`
    /// triggers create-new-then-revoke-old rotation.
    #[serde(default)]
    pub key_generation: i64,
    /// Buckets the key grants access to
    #[serde(default)]
    pub bucket_access: Vec<BucketAccessSpec>,
    /// Name of the credential Secret written for consumers.
    /// Defaults to "<object name>-obj-key" in the object's namespace.
    #[serde(default)]
    pub secret_name: Option<String>,
}

/// Grant of access to a single bucket
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketAccessSpec {
    pub bucket_name: String,
    pub region: String,
    pub permissions: AccessPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessPermission {
    ReadOnly,
    ReadWrite,
}

/// Status of an ObjectAccessKey resource
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectAccessKeyStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Generation of the currently issued key; equality with
    /// `spec.keyGeneration` means no rotation is pending
    #[serde(default)]
    pub last_key_generation: Option<i64>,
    /// Provider id of the live access key
    #[serde(default)]
    pub access_key_ref: Option<String>,
    /// Name of the credential Secret holding the key material
    #[serde(default)]
    pub secret_name: Option<String>,
    /// Old key ids whose post-rotation revocation failed; kept for manual
    /// cleanup, never retried
    #[serde(default)]
    pub stale_key_ids: Vec<String>,
}

impl_managed_object!(ObjectAccessKey, ObjectAccessKeyStatus);
