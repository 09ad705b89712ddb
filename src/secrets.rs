//! # Credential Secrets
//!
//! The credential collaborator: resolves named secret references to raw
//! bytes and persists generated credentials (object storage key material)
//! for consumers. Failures are wrapped with the secret's namespace/name so
//! operators can tell which reference broke.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{DeleteParams, ObjectMeta, Patch, PatchParams};
use kube::{Api, Client};

use crate::constants::FIELD_MANAGER;

/// Raw secret payload: key -> bytes
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Store of named secrets
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret's data; `Ok(None)` when the secret does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>>;

    /// Create or overwrite a secret
    async fn put(&self, namespace: &str, name: &str, data: SecretData) -> Result<()>;

    /// Delete a secret; deleting an absent secret is not an error
    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Resolve a single key out of a named secret, with diagnosable errors
pub async fn resolve_secret_key(
    store: &dyn SecretStore,
    namespace: &str,
    name: &str,
    key: &str,
) -> Result<Vec<u8>> {
    let data = store
        .get(namespace, name)
        .await
        .with_context(|| format!("reading secret {namespace}/{name}"))?
        .with_context(|| format!("secret {namespace}/{name} not found"))?;
    data.get(key)
        .cloned()
        .with_context(|| format!("secret {namespace}/{name} has no key {key:?}"))
}

/// Kubernetes-backed secret store over core-v1 Secrets
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>> {
        let secret = self
            .api(namespace)
            .get_opt(name)
            .await
            .with_context(|| format!("reading secret {namespace}/{name}"))?;
        Ok(secret.map(|s| {
            s.data
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.0))
                .collect()
        }))
    }

    async fn put(&self, namespace: &str, name: &str, data: SecretData) -> Result<()> {
        let payload: BTreeMap<String, ByteString> =
            data.into_iter().map(|(k, v)| (k, ByteString(v))).collect();
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(payload),
            ..Default::default()
        };
        self.api(namespace)
            .patch(
                name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(&secret),
            )
            .await
            .with_context(|| format!("writing secret {namespace}/{name}"))?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        match self
            .api(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e).with_context(|| format!("deleting secret {namespace}/{name}")),
        }
    }
}

/// In-memory secret store used by the test-suite
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    inner: std::sync::Mutex<BTreeMap<(String, String), SecretData>>,
}

impl InMemorySecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a secret currently exists
    #[must_use]
    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.inner
            .lock()
            .expect("secret store mutex poisoned")
            .contains_key(&(namespace.to_string(), name.to_string()))
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>> {
        Ok(self
            .inner
            .lock()
            .expect("secret store mutex poisoned")
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn put(&self, namespace: &str, name: &str, data: SecretData) -> Result<()> {
        self.inner
            .lock()
            .expect("secret store mutex poisoned")
            .insert((namespace.to_string(), name.to_string()), data);
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.inner
            .lock()
            .expect("secret store mutex poisoned")
            .remove(&(namespace.to_string(), name.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_secret_key_reads_the_named_key() {
        let store = InMemorySecretStore::new();
        let mut data = SecretData::new();
        data.insert("token".to_string(), b"s3cret".to_vec());
        store.put("infra", "provider-credentials", data).await.expect("seeded");

        let bytes = resolve_secret_key(&store, "infra", "provider-credentials", "token")
            .await
            .expect("resolves");
        assert_eq!(bytes, b"s3cret".to_vec());
    }

    #[tokio::test]
    async fn test_resolve_secret_key_failures_name_the_secret() {
        let store = InMemorySecretStore::new();

        let err = resolve_secret_key(&store, "infra", "provider-credentials", "token")
            .await
            .expect_err("missing secret");
        assert!(err.to_string().contains("infra/provider-credentials"));

        store
            .put("infra", "provider-credentials", SecretData::new())
            .await
            .expect("seeded");
        let err = resolve_secret_key(&store, "infra", "provider-credentials", "token")
            .await
            .expect_err("missing key");
        assert!(err.to_string().contains("token"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemorySecretStore::new();
        store.delete("infra", "never-existed").await.expect("no error");
        assert!(!store.contains("infra", "never-existed"));
    }
}
