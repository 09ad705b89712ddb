//! Kubernetes-backed object store.
//!
//! `write` goes through `replace`, which carries the object's
//! `resourceVersion`: a stale revision surfaces as 409 and is mapped to
//! [`StoreError::Conflict`] for the engine's refetch-and-redo handling.
//! Status rides the status subresource, so one logical write is a `replace`
//! followed by a `replace_status` with the bumped revision.

use async_trait::async_trait;
use kube::api::{ListParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ObjectStore, StoreError};
use crate::crd::ObjectId;

/// Object store over the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced<R>(&self, namespace: &str) -> Api<R>
    where
        R: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + DeserializeOwned
            + Clone
            + std::fmt::Debug,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn map_kube_error(err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => StoreError::NotFound,
        kube::Error::Api(ae) if ae.code == 409 => StoreError::Conflict,
        other => StoreError::Api(other.to_string()),
    }
}

#[async_trait]
impl<R> ObjectStore<R> for KubeStore
where
    R: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
        + DeserializeOwned
        + Serialize
        + Clone
        + std::fmt::Debug
        + Send
        + Sync,
{
    async fn get(&self, id: &ObjectId) -> Result<Option<R>, StoreError> {
        let api: Api<R> = self.namespaced(&id.namespace);
        api.get_opt(&id.name).await.map_err(map_kube_error)
    }

    async fn write(&self, resource: &R) -> Result<(), StoreError> {
        let namespace = resource.namespace().unwrap_or_else(|| "default".to_string());
        let name = resource.name_any();
        let api: Api<R> = self.namespaced(&namespace);

        // replace() bumps the resourceVersion; the status write must carry
        // the new revision or it would conflict with our own first write
        let updated = api
            .replace(&name, &PostParams::default(), resource)
            .await
            .map_err(map_kube_error)?;

        let mut with_status = resource.clone();
        with_status
            .meta_mut()
            .resource_version
            .clone_from(&updated.meta().resource_version);
        let data = serde_json::to_vec(&with_status)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        api.replace_status(&name, &PostParams::default(), data)
            .await
            .map_err(map_kube_error)?;

        Ok(())
    }

    async fn list(&self, label_selector: &str) -> Result<Vec<R>, StoreError> {
        let api: Api<R> = Api::all(self.client.clone());
        let params = ListParams::default().labels(label_selector);
        let list = api.list(&params).await.map_err(map_kube_error)?;
        Ok(list.items)
    }
}
