//! REST implementation of the provider facade.
//!
//! Uses reqwest for HTTP requests with bearer-token authentication. The
//! client is built from [`ClientOptions`] and immutable afterwards; each
//! option has exactly one effect (`retry_count` enables bounded automatic
//! retry of transient failures, `timeout` caps per-call duration, `token`
//! selects the credential).
//!
//! Instance creation is the provider's expensive call class: its responses
//! carry `X-RateLimit-Remaining` / `X-RateLimit-Reset` headers which are fed
//! into the shared [`QuotaRegistry`] on every response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::filter::ListFilter;
use super::quota::{credential_fingerprint, QuotaRegistry};
use super::types::*;
use super::ProviderError;
use crate::observability::metrics;

/// Configuration for constructing a [`RestClient`].
///
/// Each field is an enumerated effect: nothing here mutates after `build`.
#[derive(Clone)]
pub struct ClientOptions {
    /// Provider API base URL, without trailing slash
    pub base_url: String,
    /// Bearer token presented on every call
    pub token: String,
    /// Per-call timeout
    pub timeout: Duration,
    /// Automatic retry of transient failures; `None` disables retry
    pub retry_count: Option<u32>,
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token must never land in logs
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}

impl ClientOptions {
    /// Build an immutable client wired to the shared quota registry
    pub fn build(&self, quotas: Arc<QuotaRegistry>) -> Result<RestClient, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(RestClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            token: self.token.clone(),
            retry_count: self.retry_count.unwrap_or(0),
            fingerprint: credential_fingerprint(&self.token),
            quotas,
        })
    }
}

/// Provider REST client implementing every facade trait
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    retry_count: u32,
    fingerprint: String,
    quotas: Arc<QuotaRegistry>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("fingerprint", &self.fingerprint)
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Fingerprint of the credential this client calls with
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        filter: Option<&ListFilter>,
        observe_quota: bool,
    ) -> Result<Response, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;
        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.token);
            if let Some(rendered) = filter.and_then(ListFilter::render) {
                request = request.query(&[("filter", rendered)]);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let result = request.send().await;
            metrics::increment_provider_requests(method.as_str(), path);

            match result {
                Ok(response) => {
                    if observe_quota {
                        self.observe_quota_headers(&response);
                    }
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let err = error_from_response(response, path).await;
                    if err.is_transient() && attempt < self.retry_count {
                        attempt += 1;
                        debug!("retrying {} {} after transient error: {}", method, path, err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = if e.is_timeout() {
                        ProviderError::Timeout
                    } else {
                        ProviderError::Transport(e.to_string())
                    };
                    if attempt < self.retry_count {
                        attempt += 1;
                        debug!("retrying {} {} after transport error: {}", method, path, err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Record the quota window advertised by the response, keyed by this
    /// client's credential
    fn observe_quota_headers(&self, response: &Response) {
        let remaining = header_u64(response, "X-RateLimit-Remaining");
        let reset = header_u64(response, "X-RateLimit-Reset");
        if let (Some(remaining), Some(reset)) = (remaining, reset) {
            let reset_at = unix_to_datetime(reset);
            self.quotas.observe(
                &self.fingerprint,
                u32::try_from(remaining).unwrap_or(u32::MAX),
                reset_at,
            );
        }
    }

    async fn list_resources<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: &ListFilter,
    ) -> Result<Vec<T>, ProviderError> {
        let response = self
            .send(Method::GET, path, None, Some(filter), false)
            .await?;
        parse_json(response).await
    }

    async fn get_resource<T: DeserializeOwned>(
        &self,
        path: &str,
        id: &str,
    ) -> Result<T, ProviderError> {
        let response = self
            .send(Method::GET, &format!("{path}/{id}"), None, None, false)
            .await?;
        parse_json(response).await
    }

    async fn create_resource<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: &impl Serialize,
        observe_quota: bool,
    ) -> Result<T, ProviderError> {
        let body = serde_json::to_value(opts)
            .map_err(|e| ProviderError::Transport(format!("request serialization: {e}")))?;
        let response = self
            .send(Method::POST, path, Some(&body), None, observe_quota)
            .await?;
        parse_json(response).await
    }

    async fn update_resource<T: DeserializeOwned>(
        &self,
        path: &str,
        id: &str,
        opts: &impl Serialize,
    ) -> Result<T, ProviderError> {
        let body = serde_json::to_value(opts)
            .map_err(|e| ProviderError::Transport(format!("request serialization: {e}")))?;
        let response = self
            .send(Method::PUT, &format!("{path}/{id}"), Some(&body), None, false)
            .await?;
        parse_json(response).await
    }

    async fn delete_resource(&self, path: &str, id: &str) -> Result<(), ProviderError> {
        self.send(Method::DELETE, &format!("{path}/{id}"), None, None, false)
            .await
            .map(|_| ())
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status().as_u16();
    response.json::<T>().await.map_err(|e| ProviderError::Api {
        status,
        message: format!("response decoding failed: {e}"),
    })
}

async fn error_from_response(response: Response, path: &str) -> ProviderError {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset_at = header_u64(&response, "X-RateLimit-Reset")
            .map_or_else(|| Utc::now() + chrono::Duration::seconds(60), unix_to_datetime);
        return ProviderError::RateLimited { reset_at };
    }

    let code = status.as_u16();
    let message = response.text().await.unwrap_or_default();
    match code {
        404 => ProviderError::NotFound(path.to_string()),
        400 | 422 => ProviderError::BadRequest(message),
        _ => {
            if code >= 500 {
                warn!("provider server error on {}: {} {}", path, code, message);
            }
            ProviderError::Api {
                status: code,
                message,
            }
        }
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn unix_to_datetime(secs: u64) -> DateTime<Utc> {
    Utc.timestamp_opt(i64::try_from(secs).unwrap_or(i64::MAX), 0)
        .single()
        .unwrap_or_else(Utc::now)
}

#[async_trait]
impl super::VpcApi for RestClient {
    async fn list_vpcs(&self, filter: &ListFilter) -> Result<Vec<Vpc>, ProviderError> {
        self.list_resources("/networks", filter).await
    }

    async fn get_vpc(&self, id: &str) -> Result<Vpc, ProviderError> {
        self.get_resource("/networks", id).await
    }

    async fn create_vpc(&self, opts: VpcCreateOpts) -> Result<Vpc, ProviderError> {
        self.create_resource("/networks", &opts, false).await
    }

    async fn update_vpc(&self, id: &str, opts: VpcUpdateOpts) -> Result<Vpc, ProviderError> {
        self.update_resource("/networks", id, &opts).await
    }

    async fn delete_vpc(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_resource("/networks", id).await
    }
}

#[async_trait]
impl super::FirewallApi for RestClient {
    async fn list_firewalls(&self, filter: &ListFilter) -> Result<Vec<Firewall>, ProviderError> {
        self.list_resources("/firewalls", filter).await
    }

    async fn get_firewall(&self, id: &str) -> Result<Firewall, ProviderError> {
        self.get_resource("/firewalls", id).await
    }

    async fn create_firewall(&self, opts: FirewallCreateOpts) -> Result<Firewall, ProviderError> {
        self.create_resource("/firewalls", &opts, false).await
    }

    async fn update_firewall(
        &self,
        id: &str,
        opts: FirewallUpdateOpts,
    ) -> Result<Firewall, ProviderError> {
        self.update_resource("/firewalls", id, &opts).await
    }

    async fn delete_firewall(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_resource("/firewalls", id).await
    }
}

#[async_trait]
impl super::BalancerApi for RestClient {
    async fn list_balancers(&self, filter: &ListFilter) -> Result<Vec<Balancer>, ProviderError> {
        self.list_resources("/balancers", filter).await
    }

    async fn get_balancer(&self, id: &str) -> Result<Balancer, ProviderError> {
        self.get_resource("/balancers", id).await
    }

    async fn create_balancer(&self, opts: BalancerCreateOpts) -> Result<Balancer, ProviderError> {
        self.create_resource("/balancers", &opts, false).await
    }

    async fn update_balancer(
        &self,
        id: &str,
        opts: BalancerUpdateOpts,
    ) -> Result<Balancer, ProviderError> {
        self.update_resource("/balancers", id, &opts).await
    }

    async fn delete_balancer(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_resource("/balancers", id).await
    }
}

#[async_trait]
impl super::BucketApi for RestClient {
    async fn list_buckets(&self, filter: &ListFilter) -> Result<Vec<Bucket>, ProviderError> {
        self.list_resources("/object-storage/buckets", filter).await
    }

    async fn get_bucket(&self, id: &str) -> Result<Bucket, ProviderError> {
        self.get_resource("/object-storage/buckets", id).await
    }

    async fn create_bucket(&self, opts: BucketCreateOpts) -> Result<Bucket, ProviderError> {
        self.create_resource("/object-storage/buckets", &opts, false)
            .await
    }

    async fn update_bucket(
        &self,
        id: &str,
        opts: BucketUpdateOpts,
    ) -> Result<Bucket, ProviderError> {
        self.update_resource("/object-storage/buckets", id, &opts).await
    }

    async fn delete_bucket(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_resource("/object-storage/buckets", id).await
    }
}

#[async_trait]
impl super::ObjectKeyApi for RestClient {
    async fn list_object_keys(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<ObjectKey>, ProviderError> {
        self.list_resources("/object-storage/keys", filter).await
    }

    async fn get_object_key(&self, id: &str) -> Result<ObjectKey, ProviderError> {
        self.get_resource("/object-storage/keys", id).await
    }

    async fn create_object_key(
        &self,
        opts: ObjectKeyCreateOpts,
    ) -> Result<ObjectKey, ProviderError> {
        self.create_resource("/object-storage/keys", &opts, false)
            .await
    }

    async fn update_object_key(
        &self,
        id: &str,
        opts: ObjectKeyUpdateOpts,
    ) -> Result<ObjectKey, ProviderError> {
        self.update_resource("/object-storage/keys", id, &opts).await
    }

    async fn delete_object_key(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_resource("/object-storage/keys", id).await
    }
}

#[async_trait]
impl super::PlacementApi for RestClient {
    async fn list_placement_groups(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<PlacementGroup>, ProviderError> {
        self.list_resources("/placement/groups", filter).await
    }

    async fn get_placement_group(&self, id: &str) -> Result<PlacementGroup, ProviderError> {
        self.get_resource("/placement/groups", id).await
    }

    async fn create_placement_group(
        &self,
        opts: PlacementGroupCreateOpts,
    ) -> Result<PlacementGroup, ProviderError> {
        self.create_resource("/placement/groups", &opts, false).await
    }

    async fn update_placement_group(
        &self,
        id: &str,
        opts: PlacementGroupUpdateOpts,
    ) -> Result<PlacementGroup, ProviderError> {
        self.update_resource("/placement/groups", id, &opts).await
    }

    async fn delete_placement_group(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_resource("/placement/groups", id).await
    }
}

#[async_trait]
impl super::InstanceApi for RestClient {
    async fn list_instances(&self, filter: &ListFilter) -> Result<Vec<Instance>, ProviderError> {
        self.list_resources("/instances", filter).await
    }

    async fn get_instance(&self, id: &str) -> Result<Instance, ProviderError> {
        self.get_resource("/instances", id).await
    }

    async fn create_instance(&self, opts: InstanceCreateOpts) -> Result<Instance, ProviderError> {
        // Quota headers are parsed on every response of this call class,
        // success or failure
        self.create_resource("/instances", &opts, true).await
    }

    async fn update_instance(
        &self,
        id: &str,
        opts: InstanceUpdateOpts,
    ) -> Result<Instance, ProviderError> {
        self.update_resource("/instances", id, &opts).await
    }

    async fn delete_instance(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_resource("/instances", id).await
    }
}
