//! HTTP client for the repository manager's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{
    ArtifactStore, PathsPromoteRequest, PathsPromoteResult, RepoError, RepoResult,
    RepositoryManager,
};
use crate::config::RepositoryManagerConfig;
use crate::model::{StoreKey, TrackedContent};

const STORES: &str = "/api/admin/stores";
const PROMOTE: &str = "/api/promotion/paths/promote";
const ROLLBACK: &str = "/api/promotion/paths/rollback";
const TRACKING_ADMIN: &str = "/api/folo/admin";
const TRACKING: &str = "/api/folo/track";

/// Repository manager reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRepositoryManager {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpRepositoryManager {
    pub fn new(config: &RepositoryManagerConfig) -> RepoResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RepoError::Transport {
                url: config.url.clone(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Build the full URL for an API path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn store_url(&self, key: &StoreKey) -> String {
        self.url(&format!(
            "{}/{}/{}/{}",
            STORES,
            key.package_type(),
            key.store_type(),
            urlencoding::encode(key.name())
        ))
    }

    fn record_url(&self, build_id: &str, suffix: &str) -> String {
        self.url(&format!(
            "{}/{}/{}",
            TRACKING_ADMIN,
            urlencoding::encode(build_id),
            suffix
        ))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> RepoResult<Response> {
        builder.send().await.map_err(|e| RepoError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Map a non-2xx response to an error carrying its body.
    async fn check(response: Response, url: &str) -> RepoResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RepoError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> RepoResult<T> {
        response.json().await.map_err(|e| RepoError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn store_body(store: &ArtifactStore, changelog: &str) -> RepoResult<serde_json::Value> {
        let mut body = serde_json::to_value(store).map_err(|e| RepoError::Decode {
            url: store.key.to_string(),
            reason: e.to_string(),
        })?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("name".to_string(), json!(store.key.name()));
            fields.insert("type".to_string(), json!(store.key.store_type()));
            fields.insert("packageType".to_string(), json!(store.key.package_type()));
            let metadata = fields
                .entry("metadata")
                .or_insert_with(|| json!({}));
            if !metadata.is_object() {
                *metadata = json!({});
            }
            if let Some(metadata) = metadata.as_object_mut() {
                metadata.insert("changelog".to_string(), json!(changelog));
            }
        }
        Ok(body)
    }
}

#[async_trait]
impl RepositoryManager for HttpRepositoryManager {
    async fn store_exists(&self, key: &StoreKey) -> RepoResult<bool> {
        let url = self.store_url(key);
        let response = self.send(self.request(Method::HEAD, &url), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response, &url).await?;
        Ok(true)
    }

    async fn create_store(&self, store: &ArtifactStore, changelog: &str) -> RepoResult<()> {
        let url = self.url(&format!(
            "{}/{}/{}",
            STORES,
            store.key.package_type(),
            store.key.store_type()
        ));
        let body = Self::store_body(store, changelog)?;
        let response = self
            .send(self.request(Method::POST, &url).json(&body), &url)
            .await?;
        Self::check(response, &url).await?;
        Ok(())
    }

    async fn load_store(&self, key: &StoreKey) -> RepoResult<ArtifactStore> {
        let url = self.store_url(key);
        let response = self.send(self.request(Method::GET, &url), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RepoError::StoreNotFound(key.to_string()));
        }
        let response = Self::check(response, &url).await?;
        Self::decode(response, &url).await
    }

    async fn update_store(&self, store: &ArtifactStore, changelog: &str) -> RepoResult<()> {
        let url = self.store_url(&store.key);
        let body = Self::store_body(store, changelog)?;
        let response = self
            .send(self.request(Method::PUT, &url).json(&body), &url)
            .await?;
        Self::check(response, &url).await?;
        Ok(())
    }

    async fn delete_store(&self, key: &StoreKey, changelog: &str) -> RepoResult<()> {
        let url = self.store_url(key);
        let builder = self
            .request(Method::DELETE, &url)
            .header("CHANGELOG", changelog);
        let response = self.send(builder, &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(store = %key, "Store already absent");
            return Ok(());
        }
        Self::check(response, &url).await?;
        Ok(())
    }

    async fn promote_by_path(
        &self,
        request: &PathsPromoteRequest,
    ) -> RepoResult<PathsPromoteResult> {
        let url = self.url(PROMOTE);
        let response = self
            .send(self.request(Method::POST, &url).json(request), &url)
            .await?;
        let response = Self::check(response, &url).await?;
        Self::decode(response, &url).await
    }

    async fn rollback_path_promote(
        &self,
        result: &PathsPromoteResult,
    ) -> RepoResult<PathsPromoteResult> {
        let url = self.url(ROLLBACK);
        let response = self
            .send(self.request(Method::POST, &url).json(result), &url)
            .await?;
        let response = Self::check(response, &url).await?;
        Self::decode(response, &url).await
    }

    async fn init_tracking_report(&self, build_id: &str) -> RepoResult<()> {
        let url = self.record_url(build_id, "record");
        let response = self.send(self.request(Method::PUT, &url), &url).await?;
        Self::check(response, &url).await?;
        Ok(())
    }

    async fn seal_tracking_record(&self, build_id: &str) -> RepoResult<bool> {
        let url = self.record_url(build_id, "record");
        let response = self.send(self.request(Method::POST, &url), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response, &url).await?;
        Ok(true)
    }

    async fn get_tracking_report(&self, build_id: &str) -> RepoResult<Option<TrackedContent>> {
        let url = self.record_url(build_id, "report");
        let response = self.send(self.request(Method::GET, &url), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response, &url).await?;
        Self::decode(response, &url).await.map(Some)
    }

    fn tracking_url(&self, build_id: &str, key: &StoreKey) -> String {
        self.url(&format!(
            "{}/{}/{}/{}/{}",
            TRACKING,
            urlencoding::encode(build_id),
            key.package_type(),
            key.store_type(),
            urlencoding::encode(key.name())
        ))
    }
}
