//! HTTP client for the remote media store
//!
//! Thin typed wrapper over the store's REST API. Admin calls authenticate
//! with basic auth (API key/secret); every request carries a bounded timeout
//! so a wedged store cannot hang a maintenance run indefinitely. Mutating
//! calls (delete, upload) are paced through a minimum-interval limiter so
//! bursts from batch tooling stay inside the store's rate limits.

use super::{AssetPage, DeleteOutcome, MediaStore, RemoteAsset, StoreError, UploadReceipt};
use crate::config::MediaStoreConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const USER_AGENT: &str = concat!("lumo-sweep/", env!("CARGO_PKG_VERSION"));

/// Minimum spacing between mutating API calls
const MUTATION_INTERVAL_MS: u64 = 250;

/// Delete API response body
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    result: String,
}

/// Rate limiter enforcing a minimum interval between calls
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the interval
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Media-store API client
pub struct HttpMediaStore {
    http: reqwest::Client,
    config: MediaStoreConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpMediaStore {
    pub fn new(config: MediaStoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            http,
            config,
            rate_limiter: Arc::new(RateLimiter::new(MUTATION_INTERVAL_MS)),
        })
    }

    /// Collection endpoint: `{base}/v1/spaces/{space}/assets`
    fn assets_url(&self) -> String {
        format!("{}/v1/spaces/{}/assets", self.config.base_url, self.config.space)
    }

    /// Single-asset endpoint; remote ids keep their folder slashes in the
    /// path, the server matches the rest-of-path as the id.
    fn asset_url(&self, remote_id: &str) -> String {
        format!("{}/{}", self.assets_url(), remote_id)
    }

    async fn check_status(
        response: reqwest::Response,
        not_found: impl FnOnce() -> StoreError,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(not_found());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(status.as_u16(), body));
        }
        Ok(response)
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    async fn list_page(
        &self,
        prefix: &str,
        max_results: u32,
        cursor: Option<&str>,
    ) -> Result<AssetPage, StoreError> {
        let mut request = self
            .http
            .get(self.assets_url())
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&[("prefix", prefix)])
            .query(&[("max_results", max_results)]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        tracing::debug!(prefix = %prefix, cursor = ?cursor, "Listing media store page");

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let response = Self::check_status(response, || {
            StoreError::Api(404, "listing endpoint not found".to_string())
        })
        .await?;

        response
            .json::<AssetPage>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn lookup(&self, remote_id: &str) -> Result<RemoteAsset, StoreError> {
        let response = self
            .http
            .get(self.asset_url(remote_id))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let response =
            Self::check_status(response, || StoreError::AssetNotFound(remote_id.to_string()))
                .await?;

        response
            .json::<RemoteAsset>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn delete(&self, remote_id: &str) -> Result<DeleteOutcome, StoreError> {
        self.rate_limiter.wait().await;

        let response = self
            .http
            .delete(self.asset_url(remote_id))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        // A 404 from the delete endpoint is the idempotent case, not an error
        if response.status().as_u16() == 404 {
            return Ok(DeleteOutcome::NotFound);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(status.as_u16(), body));
        }

        let body: DeleteResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        match body.result.as_str() {
            "ok" => Ok(DeleteOutcome::Deleted),
            "not_found" => Ok(DeleteOutcome::NotFound),
            other => Err(StoreError::Parse(format!("unexpected delete result: {other}"))),
        }
    }

    async fn upload(
        &self,
        content: &[u8],
        content_type: &str,
        folder: &str,
        name: &str,
    ) -> Result<UploadReceipt, StoreError> {
        self.rate_limiter.wait().await;

        tracing::debug!(
            folder = %folder,
            name = %name,
            bytes = content.len(),
            "Uploading asset to media store"
        );

        let response = self
            .http
            .put(self.assets_url())
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&[("folder", folder), ("name", name)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let response = Self::check_status(response, || {
            StoreError::Api(404, "upload endpoint not found".to_string())
        })
        .await?;

        response
            .json::<UploadReceipt>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MediaStoreConfig {
        MediaStoreConfig {
            base_url: "https://media.example.com".to_string(),
            space: "lumo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "shop".to_string(),
            timeout_secs: 20,
            page_size: 500,
        }
    }

    #[test]
    fn client_creation() {
        let client = HttpMediaStore::new(test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn asset_url_keeps_folder_slashes() {
        let client = HttpMediaStore::new(test_config()).unwrap();
        assert_eq!(
            client.asset_url("shop/products/product_a_0_1000"),
            "https://media.example.com/v1/spaces/lumo/assets/shop/products/product_a_0_1000"
        );
    }

    #[tokio::test]
    async fn rate_limiter_spaces_consecutive_calls() {
        let limiter = RateLimiter::new(100);

        let start = Instant::now();
        limiter.wait().await;
        let first_elapsed = start.elapsed();
        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(50));
        assert!(second_elapsed >= Duration::from_millis(90));
    }
}
