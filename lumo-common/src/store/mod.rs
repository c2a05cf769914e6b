//! Remote media-store types and client
//!
//! The store is an external, append-only blob service exposing four calls:
//! list (cursor-paginated), lookup, delete, upload. Assets are immutable and
//! destroyed only by explicit delete. Everything here is read/written through
//! the [`MediaStore`] trait so the reconciliation engine can run against an
//! in-memory fake in tests.

pub mod client;
pub mod url;

pub use client::HttpMediaStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media-store client errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One stored asset as the listing API reports it.
///
/// `remote_id` is the opaque handle (folder path included); the logical
/// identity behind it is derived separately from the trailing name segment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteAsset {
    /// Opaque store handle, e.g. `shop/products/product_<id>_<slot>_<millis>`
    pub remote_id: String,
    /// Store-side creation time
    pub created_at: DateTime<Utc>,
    /// Pixel width, when the store detected one
    pub width: Option<u32>,
    /// Pixel height, when the store detected one
    pub height: Option<u32>,
    /// Media format as reported by the store (e.g. "jpg", "webp")
    pub format: Option<String>,
    /// Stored size in bytes
    pub bytes: u64,
    /// Canonical delivery URL
    pub url: String,
}

impl RemoteAsset {
    /// Trailing name segment of the remote id (the part identity parsing
    /// reads), without any folder prefix.
    pub fn name(&self) -> &str {
        self.remote_id
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.remote_id)
    }
}

/// One page of a listing call
#[derive(Debug, Clone, Deserialize)]
pub struct AssetPage {
    pub assets: Vec<RemoteAsset>,
    /// Cursor for the next page; `None` means the listing is exhausted
    pub next_cursor: Option<String>,
}

/// Outcome of a delete call. `NotFound` is success: the asset is gone either
/// way, so deletes are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Receipt for a completed upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadReceipt {
    pub remote_id: String,
    pub url: String,
}

/// The four store operations this system is allowed to use.
///
/// Implemented by [`HttpMediaStore`] for the real service and by in-memory
/// fakes in tests.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// List one page of assets under `prefix`.
    async fn list_page(
        &self,
        prefix: &str,
        max_results: u32,
        cursor: Option<&str>,
    ) -> Result<AssetPage, StoreError>;

    /// Look up a single asset by remote id.
    ///
    /// Returns [`StoreError::AssetNotFound`] when the store has no such id.
    async fn lookup(&self, remote_id: &str) -> Result<RemoteAsset, StoreError>;

    /// Delete a single asset by remote id.
    async fn delete(&self, remote_id: &str) -> Result<DeleteOutcome, StoreError>;

    /// Store a new blob under `folder/name`. Never overwrites: names carry a
    /// caller-stamped version, so a fresh upload is always a fresh asset.
    async fn upload(
        &self,
        content: &[u8],
        content_type: &str,
        folder: &str,
        name: &str,
    ) -> Result<UploadReceipt, StoreError>;
}
