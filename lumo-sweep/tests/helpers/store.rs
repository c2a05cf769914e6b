//! In-memory media store for integration tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lumo_common::store::url::canonical_url;
use lumo_common::store::{
    AssetPage, DeleteOutcome, MediaStore, RemoteAsset, StoreError, UploadReceipt,
};
use std::collections::HashSet;
use std::sync::Mutex;

pub const BASE_URL: &str = "https://media.example.com";
pub const SPACE: &str = "lumo-test";

/// Canonical delivery URL for an asset in the stub store.
pub fn store_url(remote_id: &str, version_ms: i64) -> String {
    canonical_url(BASE_URL, SPACE, version_ms, remote_id, "webp")
}

/// Build a remote asset whose URL follows the store's canonical shape.
pub fn asset(remote_id: &str, created_ms: i64) -> RemoteAsset {
    RemoteAsset {
        remote_id: remote_id.to_string(),
        created_at: DateTime::<Utc>::from_timestamp_millis(created_ms).unwrap(),
        width: Some(800),
        height: Some(600),
        format: Some("webp".to_string()),
        bytes: 4096,
        url: store_url(remote_id, created_ms),
    }
}

/// One recorded upload call.
#[derive(Debug, Clone)]
pub struct UploadedItem {
    pub name: String,
    pub folder: String,
    pub content_type: String,
    pub bytes: usize,
}

/// In-memory media store. Serves its assets in fixed-size pages (so listing
/// exercises the cursor loop), records every mutation, and can inject
/// per-id delete failures. Deleting an absent id reports `NotFound`.
pub struct StubStore {
    assets: Mutex<Vec<RemoteAsset>>,
    page_size: usize,
    pub fail_deletes: HashSet<String>,
    deletes: Mutex<Vec<String>>,
    uploads: Mutex<Vec<UploadedItem>>,
}

impl StubStore {
    pub fn new(assets: Vec<RemoteAsset>) -> Self {
        Self {
            assets: Mutex::new(assets),
            page_size: 2,
            fail_deletes: HashSet::new(),
            deletes: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Every id a delete was issued for, in call order.
    pub fn deleted_ids(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<UploadedItem> {
        self.uploads.lock().unwrap().clone()
    }

    /// Ids still present after mutations, in insertion order.
    pub fn remaining_ids(&self) -> Vec<String> {
        self.assets
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.remote_id.clone())
            .collect()
    }
}

#[async_trait]
impl MediaStore for StubStore {
    async fn list_page(
        &self,
        prefix: &str,
        max_results: u32,
        cursor: Option<&str>,
    ) -> Result<AssetPage, StoreError> {
        let assets = self.assets.lock().unwrap();
        let matching: Vec<RemoteAsset> = assets
            .iter()
            .filter(|a| a.remote_id.starts_with(prefix))
            .cloned()
            .collect();

        let start: usize = match cursor {
            Some(c) => c
                .parse()
                .map_err(|_| StoreError::Parse(format!("bad cursor: {c}")))?,
            None => 0,
        };
        let len = self.page_size.min(max_results as usize);
        let end = (start + len).min(matching.len());
        let next_cursor = if end < matching.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(AssetPage {
            assets: matching[start..end].to_vec(),
            next_cursor,
        })
    }

    async fn lookup(&self, remote_id: &str) -> Result<RemoteAsset, StoreError> {
        self.assets
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.remote_id == remote_id)
            .cloned()
            .ok_or_else(|| StoreError::AssetNotFound(remote_id.to_string()))
    }

    async fn delete(&self, remote_id: &str) -> Result<DeleteOutcome, StoreError> {
        self.deletes.lock().unwrap().push(remote_id.to_string());

        if self.fail_deletes.contains(remote_id) {
            return Err(StoreError::Api(500, "injected failure".to_string()));
        }

        let mut assets = self.assets.lock().unwrap();
        let before = assets.len();
        assets.retain(|a| a.remote_id != remote_id);
        if assets.len() < before {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    async fn upload(
        &self,
        content: &[u8],
        content_type: &str,
        folder: &str,
        name: &str,
    ) -> Result<UploadReceipt, StoreError> {
        self.uploads.lock().unwrap().push(UploadedItem {
            name: name.to_string(),
            folder: folder.to_string(),
            content_type: content_type.to_string(),
            bytes: content.len(),
        });

        let remote_id = format!("{folder}/{name}");
        let now = Utc::now();
        let uploaded = RemoteAsset {
            remote_id: remote_id.clone(),
            created_at: now,
            width: Some(800),
            height: Some(600),
            format: Some("webp".to_string()),
            bytes: content.len() as u64,
            url: store_url(&remote_id, now.timestamp_millis()),
        };
        let url = uploaded.url.clone();
        self.assets.lock().unwrap().push(uploaded);

        Ok(UploadReceipt { remote_id, url })
    }
}
