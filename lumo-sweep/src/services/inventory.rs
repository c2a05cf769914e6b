//! Remote inventory scanner
//!
//! Enumerates every asset under a folder prefix by walking the store's
//! cursor-paginated listing. Termination is solely "no cursor returned";
//! there is no page cap. Any API error is fatal for the run: partial
//! inventories must never feed the retention policy, because an asset the
//! scan missed would look like it does not exist.

use crate::{SweepError, SweepResult};
use lumo_common::store::{MediaStore, RemoteAsset};
use std::sync::Arc;

pub struct InventoryScanner {
    store: Arc<dyn MediaStore>,
    page_size: u32,
}

impl InventoryScanner {
    pub fn new(store: Arc<dyn MediaStore>, page_size: u32) -> Self {
        Self { store, page_size }
    }

    /// Enumerate all assets under `folder_prefix`, in listing order.
    pub async fn scan(&self, folder_prefix: &str) -> SweepResult<Vec<RemoteAsset>> {
        let mut assets = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self
                .store
                .list_page(folder_prefix, self.page_size, cursor.as_deref())
                .await
                .map_err(SweepError::RemoteScan)?;

            pages += 1;
            assets.extend(page.assets);
            tracing::debug!(
                prefix = %folder_prefix,
                pages = pages,
                total = assets.len(),
                "Inventory page received"
            );

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!(
            prefix = %folder_prefix,
            assets = assets.len(),
            pages = pages,
            "Remote inventory scan complete"
        );

        Ok(assets)
    }
}
