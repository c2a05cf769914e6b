//! Live reference scanner
//!
//! Walks the reference-bearing collections and recovers which remote assets
//! are currently in use. Two surfaces:
//!
//! - [`LiveRefScanner::scan_live`] builds the liveness set the retention
//!   policy consumes (gallery and slideshow references, the slots the
//!   deduplication sweep owns);
//! - [`LiveRefScanner::collect_references`] enumerates every recorded
//!   reference (orders and reviews included) for the URL health path.
//!
//! A reference whose URL shape is not recognized yields no identifier and is
//! silently treated as unreferenced; that is debug-logged, never an error.
//! Each collection is read in one bulk query with inline-payload columns
//! excluded from the projection.

use crate::SweepResult;
use lumo_common::db::{gallery, orders, reviews, slideshow};
use lumo_common::store::url::{classify_reference, extract_remote_id, RefKind};
use sqlx::SqlitePool;
use std::collections::HashSet;

/// One recorded reference, recomputed per run and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveReference {
    /// Collection the reference was found in
    pub collection: &'static str,
    /// Row id within the collection
    pub row_id: String,
    /// Field path within the row, e.g. `items[2].image_url`
    pub field: String,
    /// The recorded value, verbatim
    pub url: String,
    /// Extracted remote handle, when the URL has the store's shape
    pub remote_id: Option<String>,
}

pub struct LiveRefScanner {
    pool: SqlitePool,
}

impl LiveRefScanner {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Build the set of remote ids the deduplication sweep must treat as in
    /// use: every extractable gallery and slideshow reference.
    pub async fn scan_live(&self) -> SweepResult<HashSet<String>> {
        let mut live = HashSet::new();

        for item in gallery::load_items(&self.pool).await? {
            if let Some(id) = extract_if_remote("gallery_items", &item.id, &item.image_url) {
                live.insert(id);
            }
        }
        for slide in slideshow::load_slides(&self.pool).await? {
            if let Some(id) = extract_if_remote("slideshow_slides", &slide.id, &slide.image_url) {
                live.insert(id);
            }
        }

        tracing::info!(live = live.len(), "Live reference scan complete");
        Ok(live)
    }

    /// Enumerate every recorded reference across all collections, with its
    /// extracted remote id where one exists.
    pub async fn collect_references(&self) -> SweepResult<Vec<LiveReference>> {
        let mut refs = Vec::new();

        for item in gallery::load_items(&self.pool).await? {
            refs.push(reference(
                "gallery_items",
                item.id,
                "image_url".to_string(),
                item.image_url,
            ));
        }

        for slide in slideshow::load_slides(&self.pool).await? {
            refs.push(reference(
                "slideshow_slides",
                slide.id,
                "image_url".to_string(),
                slide.image_url,
            ));
        }

        for order in orders::load_media_refs(&self.pool).await? {
            for (i, url) in order.item_image_urls.into_iter().enumerate() {
                refs.push(reference(
                    "orders",
                    order.order_id.clone(),
                    format!("items[{i}].image_url"),
                    url,
                ));
            }
            for (i, url) in order.design_files.into_iter().enumerate() {
                refs.push(reference(
                    "orders",
                    order.order_id.clone(),
                    format!("design_files[{i}]"),
                    url,
                ));
            }
        }

        for review in reviews::load_photo_refs(&self.pool).await? {
            for (i, url) in review.photo_urls.into_iter().enumerate() {
                refs.push(reference(
                    "reviews",
                    review.review_id.clone(),
                    format!("photo_urls[{i}]"),
                    url,
                ));
            }
        }

        tracing::debug!(references = refs.len(), "Collected recorded references");
        Ok(refs)
    }
}

fn reference(
    collection: &'static str,
    row_id: String,
    field: String,
    url: String,
) -> LiveReference {
    let remote_id = extract_if_remote(collection, &row_id, &url);
    LiveReference {
        collection,
        row_id,
        field,
        url,
        remote_id,
    }
}

/// Extract a remote id from a reference value if it is a store URL.
///
/// Non-store values (local paths, inline payloads, foreign URLs) and store
/// URLs of unrecognized shape yield `None`.
fn extract_if_remote(collection: &str, row_id: &str, url: &str) -> Option<String> {
    match classify_reference(url) {
        RefKind::RemoteStore => {
            let extracted = extract_remote_id(url);
            if extracted.is_none() {
                tracing::debug!(
                    collection = %collection,
                    row_id = %row_id,
                    url = %url,
                    "Store URL of unrecognized shape; treating as unreferenced"
                );
            }
            extracted
        }
        _ => None,
    }
}
