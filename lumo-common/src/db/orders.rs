//! Queries for the `orders` collection.
//!
//! Orders carry two JSON-array columns the media tooling cares about
//! (`items`, `design_files`) plus `design_payloads`, which holds inline
//! base64 blobs and is deliberately absent from every SELECT list here.

use crate::db::models::OrderItem;
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Media references extracted from one order row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRefs {
    pub order_id: String,
    /// Product image snapshots from the `items` array, in line-item order.
    pub item_image_urls: Vec<String>,
    /// Customer design uploads attached to the order.
    pub design_files: Vec<String>,
}

/// Load the media references of every order.
///
/// Rows with unparseable JSON fail the whole load; callers treat the
/// collection scan as all-or-nothing.
pub async fn load_media_refs(pool: &SqlitePool) -> Result<Vec<OrderRefs>> {
    let rows = sqlx::query(
        "SELECT id, items, design_files
         FROM orders
         ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    let mut refs = Vec::with_capacity(rows.len());
    for row in &rows {
        let order_id: String = row.get("id");
        let items_json: String = row.get("items");
        let design_json: String = row.get("design_files");

        let items: Vec<OrderItem> = serde_json::from_str(&items_json).map_err(|e| {
            Error::InvalidInput(format!("order {} has malformed items JSON: {}", order_id, e))
        })?;
        let design_files: Vec<String> = serde_json::from_str(&design_json).map_err(|e| {
            Error::InvalidInput(format!(
                "order {} has malformed design_files JSON: {}",
                order_id, e
            ))
        })?;

        refs.push(OrderRefs {
            order_id,
            item_image_urls: items.into_iter().filter_map(|i| i.image_url).collect(),
            design_files,
        });
    }

    Ok(refs)
}
