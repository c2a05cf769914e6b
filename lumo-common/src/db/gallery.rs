//! Queries for the `gallery_items` collection.

use crate::db::models::GalleryItem;
use crate::Result;
use sqlx::{Row, SqlitePool};

/// Load every gallery row, ordered for stable iteration.
pub async fn load_items(pool: &SqlitePool) -> Result<Vec<GalleryItem>> {
    let rows = sqlx::query(
        "SELECT id, product_id, slot, image_url, caption
         FROM gallery_items
         ORDER BY product_id, slot",
    )
    .fetch_all(pool)
    .await?;

    let items = rows
        .iter()
        .map(|row| GalleryItem {
            id: row.get("id"),
            product_id: row.get("product_id"),
            slot: row.get("slot"),
            image_url: row.get("image_url"),
            caption: row.get("caption"),
        })
        .collect();

    Ok(items)
}

/// Point one gallery slot at a new image URL.
pub async fn update_image_url(pool: &SqlitePool, id: &str, image_url: &str) -> Result<()> {
    sqlx::query(
        "UPDATE gallery_items
         SET image_url = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(image_url)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}
