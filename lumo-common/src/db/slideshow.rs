//! Queries for the `slideshow_slides` collection.

use crate::db::models::SlideshowSlide;
use crate::Result;
use sqlx::{Row, SqlitePool};

/// Load every slide, in display order.
pub async fn load_slides(pool: &SqlitePool) -> Result<Vec<SlideshowSlide>> {
    let rows = sqlx::query(
        "SELECT id, position, image_url
         FROM slideshow_slides
         ORDER BY position",
    )
    .fetch_all(pool)
    .await?;

    let slides = rows
        .iter()
        .map(|row| SlideshowSlide {
            id: row.get("id"),
            position: row.get("position"),
            image_url: row.get("image_url"),
        })
        .collect();

    Ok(slides)
}

/// Point one slide at a new image URL.
pub async fn update_image_url(pool: &SqlitePool, id: &str, image_url: &str) -> Result<()> {
    sqlx::query(
        "UPDATE slideshow_slides
         SET image_url = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(image_url)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}
