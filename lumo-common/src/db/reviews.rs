//! Queries for the `reviews` collection.

use crate::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Photo attachments of one review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRefs {
    pub review_id: String,
    pub photo_urls: Vec<String>,
}

/// Load the photo URLs of every review.
pub async fn load_photo_refs(pool: &SqlitePool) -> Result<Vec<ReviewRefs>> {
    let rows = sqlx::query(
        "SELECT id, photo_urls
         FROM reviews
         ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    let mut refs = Vec::with_capacity(rows.len());
    for row in &rows {
        let review_id: String = row.get("id");
        let photos_json: String = row.get("photo_urls");

        let photo_urls: Vec<String> = serde_json::from_str(&photos_json).map_err(|e| {
            Error::InvalidInput(format!(
                "review {} has malformed photo_urls JSON: {}",
                review_id, e
            ))
        })?;

        refs.push(ReviewRefs {
            review_id,
            photo_urls,
        });
    }

    Ok(refs)
}
