//! Schema setup and row seeding for the shop collections

use lumo_common::db::init_tables;
use sqlx::SqlitePool;

/// Fresh in-memory shop database with the full schema.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    init_tables(&pool).await.unwrap();
    pool
}

pub async fn seed_gallery(
    pool: &SqlitePool,
    id: &str,
    product_id: &str,
    slot: i64,
    image_url: &str,
) {
    sqlx::query("INSERT INTO gallery_items (id, product_id, slot, image_url) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(product_id)
        .bind(slot)
        .bind(image_url)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_slide(pool: &SqlitePool, id: &str, position: i64, image_url: &str) {
    sqlx::query("INSERT INTO slideshow_slides (id, position, image_url) VALUES (?, ?, ?)")
        .bind(id)
        .bind(position)
        .bind(image_url)
        .execute(pool)
        .await
        .unwrap();
}

/// Insert an order; `items` and `design_files` are serialized as the JSON
/// array columns the scanners parse.
pub async fn seed_order(
    pool: &SqlitePool,
    id: &str,
    items: serde_json::Value,
    design_files: serde_json::Value,
) {
    sqlx::query("INSERT INTO orders (id, reference, items, design_files) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(format!("LU-{id}"))
        .bind(items.to_string())
        .bind(design_files.to_string())
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_review(pool: &SqlitePool, id: &str, photo_urls: serde_json::Value) {
    sqlx::query("INSERT INTO reviews (id, product_id, rating, photo_urls) VALUES (?, 'mug', 5, ?)")
        .bind(id)
        .bind(photo_urls.to_string())
        .execute(pool)
        .await
        .unwrap();
}

/// Read back one gallery row's image_url.
pub async fn gallery_url(pool: &SqlitePool, id: &str) -> String {
    sqlx::query_scalar("SELECT image_url FROM gallery_items WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Read back one slideshow row's image_url.
pub async fn slide_url(pool: &SqlitePool, id: &str) -> String {
    sqlx::query_scalar("SELECT image_url FROM slideshow_slides WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}
