//! Database access for the Lumo shop collections
//!
//! The shop stores list-shaped fields (order line items, design files,
//! review photos) as JSON-array TEXT columns; the query helpers here parse
//! them into typed rows. Schema creation is idempotent so tools and tests can
//! open a fresh file and go.

pub mod gallery;
pub mod models;
pub mod orders;
pub mod reviews;
pub mod slideshow;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the shop database and ensure the schema exists.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the reference-bearing collections if they don't exist.
///
/// `orders.design_payloads` holds inline-encoded blobs; scan queries must
/// never include it in their projections.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS gallery_items (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL,
            slot INTEGER NOT NULL,
            image_url TEXT NOT NULL,
            caption TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slideshow_slides (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            image_url TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            reference TEXT NOT NULL,
            items TEXT NOT NULL DEFAULT '[]',
            design_files TEXT NOT NULL DEFAULT '[]',
            design_payloads TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL,
            rating INTEGER NOT NULL,
            body TEXT,
            photo_urls TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Database tables initialized (gallery_items, slideshow_slides, orders, reviews)");

    Ok(())
}
