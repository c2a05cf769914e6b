//! Local-to-remote migration (the upload boundary)
//!
//! Moves legacy on-disk images into the remote store and rewrites each row's
//! reference to the canonical URL. Every upload name carries a fresh
//! epoch-millis version stamp, so re-uploading a slot can never collide with
//! or overwrite an earlier asset. The store only ever grows, and the
//! reconciler sweeps the leftovers later.
//!
//! The batch is deliberately not transactional: each row is rewritten right
//! after its own upload succeeds. A crash mid-batch leaves a mixed state
//! that is safe to re-run, because rows already pointing at the store are
//! detected and skipped.

use crate::SweepResult;
use chrono::Utc;
use lumo_common::config::MediaStoreConfig;
use lumo_common::db::{gallery, slideshow};
use lumo_common::store::url::{classify_reference, RefKind};
use lumo_common::store::{MediaStore, UploadReceipt};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Entity kind stamped into gallery upload names.
const GALLERY_KIND: &str = "product";
/// Series kind stamped into slideshow upload names.
const SLIDESHOW_SERIES: &str = "slideshow";

/// Aggregate outcome of one migration run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationSummary {
    pub migrated: usize,
    /// Rows already pointing at the store, plus inline and foreign values.
    pub skipped: usize,
    pub errors: usize,
}

pub struct MigrationService {
    store: Arc<dyn MediaStore>,
    pool: SqlitePool,
    config: MediaStoreConfig,
    /// Root the legacy local paths are relative to.
    public_dir: PathBuf,
}

impl MigrationService {
    pub fn new(
        store: Arc<dyn MediaStore>,
        pool: SqlitePool,
        config: MediaStoreConfig,
        public_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            pool,
            config,
            public_dir,
        }
    }

    /// Migrate every local gallery and slideshow reference. Per-item errors
    /// are tallied and the run continues.
    pub async fn run(&self) -> SweepResult<MigrationSummary> {
        let mut summary = MigrationSummary::default();
        self.migrate_gallery(&mut summary).await?;
        self.migrate_slideshow(&mut summary).await?;

        tracing::info!(
            migrated = summary.migrated,
            skipped = summary.skipped,
            errors = summary.errors,
            "Migration complete"
        );
        Ok(summary)
    }

    async fn migrate_gallery(&self, summary: &mut MigrationSummary) -> SweepResult<()> {
        for item in gallery::load_items(&self.pool).await? {
            if !self.wants_migration(&item.image_url, "gallery_items", &item.id) {
                summary.skipped += 1;
                continue;
            }

            let name = stamped_entity_name(
                GALLERY_KIND,
                &item.product_id,
                item.slot,
                Utc::now().timestamp_millis(),
            );
            let uploaded = self.upload_local(&item.image_url, &name).await;
            let result = match uploaded {
                Ok(receipt) => gallery::update_image_url(&self.pool, &item.id, &receipt.url)
                    .await
                    .map(|()| receipt),
                Err(e) => Err(e),
            };

            match result {
                Ok(receipt) => {
                    summary.migrated += 1;
                    tracing::info!(
                        row_id = %item.id,
                        remote_id = %receipt.remote_id,
                        "Migrated gallery image"
                    );
                }
                Err(e) => {
                    summary.errors += 1;
                    tracing::warn!(
                        row_id = %item.id,
                        image_url = %item.image_url,
                        error = %e,
                        "Gallery migration failed; continuing"
                    );
                }
            }
        }
        Ok(())
    }

    async fn migrate_slideshow(&self, summary: &mut MigrationSummary) -> SweepResult<()> {
        for slide in slideshow::load_slides(&self.pool).await? {
            if !self.wants_migration(&slide.image_url, "slideshow_slides", &slide.id) {
                summary.skipped += 1;
                continue;
            }

            let name = stamped_sequence_name(
                SLIDESHOW_SERIES,
                Utc::now().timestamp_millis(),
                slide.position,
            );
            let uploaded = self.upload_local(&slide.image_url, &name).await;
            let result = match uploaded {
                Ok(receipt) => slideshow::update_image_url(&self.pool, &slide.id, &receipt.url)
                    .await
                    .map(|()| receipt),
                Err(e) => Err(e),
            };

            match result {
                Ok(receipt) => {
                    summary.migrated += 1;
                    tracing::info!(
                        row_id = %slide.id,
                        remote_id = %receipt.remote_id,
                        "Migrated slideshow image"
                    );
                }
                Err(e) => {
                    summary.errors += 1;
                    tracing::warn!(
                        row_id = %slide.id,
                        image_url = %slide.image_url,
                        error = %e,
                        "Slideshow migration failed; continuing"
                    );
                }
            }
        }
        Ok(())
    }

    /// Only local paths are migratable. Store URLs mean the row was already
    /// migrated; inline payloads and foreign URLs have no local file to read.
    fn wants_migration(&self, url: &str, collection: &str, row_id: &str) -> bool {
        match classify_reference(url) {
            RefKind::LocalPath => true,
            RefKind::RemoteStore => {
                tracing::debug!(
                    collection = %collection,
                    row_id = %row_id,
                    "Already migrated; skipping"
                );
                false
            }
            RefKind::InlinePayload | RefKind::ExternalUrl => {
                tracing::debug!(
                    collection = %collection,
                    row_id = %row_id,
                    "No local file behind reference; skipping"
                );
                false
            }
        }
    }

    async fn upload_local(
        &self,
        local_ref: &str,
        name: &str,
    ) -> Result<UploadReceipt, lumo_common::Error> {
        let path = self.public_dir.join(local_ref.trim_start_matches('/'));
        let bytes = tokio::fs::read(&path).await?;
        let content_type = content_type_for(&bytes, &path);

        let receipt = self
            .store
            .upload(&bytes, &content_type, &self.config.folder, name)
            .await?;
        Ok(receipt)
    }
}

/// `<kind>_<entity>_<slot>_<millis>` upload name for a keyed entity slot.
pub fn stamped_entity_name(kind: &str, entity: &str, slot: i64, millis: i64) -> String {
    format!("{kind}_{entity}_{slot}_{millis}")
}

/// `<series>_<millis>_<slot>` upload name for an ordered-series slot.
pub fn stamped_sequence_name(series: &str, millis: i64, slot: i64) -> String {
    format!("{series}_{millis}_{slot}")
}

/// Sniff the upload content type from the bytes, falling back to the file
/// extension when the magic bytes say nothing.
fn content_type_for(bytes: &[u8], path: &Path) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{parse_identity, IdentityFamily};
    use async_trait::async_trait;
    use lumo_common::db::init_tables;
    use lumo_common::store::url::canonical_url;
    use lumo_common::store::{AssetPage, DeleteOutcome, RemoteAsset, StoreError};
    use std::sync::Mutex;

    fn test_config() -> MediaStoreConfig {
        MediaStoreConfig {
            base_url: "https://media.example.com".to_string(),
            space: "lumo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "shop".to_string(),
            timeout_secs: 20,
            page_size: 500,
        }
    }

    /// Records uploads and answers with canonical receipts.
    struct RecordingStore {
        uploads: Mutex<Vec<(String, String)>>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaStore for RecordingStore {
        async fn list_page(
            &self,
            _prefix: &str,
            _max_results: u32,
            _cursor: Option<&str>,
        ) -> Result<AssetPage, StoreError> {
            Ok(AssetPage {
                assets: vec![],
                next_cursor: None,
            })
        }

        async fn lookup(&self, remote_id: &str) -> Result<RemoteAsset, StoreError> {
            Err(StoreError::AssetNotFound(remote_id.to_string()))
        }

        async fn delete(&self, _remote_id: &str) -> Result<DeleteOutcome, StoreError> {
            panic!("migration must not delete");
        }

        async fn upload(
            &self,
            _content: &[u8],
            content_type: &str,
            folder: &str,
            name: &str,
        ) -> Result<UploadReceipt, StoreError> {
            self.uploads
                .lock()
                .unwrap()
                .push((name.to_string(), content_type.to_string()));

            let remote_id = format!("{folder}/{name}");
            Ok(UploadReceipt {
                url: canonical_url(
                    "https://media.example.com",
                    "lumo",
                    Utc::now().timestamp_millis(),
                    &remote_id,
                    "png",
                ),
                remote_id,
            })
        }
    }

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        init_tables(&pool).await.unwrap();
        pool
    }

    #[test]
    fn test_stamped_names_parse_back_to_their_slot() {
        let name = stamped_entity_name("product", "ABC", 0, 1700000000001);
        let asset = RemoteAsset {
            remote_id: format!("shop/{name}"),
            created_at: Utc::now(),
            width: None,
            height: None,
            format: None,
            bytes: 0,
            url: String::new(),
        };
        let identity = parse_identity(&asset);
        assert_eq!(identity.family, IdentityFamily::EntityScoped);
        assert_eq!(identity.key, "product_ABC_0");
        assert_eq!(identity.version, Some(1700000000001));

        let name = stamped_sequence_name("slideshow", 1700000000002, 3);
        let asset = RemoteAsset {
            remote_id: format!("shop/{name}"),
            created_at: Utc::now(),
            width: None,
            height: None,
            format: None,
            bytes: 0,
            url: String::new(),
        };
        let identity = parse_identity(&asset);
        assert_eq!(identity.family, IdentityFamily::SequenceScoped);
        assert_eq!(identity.key, "slideshow_3");
    }

    #[test]
    fn test_content_type_sniffs_then_falls_back() {
        // PNG magic bytes
        let png = [0x89u8, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(content_type_for(&png, Path::new("x.bin")), "image/png");

        // Unknown bytes, known extension
        assert_eq!(
            content_type_for(&[0u8; 4], Path::new("photo.JPG")),
            "image/jpeg"
        );

        // Nothing to go on
        assert_eq!(
            content_type_for(&[0u8; 4], Path::new("blob")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_migration_uploads_local_rows_and_rewrites_refs() {
        let pool = setup_test_db().await;
        let public_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(public_dir.path().join("uploads")).unwrap();
        std::fs::write(public_dir.path().join("uploads/a.png"), b"png-bytes").unwrap();
        std::fs::write(public_dir.path().join("uploads/s.png"), b"png-bytes").unwrap();

        sqlx::query(
            "INSERT INTO gallery_items (id, product_id, slot, image_url) VALUES ('g1', 'ABC', 0, '/uploads/a.png')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO gallery_items (id, product_id, slot, image_url) VALUES ('g2', 'ABC', 1, ?)",
        )
        .bind(canonical_url(
            "https://media.example.com",
            "lumo",
            1000,
            "shop/product_ABC_1_1000",
            "png",
        ))
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO slideshow_slides (id, position, image_url) VALUES ('s1', 2, '/uploads/s.png')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = Arc::new(RecordingStore::new());
        let service = MigrationService::new(
            store.clone(),
            pool.clone(),
            test_config(),
            public_dir.path().to_path_buf(),
        );

        let summary = service.run().await.unwrap();
        assert_eq!(summary.migrated, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 0);

        let uploads = store.uploads.lock().unwrap().clone();
        assert_eq!(uploads.len(), 2);
        assert!(uploads[0].0.starts_with("product_ABC_0_"));
        assert!(uploads[1].0.starts_with("slideshow_"));
        assert!(uploads[1].0.ends_with("_2"));

        // Rows now point at the store.
        let items = gallery::load_items(&pool).await.unwrap();
        assert!(items.iter().all(|i| i.image_url.contains("/media/upload/")));

        // Second run has nothing left to do.
        let again = service.run().await.unwrap();
        assert_eq!(again.migrated, 0);
        assert_eq!(again.skipped, 3);
        assert_eq!(store.uploads.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_tallied_and_run_continues() {
        let pool = setup_test_db().await;
        let public_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(public_dir.path().join("uploads")).unwrap();
        std::fs::write(public_dir.path().join("uploads/ok.png"), b"bytes").unwrap();

        sqlx::query(
            "INSERT INTO gallery_items (id, product_id, slot, image_url) VALUES ('g1', 'ABC', 0, '/uploads/gone.png')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO gallery_items (id, product_id, slot, image_url) VALUES ('g2', 'ABC', 1, '/uploads/ok.png')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = Arc::new(RecordingStore::new());
        let service = MigrationService::new(
            store.clone(),
            pool.clone(),
            test_config(),
            public_dir.path().to_path_buf(),
        );

        let summary = service.run().await.unwrap();
        assert_eq!(summary.migrated, 1);
        assert_eq!(summary.errors, 1);

        // The broken row is untouched, the good one was rewritten.
        let items = gallery::load_items(&pool).await.unwrap();
        assert_eq!(items[0].image_url, "/uploads/gone.png");
        assert!(items[1].image_url.contains("/media/upload/"));
    }
}
