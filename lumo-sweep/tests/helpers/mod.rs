//! Test helper modules for lumo-sweep integration tests
//!
//! Provides reusable test infrastructure components:
//! - StubStore: in-memory media store with paging, recorded mutations, and
//!   injectable failures
//! - seed: schema setup and row insertion for the shop collections

// Shared across test binaries; each uses a subset.
#![allow(dead_code)]

pub mod seed;
pub mod store;

pub use seed::{gallery_url, memory_pool, seed_gallery, seed_order, seed_review, seed_slide, slide_url};
pub use store::{asset, store_url, StubStore, UploadedItem, BASE_URL, SPACE};
