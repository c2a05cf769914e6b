//! # Lumo Common Library
//!
//! Shared code for the Lumo media tooling:
//! - Database pool, schema and collection queries
//! - Remote media-store client and asset types
//! - Reference URL vocabulary (classification, id extraction)
//! - Configuration loading
//! - Error types

pub mod config;
pub mod db;
pub mod error;
pub mod store;

pub use error::{Error, Result};
