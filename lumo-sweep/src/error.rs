//! Error types for lumo-sweep
//!
//! A run has exactly three fatal failure points: the remote store listing,
//! the collection scan, and writing the report file. Everything else (one
//! failed delete, one unparseable asset name, one ambiguous URL probe) is
//! tallied and the run continues.

use lumo_common::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    /// Remote inventory listing failed; the run aborts with the cause.
    #[error("remote store scan failed: {0}")]
    RemoteScan(#[source] StoreError),

    /// Reading the reference-bearing collections failed; the run aborts.
    #[error("collection scan failed: {0}")]
    CollectionScan(#[from] lumo_common::Error),

    /// The report could not be written where the operator asked.
    #[error("failed to write report to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SweepResult<T> = Result<T, SweepError>;
