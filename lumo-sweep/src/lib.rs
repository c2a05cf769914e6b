//! lumo-sweep library interface
//!
//! The reconciliation engine behind the `lumo-sweep` binary: asset identity
//! parsing, the scanners, grouping and retention, and the maintenance
//! services built on them.

pub mod error;
pub mod identity;
pub mod report;
pub mod services;

pub use crate::error::{SweepError, SweepResult};
