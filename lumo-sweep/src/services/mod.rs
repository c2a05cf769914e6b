//! Reconciliation engine services
//!
//! Leaves first: inventory and live-reference scanners feed the grouper and
//! retention policy; the reconciler orchestrates them in report or cleanup
//! mode. Migration (the upload boundary) and URL health verification are
//! independent maintenance paths over the same store and collections.

pub mod grouping;
pub mod inventory;
pub mod live_refs;
pub mod migration;
pub mod reconciler;
pub mod url_health;

pub use inventory::InventoryScanner;
pub use live_refs::LiveRefScanner;
pub use reconciler::Reconciler;
