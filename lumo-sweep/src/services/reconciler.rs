//! Two-phase reconciliation orchestrator
//!
//! One run walks a fixed sequence: scan remote → scan live → group →
//! classify → report or clean. Nothing is persisted between runs; every run
//! recomputes from scratch, which is what makes report runs idempotent and
//! safe to repeat. Cleanup issues deletes strictly serially with a fixed
//! inter-call delay; one failed delete is tallied and the run continues.

use crate::report::{DuplicateGroup, ReconciliationReport, RemovalCandidate};
use crate::services::grouping::{decide_retention, group_assets};
use crate::services::inventory::InventoryScanner;
use crate::services::live_refs::LiveRefScanner;
use crate::SweepResult;
use lumo_common::store::{DeleteOutcome, MediaStore, RemoteAsset};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Inter-delete delay applied when the operator configures none.
pub const DEFAULT_DELETE_DELAY_MS: u64 = 500;

/// Aggregate outcome of a cleanup run. Emitted even when individual deletes
/// fail; `kept` counts the retained asset of each duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupSummary {
    pub deleted: usize,
    pub kept: usize,
    pub errors: usize,
}

pub struct Reconciler {
    store: Arc<dyn MediaStore>,
    pool: SqlitePool,
    folder: String,
    page_size: u32,
    delete_delay: Duration,
    /// Correlates every log line of one run.
    run_id: Uuid,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn MediaStore>,
        pool: SqlitePool,
        folder: String,
        page_size: u32,
        delete_delay: Duration,
    ) -> Self {
        Self {
            store,
            pool,
            folder,
            page_size,
            delete_delay,
            run_id: Uuid::new_v4(),
        }
    }

    /// Report mode: classify and return. Never mutates store or database.
    pub async fn report(&self) -> SweepResult<ReconciliationReport> {
        self.classify().await
    }

    /// Cleanup mode: classify, then serially delete every removal candidate
    /// with the configured delay between calls. Retained members and unused
    /// singletons are never touched.
    pub async fn cleanup(&self) -> SweepResult<(ReconciliationReport, CleanupSummary)> {
        let report = self.classify().await?;

        let mut deleted = 0usize;
        let mut errors = 0usize;
        let kept = report.groups.len();
        let mut issued = 0usize;

        for group in &report.groups {
            for candidate in &group.removals {
                if issued > 0 {
                    tokio::time::sleep(self.delete_delay).await;
                }
                issued += 1;

                match self.store.delete(&candidate.asset.remote_id).await {
                    Ok(DeleteOutcome::Deleted) => {
                        deleted += 1;
                        tracing::debug!(
                            run_id = %self.run_id,
                            remote_id = %candidate.asset.remote_id,
                            reason = %candidate.reason,
                            "Deleted asset"
                        );
                    }
                    Ok(DeleteOutcome::NotFound) => {
                        // Idempotent case: the asset is gone either way.
                        deleted += 1;
                        tracing::debug!(
                            run_id = %self.run_id,
                            remote_id = %candidate.asset.remote_id,
                            "Asset already absent"
                        );
                    }
                    Err(e) => {
                        errors += 1;
                        tracing::warn!(
                            run_id = %self.run_id,
                            remote_id = %candidate.asset.remote_id,
                            error = %e,
                            "Delete failed; continuing"
                        );
                    }
                }
            }
        }

        let summary = CleanupSummary {
            deleted,
            kept,
            errors,
        };
        tracing::info!(
            run_id = %self.run_id,
            deleted = summary.deleted,
            kept = summary.kept,
            errors = summary.errors,
            "Cleanup complete"
        );

        Ok((report, summary))
    }

    /// Shared classification pass: scan remote → scan live → group → classify.
    async fn classify(&self) -> SweepResult<ReconciliationReport> {
        tracing::info!(
            run_id = %self.run_id,
            folder = %self.folder,
            "Reconciliation scan starting"
        );

        let assets = InventoryScanner::new(self.store.clone(), self.page_size)
            .scan(&self.folder)
            .await?;
        let live = LiveRefScanner::new(self.pool.clone()).scan_live().await?;

        let total_remote = assets.len();
        let total_live = live.len();

        let mut groups = Vec::new();
        let mut unused_singletons = Vec::new();

        for group in group_assets(assets) {
            if group.is_singleton() {
                let member = &group.members[0];
                if !live.contains(&member.asset.remote_id) {
                    unused_singletons.push(member.asset.clone());
                }
                continue;
            }

            let key = group.key.clone();
            let members: Vec<RemoteAsset> =
                group.members.iter().map(|m| m.asset.clone()).collect();
            let decision = decide_retention(group.members, &live);

            groups.push(DuplicateGroup {
                key,
                members,
                retained: decision.retained.asset,
                removals: decision
                    .removals
                    .into_iter()
                    .map(|(member, reason)| RemovalCandidate {
                        asset: member.asset,
                        reason,
                    })
                    .collect(),
            });
        }

        let report = ReconciliationReport {
            total_remote,
            total_live,
            groups,
            unused_singletons,
        };
        tracing::info!(
            run_id = %self.run_id,
            remote = report.total_remote,
            live = report.total_live,
            groups = report.groups.len(),
            candidates = report.candidate_count(),
            singletons = report.unused_singletons.len(),
            "Classification complete"
        );

        Ok(report)
    }
}
