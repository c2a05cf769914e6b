//! Reconciliation report
//!
//! The report is the whole output of a read-only run and the input an
//! operator reviews before running cleanup. Two renderings: a line-oriented
//! listing for the terminal, and a flat JSON candidate list that serves as
//! the secondary safety gate before any destructive action taken outside
//! this tool.

use crate::services::grouping::RemovalReason;
use lumo_common::store::RemoteAsset;
use serde::Serialize;
use std::fmt::Write as _;

/// One removal candidate inside a duplicate group.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalCandidate {
    pub asset: RemoteAsset,
    pub reason: RemovalReason,
}

/// One logical slot with more than one stored asset.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub key: String,
    pub members: Vec<RemoteAsset>,
    pub retained: RemoteAsset,
    pub removals: Vec<RemovalCandidate>,
}

/// Result of one classification pass. Derived fresh each run, so two runs
/// over unchanged state compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationReport {
    pub total_remote: usize,
    pub total_live: usize,
    /// Duplicate groups only (two or more members), in key order.
    pub groups: Vec<DuplicateGroup>,
    /// Unreferenced assets with no duplicate to fall back on. Reported for
    /// manual review, never auto-deleted.
    pub unused_singletons: Vec<RemoteAsset>,
}

/// Machine-readable removal row for the JSON report file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatCandidate {
    pub remote_id: String,
    pub reason: RemovalReason,
    pub group_key: String,
}

impl ReconciliationReport {
    /// Total removal candidates across all groups.
    pub fn candidate_count(&self) -> usize {
        self.groups.iter().map(|g| g.removals.len()).sum()
    }

    /// Flatten every removal candidate, in group order.
    pub fn flat_candidates(&self) -> Vec<FlatCandidate> {
        self.groups
            .iter()
            .flat_map(|group| {
                group.removals.iter().map(|candidate| FlatCandidate {
                    remote_id: candidate.asset.remote_id.clone(),
                    reason: candidate.reason,
                    group_key: group.key.clone(),
                })
            })
            .collect()
    }

    /// Line-oriented listing for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "Reconciliation report: {} remote assets, {} live references",
            self.total_remote, self.total_live
        );
        let _ = writeln!(
            out,
            "Duplicate groups: {} ({} removal candidates)",
            self.groups.len(),
            self.candidate_count()
        );

        for group in &self.groups {
            let _ = writeln!(out);
            let _ = writeln!(out, "group {} ({} members)", group.key, group.members.len());
            let _ = writeln!(out, "  keep   {}", group.retained.remote_id);
            for candidate in &group.removals {
                let _ = writeln!(
                    out,
                    "  delete {}  {}",
                    candidate.asset.remote_id, candidate.reason
                );
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Unused singletons (manual review, never auto-deleted): {}",
            self.unused_singletons.len()
        );
        for asset in &self.unused_singletons {
            let _ = writeln!(out, "  {}", asset.remote_id);
        }

        out
    }
}
