//! URL health verification
//!
//! A recorded reference can rot independently of duplication: the URL may
//! stop resolving, or the store may no longer hold the asset behind it.
//! Verification asks both questions separately: a bounded-timeout GET on the
//! recorded URL, and a store lookup on the extracted id. A reference is
//! called healthy only when the answers agree. Disagreement is surfaced as
//! `Unknown` for manual inspection, never auto-repaired.

use crate::services::live_refs::LiveReference;
use lumo_common::store::url::{classify_reference, extract_remote_id, RefKind};
use lumo_common::store::{MediaStore, StoreError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("lumo-sweep/", env!("CARGO_PKG_VERSION"));

/// Classification of one verified reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// URL resolves and the store holds the asset.
    Healthy,
    /// Gone from the store; likely swept by a prior cleanup or deleted by
    /// hand.
    MissingRemote,
    /// The two checks disagree, or one could not complete.
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Healthy => f.write_str("healthy"),
            Verdict::MissingRemote => f.write_str("missing-remote"),
            Verdict::Unknown => f.write_str("unknown"),
        }
    }
}

/// Outcome of verifying one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlHealth {
    pub accessible: bool,
    pub in_store: bool,
    pub verdict: Verdict,
    /// Human-readable cause for non-healthy verdicts.
    pub detail: Option<String>,
}

/// Result of one reference sweep.
#[derive(Debug, Default)]
pub struct VerificationSummary {
    pub healthy: usize,
    pub missing: usize,
    pub unknown: usize,
    /// References that are not store URLs (local paths, inline payloads,
    /// foreign hosts); nothing to verify against the store.
    pub skipped: usize,
    /// Every non-healthy store reference, for the operator to inspect.
    pub findings: Vec<(LiveReference, UrlHealth)>,
}

pub struct UrlHealthVerifier {
    http: reqwest::Client,
    store: Arc<dyn MediaStore>,
}

impl UrlHealthVerifier {
    pub fn new(store: Arc<dyn MediaStore>, timeout_secs: u64) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self { http, store })
    }

    /// Verify one recorded store URL.
    pub async fn verify(&self, url: &str) -> UrlHealth {
        let probe = match self.http.get(url).send().await {
            Ok(response) => Probe::Status(response.status().as_u16()),
            Err(e) => Probe::Failed(e.to_string()),
        };

        let lookup = match extract_remote_id(url) {
            None => Lookup::NoId,
            Some(id) => match self.store.lookup(&id).await {
                Ok(_) => Lookup::Found,
                Err(StoreError::AssetNotFound(_)) => Lookup::Missing,
                Err(e) => Lookup::Failed(e.to_string()),
            },
        };

        classify_health(probe, lookup)
    }

    /// Verify every store reference in `refs`, serially; non-store
    /// references are counted as skipped.
    pub async fn verify_all(&self, refs: Vec<LiveReference>) -> VerificationSummary {
        let mut summary = VerificationSummary::default();

        for reference in refs {
            if classify_reference(&reference.url) != RefKind::RemoteStore {
                summary.skipped += 1;
                continue;
            }

            let health = self.verify(&reference.url).await;
            tracing::debug!(
                collection = %reference.collection,
                row_id = %reference.row_id,
                field = %reference.field,
                verdict = %health.verdict,
                "Verified reference"
            );

            match health.verdict {
                Verdict::Healthy => summary.healthy += 1,
                Verdict::MissingRemote => {
                    summary.missing += 1;
                    summary.findings.push((reference, health));
                }
                Verdict::Unknown => {
                    summary.unknown += 1;
                    summary.findings.push((reference, health));
                }
            }
        }

        tracing::info!(
            healthy = summary.healthy,
            missing = summary.missing,
            unknown = summary.unknown,
            skipped = summary.skipped,
            "Reference verification complete"
        );
        summary
    }
}

enum Probe {
    Status(u16),
    Failed(String),
}

enum Lookup {
    Found,
    Missing,
    NoId,
    Failed(String),
}

/// Pure verdict table over the two independent checks. Healthy and
/// missing-remote require the checks to agree; everything else is unknown.
fn classify_health(probe: Probe, lookup: Lookup) -> UrlHealth {
    let accessible = matches!(&probe, Probe::Status(s) if (200..300).contains(s));
    let in_store = matches!(&lookup, Lookup::Found);

    let (verdict, detail) = match (&probe, &lookup) {
        (Probe::Status(s), Lookup::Found) if (200..300).contains(s) => (Verdict::Healthy, None),
        (Probe::Status(s), Lookup::Missing) if !(200..300).contains(s) => (
            Verdict::MissingRemote,
            Some(format!("url returned {s} and the store has no such asset")),
        ),
        (Probe::Status(s), Lookup::Missing) => (
            Verdict::Unknown,
            Some(format!("url returned {s} but the store lookup found nothing")),
        ),
        (Probe::Status(s), Lookup::Found) => (
            Verdict::Unknown,
            Some(format!("store holds the asset but the url returned {s}")),
        ),
        (Probe::Failed(e), _) => (Verdict::Unknown, Some(format!("url probe failed: {e}"))),
        (_, Lookup::NoId) => (
            Verdict::Unknown,
            Some("store url of unrecognized shape".to_string()),
        ),
        (_, Lookup::Failed(e)) => (Verdict::Unknown, Some(format!("store lookup failed: {e}"))),
    };

    UrlHealth {
        accessible,
        in_store,
        verdict,
        detail,
    }
}
