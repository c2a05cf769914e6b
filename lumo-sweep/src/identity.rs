//! Logical identity inference for stored assets
//!
//! Upload names encode which logical slot an asset serves plus the version
//! timestamp stamped at upload time. Parsing recovers the slot key, so every
//! historical re-upload of one slot lands in the same group. A name that
//! matches no convention is not an error: it gets a fallback identity keyed
//! on the asset handle itself (or a content fingerprint when even that is
//! empty), which makes the asset a singleton.

use lumo_common::store::RemoteAsset;
use sha2::{Digest, Sha256};

/// Which naming convention produced the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityFamily {
    /// `<kind>_<entity>_<slot>_<millis>`: a keyed slot on a specific entity.
    EntityScoped,
    /// `<series>_<millis>_<slot>`: a position in an ordered series. The
    /// series kind is a single segment.
    SequenceScoped,
    /// Name matched no convention; keyed on the asset itself.
    Fallback,
}

/// Logical identity of one remote asset, derived once per run and consumed
/// exhaustively by the retention policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetIdentity {
    pub family: IdentityFamily,
    /// Grouping key. All versions of one logical slot share it.
    pub key: String,
    /// Version timestamp from the name, in epoch millis; `None` for fallback
    /// identities.
    pub version: Option<i64>,
}

/// Derive the logical identity of `asset` from its trailing name segment.
///
/// Total function: every asset gets an identity, no match means fallback.
pub fn parse_identity(asset: &RemoteAsset) -> AssetIdentity {
    let name = asset.name();

    if let Some(identity) = parse_entity_scoped(name) {
        return identity;
    }
    if let Some(identity) = parse_sequence_scoped(name) {
        return identity;
    }

    AssetIdentity {
        family: IdentityFamily::Fallback,
        key: fallback_key(asset),
        version: None,
    }
}

/// `<kind>_<entity>_<slot>_<millis>`. The entity id may itself contain
/// underscores, so only the boundaries are fixed: at least four non-empty
/// segments, the last two numeric. The key drops the trailing timestamp so
/// re-uploads of one slot collide. Stamps are signed 64-bit epoch millis;
/// a numeric tail too large for that range fails the match.
fn parse_entity_scoped(name: &str) -> Option<AssetIdentity> {
    let segments: Vec<&str> = name.split('_').collect();
    if segments.len() < 4 || segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    let version: i64 = segments[segments.len() - 1].parse().ok()?;
    let _slot: u64 = segments[segments.len() - 2].parse().ok()?;

    let (key, _) = name.rsplit_once('_')?;

    Some(AssetIdentity {
        family: IdentityFamily::EntityScoped,
        key: key.to_string(),
        version: Some(version),
    })
}

/// `<series>_<millis>_<slot>`, exactly three non-empty segments with numeric
/// timestamp and slot. The key joins series and slot, dropping the timestamp.
fn parse_sequence_scoped(name: &str) -> Option<AssetIdentity> {
    let segments: Vec<&str> = name.split('_').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    let version: i64 = segments[1].parse().ok()?;
    let _slot: u64 = segments[2].parse().ok()?;

    Some(AssetIdentity {
        family: IdentityFamily::SequenceScoped,
        key: format!("{}_{}", segments[0], segments[2]),
        version: Some(version),
    })
}

/// Fallback key for an unparseable name: the remote handle when present,
/// otherwise a fingerprint of the listing metadata.
fn fallback_key(asset: &RemoteAsset) -> String {
    if !asset.remote_id.is_empty() {
        return asset.remote_id.clone();
    }

    let mut hasher = Sha256::new();
    hasher.update(asset.width.unwrap_or(0).to_le_bytes());
    hasher.update(asset.height.unwrap_or(0).to_le_bytes());
    hasher.update(asset.format.as_deref().unwrap_or("").as_bytes());
    hasher.update(asset.bytes.to_le_bytes());
    format!("{:x}", hasher.finalize())
}
