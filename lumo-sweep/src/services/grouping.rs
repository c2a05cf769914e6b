//! Duplicate grouping and retention policy
//!
//! `group_assets` partitions the inventory by logical key; `decide_retention`
//! picks which member of a group survives and classifies the rest. Both are
//! pure functions over values the scanners produced, so every retention rule
//! is testable without a store or a database.

use crate::identity::{parse_identity, AssetIdentity};
use lumo_common::store::RemoteAsset;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// One inventory asset with its derived identity.
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub asset: RemoteAsset,
    pub identity: AssetIdentity,
}

/// All assets sharing one logical key.
#[derive(Debug, Clone)]
pub struct AssetGroup {
    pub key: String,
    pub members: Vec<GroupMember>,
}

impl AssetGroup {
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Why a group member was classified for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemovalReason {
    /// The slot is in active use and this asset is a redundant copy beside
    /// the retained live member: either a second live member, or a newer
    /// upload that never became the recorded reference.
    DuplicateOfUsed,
    /// Nothing references this asset and the retained member supersedes it.
    Unused,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalReason::DuplicateOfUsed => f.write_str("duplicate-of-used"),
            RemovalReason::Unused => f.write_str("unused"),
        }
    }
}

/// Outcome of the retention policy for one group.
#[derive(Debug, Clone)]
pub struct RetentionDecision {
    pub retained: GroupMember,
    pub removals: Vec<(GroupMember, RemovalReason)>,
}

/// Partition inventory by logical key, in deterministic key order.
pub fn group_assets(assets: Vec<RemoteAsset>) -> Vec<AssetGroup> {
    let mut by_key: BTreeMap<String, Vec<GroupMember>> = BTreeMap::new();

    for asset in assets {
        let identity = parse_identity(&asset);
        by_key
            .entry(identity.key.clone())
            .or_default()
            .push(GroupMember { asset, identity });
    }

    by_key
        .into_iter()
        .map(|(key, members)| AssetGroup { key, members })
        .collect()
}

/// Decide which member of a group survives.
///
/// Members must be non-empty. Pure and side-effect free:
/// 1. Partition into live (remote id in `live`) and dead.
/// 2. Order each partition newest first by name-stamped version, falling
///    back to the asset's own creation time; remaining ties break by
///    creation time, then remote id, so repeated runs agree.
/// 3. If any member is live, retain the newest live one. Other live members
///    are `DuplicateOfUsed`; so are dead members newer than the retained one
///    (an upload that never became the reference). Older dead members are
///    `Unused`.
/// 4. With no live member, retain the newest overall; the rest are `Unused`.
pub fn decide_retention(members: Vec<GroupMember>, live: &HashSet<String>) -> RetentionDecision {
    debug_assert!(!members.is_empty());

    let (mut live_members, mut dead_members): (Vec<_>, Vec<_>) = members
        .into_iter()
        .partition(|m| live.contains(&m.asset.remote_id));

    sort_newest_first(&mut live_members);
    sort_newest_first(&mut dead_members);

    if live_members.is_empty() {
        let retained = dead_members.remove(0);
        let removals = dead_members
            .into_iter()
            .map(|m| (m, RemovalReason::Unused))
            .collect();
        return RetentionDecision { retained, removals };
    }

    let retained = live_members.remove(0);
    let retained_version = effective_version(&retained);

    let mut removals: Vec<(GroupMember, RemovalReason)> = live_members
        .into_iter()
        .map(|m| (m, RemovalReason::DuplicateOfUsed))
        .collect();
    for m in dead_members {
        let reason = if effective_version(&m) > retained_version {
            RemovalReason::DuplicateOfUsed
        } else {
            RemovalReason::Unused
        };
        removals.push((m, reason));
    }

    RetentionDecision { retained, removals }
}

/// Name-stamped version when the family carries one, otherwise the asset's
/// own creation time in epoch millis.
fn effective_version(member: &GroupMember) -> i64 {
    member
        .identity
        .version
        .unwrap_or_else(|| member.asset.created_at.timestamp_millis())
}

fn sort_newest_first(members: &mut [GroupMember]) {
    members.sort_by(|a, b| {
        effective_version(b)
            .cmp(&effective_version(a))
            .then_with(|| b.asset.created_at.cmp(&a.asset.created_at))
            .then_with(|| a.asset.remote_id.cmp(&b.asset.remote_id))
    });
}
