//! Member enrichment
//!
//! Resolves a group's member ids into full profile records. Lookups are
//! batched to the store's `in`-query limit and results come back in the
//! order the ids were requested, so enrichment is deterministic. A missing
//! profile is silently dropped; only a transport failure errors the fetch.

use crate::error::Result;
use crate::store::{RosterSource, IN_QUERY_LIMIT};
use crew_common::model::{Member, StudyGroup};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Fetch profile records for a list of member ids.
///
/// Ids are deduplicated before lookup (duplicates would waste whole lookup
/// batches) and results follow first-occurrence input order. Unknown ids
/// contribute no entry.
pub async fn fetch_members<S: RosterSource>(source: &S, ids: &[String]) -> Result<Vec<Member>> {
    let mut unique: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for id in ids {
        if !id.is_empty() && seen.insert(id.as_str()) {
            unique.push(id.clone());
        }
    }
    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_id: HashMap<String, Member> = HashMap::new();
    for chunk in unique.chunks(IN_QUERY_LIMIT) {
        for member in source.members_by_ids(chunk.to_vec()).await? {
            by_id.entry(member.id.clone()).or_insert(member);
        }
    }

    Ok(unique.iter().filter_map(|id| by_id.remove(id)).collect())
}

/// Enrich every group in a snapshot, one concurrent fetch per group.
///
/// A hard lookup failure is isolated to its group: that group ships with an
/// empty member list rather than poisoning the rest of the snapshot.
pub async fn enrich_snapshot<S: RosterSource>(
    source: &S,
    groups: Vec<StudyGroup>,
) -> Vec<StudyGroup> {
    let fetches = groups.into_iter().map(|mut group| async move {
        match fetch_members(source, &group.member_ids).await {
            Ok(members) => group.members = members,
            Err(e) => {
                warn!(group_id = %group.id, error = %e, "member enrichment failed");
                group.members = Vec::new();
            }
        }
        group
    });

    futures::future::join_all(fetches).await
}
