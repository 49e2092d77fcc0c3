// src/activity.rs
//! /activity route shape: reduce the public event stream to the latest few
//! pushes, one line per push.

use serde::Serialize;

use crate::upstream::github::PublicEvent;

pub const MAX_EVENTS: usize = 3;
pub const SHORT_HASH_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    pub hash: String,
    pub url: String,
    pub repo: String,
    pub message: String,
}

/// Keep pushes only, summarized by their first commit. The public API does
/// deliver pushes with an empty commit list (branch deletes and the like);
/// those are skipped and do not count toward the cap. Delivery order is
/// newest first already, so no sorting here.
pub fn recent_pushes(events: &[PublicEvent]) -> Vec<PushSummary> {
    events
        .iter()
        .filter(|event| event.kind == "PushEvent")
        .filter_map(|event| {
            let first = event.payload.commits.first()?;
            Some(PushSummary {
                hash: short_hash(&first.sha),
                url: event.repo.url.clone(),
                repo: event.repo.name.clone(),
                message: first.message.clone(),
            })
        })
        .take(MAX_EVENTS)
        .collect()
}

fn short_hash(sha: &str) -> String {
    sha.chars().take(SHORT_HASH_LEN).collect()
}
