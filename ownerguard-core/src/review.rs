//! Review events and their reduction to one decision per reviewer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Review states as reported by the host API. Only approvals, change
/// requests and dismissals affect the approval computation; comments and
/// pending reviews never change approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
}

impl ReviewState {
    pub fn is_meaningful(&self) -> bool {
        matches!(
            self,
            Self::Approved | Self::ChangesRequested | Self::Dismissed
        )
    }
}

/// One submitted review event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: u64,
    pub reviewer: String,
    pub state: ReviewState,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Reviewer identity -> their latest meaningful review.
pub type LatestReviewMap = BTreeMap<String, Review>;

/// Collapse a page-merged review history into the latest meaningful
/// decision per reviewer.
///
/// Non-meaningful events are discarded, so a reviewer who only ever
/// commented has no entry. Among a reviewer's meaningful reviews the
/// greatest submission timestamp wins; equal timestamps resolve to the
/// review seen later in the input (last-seen-wins).
pub fn latest_review_map(reviews: &[Review]) -> LatestReviewMap {
    let mut latest = LatestReviewMap::new();

    for review in reviews {
        if !review.state.is_meaningful() {
            continue;
        }

        match latest.get(&review.reviewer) {
            Some(current) if review.submitted_at < current.submitted_at => {}
            _ => {
                latest.insert(review.reviewer.clone(), review.clone());
            }
        }
    }

    latest
}
