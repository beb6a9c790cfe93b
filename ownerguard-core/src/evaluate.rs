//! Approval evaluation over the owners map and the latest-review view.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::owners::OwnersMap;
use crate::review::{LatestReviewMap, ReviewState};

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Every unsatisfied changed file mapped to its declared owners. Files
    /// with no declared owners are satisfied by construction and never
    /// appear here.
    pub required_approvals: BTreeMap<PathBuf, BTreeSet<String>>,
    pub can_merge: bool,
    pub actor_has_approved: bool,
    /// Identifier of the actor's own approval, when one exists; needed to
    /// dismiss it.
    pub actor_review_id: Option<u64>,
}

/// The review-decision action to take, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Dismiss { review_id: u64 },
}

/// Classify every changed file as satisfied or pending.
///
/// A file is satisfied when it has no declared owners, or when at least one
/// declared owner's latest review is an approval. Reviewers absent from the
/// latest-review map are implicitly non-approving.
pub fn evaluate(
    owners: &OwnersMap,
    latest: &LatestReviewMap,
    changed_files: &[PathBuf],
    actor: &str,
) -> Evaluation {
    let approvers: BTreeSet<&str> = latest
        .iter()
        .filter(|(_, review)| review.state == ReviewState::Approved)
        .map(|(reviewer, _)| reviewer.as_str())
        .collect();

    let no_owners = BTreeSet::new();
    let mut required_approvals = BTreeMap::new();

    for file in changed_files {
        let file_owners = owners.get(file).unwrap_or(&no_owners);

        if file_owners.is_empty() {
            continue;
        }

        if file_owners
            .iter()
            .any(|owner| approvers.contains(owner.as_str()))
        {
            continue;
        }

        required_approvals.insert(file.clone(), file_owners.clone());
    }

    let actor_review = latest.get(actor);
    let actor_has_approved = actor_review
        .map(|review| review.state == ReviewState::Approved)
        .unwrap_or(false);

    Evaluation {
        can_merge: required_approvals.is_empty(),
        actor_has_approved,
        actor_review_id: actor_review
            .filter(|review| review.state == ReviewState::Approved)
            .map(|review| review.id),
        required_approvals,
    }
}

/// The idempotent merge-gate decision: approve only when not already
/// approved, dismiss only when an approval stands that should not.
pub fn decide(evaluation: &Evaluation) -> Option<Verdict> {
    if evaluation.can_merge && !evaluation.actor_has_approved {
        Some(Verdict::Approve)
    } else if !evaluation.can_merge && evaluation.actor_has_approved {
        evaluation
            .actor_review_id
            .map(|review_id| Verdict::Dismiss { review_id })
    } else {
        None
    }
}

/// Owners whose approval is still outstanding, across all pending files.
pub fn pending_owners(evaluation: &Evaluation) -> BTreeSet<String> {
    evaluation
        .required_approvals
        .values()
        .flatten()
        .cloned()
        .collect()
}

/// Owners that should be asked for a review: everyone owning a changed
/// file, minus anyone already involved (previous reviewers, and reviewers
/// the caller knows to be requested already).
pub fn reviewers_to_add(owners: &OwnersMap, already_involved: &BTreeSet<String>) -> Vec<String> {
    owners
        .values()
        .flatten()
        .filter(|owner| !already_involved.contains(*owner))
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{latest_review_map, Review};
    use chrono::{TimeZone, Utc};

    fn review(id: u64, reviewer: &str, state: ReviewState, seconds: i64) -> Review {
        Review {
            id,
            reviewer: reviewer.to_string(),
            state,
            submitted_at: Some(Utc.timestamp_opt(seconds, 0).unwrap()),
        }
    }

    fn owners_fixture() -> OwnersMap {
        // Mirrors declarations /.owners = [alice, bob], /app/.owners = [carol]
        // with author alice already filtered out.
        OwnersMap::from([
            (
                PathBuf::from("/app/x.js"),
                BTreeSet::from(["bob".to_string(), "carol".to_string()]),
            ),
            (PathBuf::from("/y.js"), BTreeSet::from(["bob".to_string()])),
        ])
    }

    fn changed() -> Vec<PathBuf> {
        vec![PathBuf::from("/app/x.js"), PathBuf::from("/y.js")]
    }

    #[test]
    fn test_files_without_owners_are_always_satisfied() {
        let owners = OwnersMap::from([(PathBuf::from("/x.js"), BTreeSet::new())]);
        let latest = LatestReviewMap::new();

        let evaluation = evaluate(&owners, &latest, &[PathBuf::from("/x.js")], "bot");

        assert!(evaluation.required_approvals.is_empty());
        assert!(evaluation.can_merge);
    }

    #[test]
    fn test_one_approving_owner_satisfies_a_file() {
        let owners = owners_fixture();
        let latest = latest_review_map(&[review(1, "bob", ReviewState::Approved, 100)]);

        let evaluation = evaluate(&owners, &latest, &changed(), "bot");

        // Bob's approval covers both files he owns; carol has not approved
        // and is the only remaining owner of /app/x.js... except bob also
        // owns it, so everything is satisfied.
        assert!(evaluation.can_merge);
    }

    #[test]
    fn test_gating_example_from_union_fixture() {
        // Same fixture, but only carol can satisfy /app/x.js once bob's
        // approval is constrained to /y.js ownership.
        let owners = OwnersMap::from([
            (
                PathBuf::from("/app/x.js"),
                BTreeSet::from(["carol".to_string()]),
            ),
            (PathBuf::from("/y.js"), BTreeSet::from(["bob".to_string()])),
        ]);
        let latest = latest_review_map(&[review(1, "bob", ReviewState::Approved, 100)]);

        let evaluation = evaluate(&owners, &latest, &changed(), "bot");

        assert_eq!(
            evaluation.required_approvals,
            BTreeMap::from([(
                PathBuf::from("/app/x.js"),
                BTreeSet::from(["carol".to_string()])
            )])
        );
        assert!(!evaluation.can_merge);
    }

    #[test]
    fn test_dismissed_approval_no_longer_satisfies() {
        let owners = owners_fixture();
        let latest = latest_review_map(&[
            review(1, "bob", ReviewState::Approved, 100),
            review(2, "bob", ReviewState::Dismissed, 200),
        ]);

        let evaluation = evaluate(&owners, &latest, &changed(), "bot");
        assert!(!evaluation.can_merge);
    }

    #[test]
    fn test_actor_approval_status_and_review_id() {
        let owners = owners_fixture();
        let latest = latest_review_map(&[
            review(7, "bot", ReviewState::Approved, 100),
            review(1, "bob", ReviewState::Approved, 100),
        ]);

        let evaluation = evaluate(&owners, &latest, &changed(), "bot");
        assert!(evaluation.actor_has_approved);
        assert_eq!(evaluation.actor_review_id, Some(7));
    }

    #[test]
    fn test_decide_approves_when_mergeable_and_not_yet_approved() {
        let evaluation = Evaluation {
            required_approvals: BTreeMap::new(),
            can_merge: true,
            actor_has_approved: false,
            actor_review_id: None,
        };
        assert_eq!(decide(&evaluation), Some(Verdict::Approve));
    }

    #[test]
    fn test_decide_dismisses_stale_approval() {
        let evaluation = Evaluation {
            required_approvals: BTreeMap::from([(
                PathBuf::from("/app/x.js"),
                BTreeSet::from(["carol".to_string()]),
            )]),
            can_merge: false,
            actor_has_approved: true,
            actor_review_id: Some(7),
        };
        assert_eq!(decide(&evaluation), Some(Verdict::Dismiss { review_id: 7 }));
    }

    #[test]
    fn test_decide_is_idempotent_in_both_directions() {
        let approved_and_mergeable = Evaluation {
            required_approvals: BTreeMap::new(),
            can_merge: true,
            actor_has_approved: true,
            actor_review_id: Some(7),
        };
        assert_eq!(decide(&approved_and_mergeable), None);

        let pending_and_not_approved = Evaluation {
            required_approvals: BTreeMap::from([(
                PathBuf::from("/app/x.js"),
                BTreeSet::from(["carol".to_string()]),
            )]),
            can_merge: false,
            actor_has_approved: false,
            actor_review_id: None,
        };
        assert_eq!(decide(&pending_and_not_approved), None);
    }

    #[test]
    fn test_pending_owners_unions_required_files() {
        let evaluation = Evaluation {
            required_approvals: BTreeMap::from([
                (
                    PathBuf::from("/app/x.js"),
                    BTreeSet::from(["carol".to_string(), "bob".to_string()]),
                ),
                (PathBuf::from("/y.js"), BTreeSet::from(["bob".to_string()])),
            ]),
            can_merge: false,
            actor_has_approved: false,
            actor_review_id: None,
        };

        assert_eq!(
            pending_owners(&evaluation),
            BTreeSet::from(["bob".to_string(), "carol".to_string()])
        );
    }

    #[test]
    fn test_reviewers_to_add_skips_already_involved() {
        let owners = owners_fixture();
        let involved = BTreeSet::from(["bob".to_string()]);

        assert_eq!(reviewers_to_add(&owners, &involved), vec!["carol".to_string()]);
    }

    #[test]
    fn test_reviewers_to_add_empty_when_everyone_is_involved() {
        let owners = owners_fixture();
        let involved = BTreeSet::from(["bob".to_string(), "carol".to_string()]);

        assert!(reviewers_to_add(&owners, &involved).is_empty());
    }
}
