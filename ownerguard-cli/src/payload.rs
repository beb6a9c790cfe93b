//! Event payload parsing and classification.
//!
//! The Actions runtime hands us the webhook payload as a JSON file; these
//! are the slices of it the bot consumes, and the mapping from (event
//! name, payload) to the reconciler's triggering event.

use serde::Deserialize;

use ownerguard_core::config::OwnershipConfig;
use ownerguard_core::machine::{Event, PrSnapshot};

#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub action: Option<String>,
    pub pull_request: Option<PullRequest>,
    pub review: Option<ReviewPayload>,
    pub comment: Option<Comment>,
    pub issue: Option<Issue>,
    pub sender: Option<User>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub body: Option<String>,
    pub user: User,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReviewPayload {
    pub state: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Comment {
    pub body: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Issue {
    pub number: u64,
    pub body: Option<String>,
    pub user: User,
    /// Present when the issue is actually a pull request.
    pub pull_request: Option<PullRequestLink>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PullRequestLink {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct User {
    pub login: String,
}

/// What to do with an incoming event.
#[derive(Debug, PartialEq, Eq)]
pub enum Classification {
    /// Feed the event through the reconciler.
    Reconcile { pr_number: u64, event: Event },
    /// Nothing for the bot to do; not an error.
    Skip { reason: String },
    /// An event kind the reconciler reports as unsupported.
    Unsupported { kind: String },
}

const PR_ACTIONS: [&str; 4] = ["opened", "synchronize", "reopened", "edited"];

pub fn classify(
    event_name: &str,
    payload: &EventPayload,
    config: &OwnershipConfig,
) -> Classification {
    match event_name {
        "pull_request" => {
            let action = payload.action.as_deref().unwrap_or_default();
            if !PR_ACTIONS.contains(&action) {
                return Classification::Skip {
                    reason: format!("pull_request action {action:?} needs no reconciliation"),
                };
            }

            match &payload.pull_request {
                Some(pr) => Classification::Reconcile {
                    pr_number: pr.number,
                    event: Event::PrUpdated { pr: snapshot(pr) },
                },
                None => Classification::Skip {
                    reason: "pull_request event carries no pull request".to_string(),
                },
            }
        }

        "pull_request_review" => match (&payload.pull_request, &payload.review) {
            (Some(pr), Some(review)) => {
                let actor = payload
                    .sender
                    .as_ref()
                    .map(|sender| sender.login.clone())
                    .unwrap_or_else(|| review.user.login.clone());

                Classification::Reconcile {
                    pr_number: pr.number,
                    event: Event::ReviewSubmitted {
                        pr: snapshot(pr),
                        actor,
                        review_state: review.state.clone(),
                    },
                }
            }
            _ => Classification::Skip {
                reason: "pull_request_review event carries no review".to_string(),
            },
        },

        "issue_comment" => {
            if payload.action.as_deref() != Some("created") {
                return Classification::Skip {
                    reason: "only newly created comments can trigger a report".to_string(),
                };
            }

            match (&payload.comment, &payload.issue) {
                (Some(comment), Some(issue)) if issue.pull_request.is_some() => {
                    if config.is_trigger_comment(&comment.body) {
                        Classification::Reconcile {
                            pr_number: issue.number,
                            event: Event::TriggerCommentReceived {
                                // For comment events the issue carries the
                                // pull request's author and body.
                                pr: PrSnapshot {
                                    number: issue.number,
                                    author: issue.user.login.clone(),
                                    body: issue.body.clone(),
                                },
                            },
                        }
                    } else {
                        Classification::Skip {
                            reason: "comment does not contain the trigger phrase".to_string(),
                        }
                    }
                }
                (Some(_), Some(_)) => Classification::Skip {
                    reason: "comment is on an issue, not a pull request".to_string(),
                },
                _ => Classification::Skip {
                    reason: "comment event is missing comment or issue data".to_string(),
                },
            }
        }

        other => Classification::Unsupported {
            kind: other.to_string(),
        },
    }
}

fn snapshot(pr: &PullRequest) -> PrSnapshot {
    PrSnapshot {
        number: pr.number,
        author: pr.user.login.clone(),
        body: pr.body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn config() -> OwnershipConfig {
        OwnershipConfig::new(
            PathBuf::from("/workspace"),
            ".owners".to_string(),
            vec![],
            None,
            "/reviewers".to_string(),
            None,
        )
        .unwrap()
    }

    fn parse(payload: serde_json::Value) -> EventPayload {
        serde_json::from_value(payload).unwrap()
    }

    fn pr_payload(action: &str) -> EventPayload {
        parse(json!({
            "action": action,
            "pull_request": {
                "number": 7,
                "body": "Fixes a bug.",
                "user": { "login": "alice" }
            },
            "sender": { "login": "alice" }
        }))
    }

    #[test]
    fn test_pull_request_synchronize_reconciles() {
        let classified = classify("pull_request", &pr_payload("synchronize"), &config());

        match classified {
            Classification::Reconcile { pr_number, event } => {
                assert_eq!(pr_number, 7);
                assert!(matches!(event, Event::PrUpdated { pr } if pr.author == "alice"));
            }
            other => panic!("expected Reconcile, got {other:?}"),
        }
    }

    #[test]
    fn test_pull_request_closed_is_skipped() {
        assert!(matches!(
            classify("pull_request", &pr_payload("closed"), &config()),
            Classification::Skip { .. }
        ));
    }

    #[test]
    fn test_review_submission_uses_sender_as_actor() {
        let payload = parse(json!({
            "action": "submitted",
            "pull_request": {
                "number": 7,
                "body": null,
                "user": { "login": "alice" }
            },
            "review": {
                "state": "approved",
                "user": { "login": "carol" }
            },
            "sender": { "login": "carol" }
        }));

        match classify("pull_request_review", &payload, &config()) {
            Classification::Reconcile { event, .. } => {
                assert_eq!(
                    event,
                    Event::ReviewSubmitted {
                        pr: PrSnapshot {
                            number: 7,
                            author: "alice".to_string(),
                            body: None,
                        },
                        actor: "carol".to_string(),
                        review_state: "approved".to_string(),
                    }
                );
            }
            other => panic!("expected Reconcile, got {other:?}"),
        }
    }

    #[test]
    fn test_trigger_comment_on_pull_request_reconciles() {
        let payload = parse(json!({
            "action": "created",
            "comment": {
                "body": "/reviewers",
                "user": { "login": "carol" }
            },
            "issue": {
                "number": 7,
                "body": "Fixes a bug.",
                "user": { "login": "alice" },
                "pull_request": { "url": "https://api.github.com/repos/o/r/pulls/7" }
            }
        }));

        match classify("issue_comment", &payload, &config()) {
            Classification::Reconcile { pr_number, event } => {
                assert_eq!(pr_number, 7);
                assert!(
                    matches!(event, Event::TriggerCommentReceived { pr } if pr.author == "alice")
                );
            }
            other => panic!("expected Reconcile, got {other:?}"),
        }
    }

    #[test]
    fn test_comment_without_trigger_phrase_is_skipped() {
        let payload = parse(json!({
            "action": "created",
            "comment": {
                "body": "looks good to me",
                "user": { "login": "carol" }
            },
            "issue": {
                "number": 7,
                "body": null,
                "user": { "login": "alice" },
                "pull_request": { "url": "https://api.github.com/repos/o/r/pulls/7" }
            }
        }));

        assert!(matches!(
            classify("issue_comment", &payload, &config()),
            Classification::Skip { .. }
        ));
    }

    #[test]
    fn test_comment_on_plain_issue_is_skipped() {
        let payload = parse(json!({
            "action": "created",
            "comment": {
                "body": "/reviewers",
                "user": { "login": "carol" }
            },
            "issue": {
                "number": 7,
                "body": null,
                "user": { "login": "alice" }
            }
        }));

        assert!(matches!(
            classify("issue_comment", &payload, &config()),
            Classification::Skip { .. }
        ));
    }

    #[test]
    fn test_unknown_event_kind_is_unsupported() {
        let payload = parse(json!({ "action": "created" }));

        assert_eq!(
            classify("push", &payload, &config()),
            Classification::Unsupported {
                kind: "push".to_string(),
            }
        );
    }
}
