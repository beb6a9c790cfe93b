//! Events that drive the reconciliation pass.
//!
//! The first four come from the host event payload; the rest are produced
//! by the interpreter as its reads complete.

use super::state::{PrSnapshot, RunContext};
use crate::owners::OwnersMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Pull request opened, synchronized, reopened or edited.
    PrUpdated { pr: PrSnapshot },

    /// A review was submitted. `review_state` is the raw payload state and
    /// is matched case-insensitively; only approvals and dismissals lead to
    /// re-evaluation.
    ReviewSubmitted {
        pr: PrSnapshot,
        actor: String,
        review_state: String,
    },

    /// A comment matched the configured trigger phrase.
    TriggerCommentReceived { pr: PrSnapshot },

    /// Any event kind the reconciler does not handle.
    UnsupportedEvent { kind: String },

    /// The top-level concurrent reads completed.
    ContextFetched { context: RunContext },

    /// Ownership resolution over the filesystem completed.
    OwnersResolved { owners: OwnersMap },

    /// All effects of the evaluation round have been applied.
    EffectsApplied,
}

impl Event {
    /// A short form for logging; avoids dumping review histories and file
    /// lists into the log.
    pub fn log_summary(&self) -> String {
        match self {
            Event::PrUpdated { pr } => format!("PrUpdated {{ pr: #{} }}", pr.number),
            Event::ReviewSubmitted {
                pr,
                actor,
                review_state,
            } => format!(
                "ReviewSubmitted {{ pr: #{}, actor: {}, state: {} }}",
                pr.number, actor, review_state
            ),
            Event::TriggerCommentReceived { pr } => {
                format!("TriggerCommentReceived {{ pr: #{} }}", pr.number)
            }
            Event::UnsupportedEvent { kind } => {
                format!("UnsupportedEvent {{ kind: {kind} }}")
            }
            Event::ContextFetched { context } => format!(
                "ContextFetched {{ files: {}, reviews: {}, actor: {} }}",
                context.changed_files.len(),
                context.reviews.len(),
                context.actor
            ),
            Event::OwnersResolved { owners } => {
                format!("OwnersResolved {{ files: {} }}", owners.len())
            }
            Event::EffectsApplied => "EffectsApplied".to_string(),
        }
    }
}
