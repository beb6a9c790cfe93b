//! State types for the reconciliation pass.

use std::fmt;
use std::path::PathBuf;

use crate::review::Review;

/// Which kind of host event started this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Pull request opened, synchronized, reopened or edited.
    PrUpdate,
    /// A review was submitted or dismissed by `actor`.
    ReviewSubmission { actor: String },
    /// A comment asked for the required-approvals report.
    TriggerComment,
}

/// Pull request facts carried by the triggering event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrSnapshot {
    pub number: u64,
    pub author: String,
    pub body: Option<String>,
}

/// Everything the top-level concurrent reads produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Changed-file paths joined against the workspace root.
    pub changed_files: Vec<PathBuf>,
    /// The complete, page-merged review history.
    pub reviews: Vec<Review>,
    /// The identity the bot acts as.
    pub actor: String,
    /// Labels on the pull request (empty when no scope mapping is
    /// configured).
    pub labels: Vec<String>,
}

/// The single-pass reconciliation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineState {
    Idle,
    /// Reads are in flight: first the pull request context, then the
    /// ownership resolution over the filesystem.
    Resolving {
        trigger: Trigger,
        pr: PrSnapshot,
        context: Option<RunContext>,
    },
    /// Evaluation is done and its side effects are being applied.
    Evaluating { can_merge: bool },
    /// Terminal; no further work happens in this pass.
    Reconciled { outcome: RunOutcome },
}

/// How the pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { can_merge: bool },
    /// The triggering review came from the bot itself (loop guard).
    SelfEventIgnored,
    /// The submitted review's state does not affect approval.
    ReviewStateIgnored { state: String },
    /// An event kind the reconciler does not handle.
    UnsupportedEvent { kind: String },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { can_merge: true } => write!(f, "completed, all approvals in place"),
            Self::Completed { can_merge: false } => write!(f, "completed, approvals outstanding"),
            Self::SelfEventIgnored => write!(f, "ignored our own review event"),
            Self::ReviewStateIgnored { state } => {
                write!(f, "ignored review with state {state:?}")
            }
            Self::UnsupportedEvent { kind } => write!(f, "unsupported event kind {kind:?}"),
        }
    }
}
