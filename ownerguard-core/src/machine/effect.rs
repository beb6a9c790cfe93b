//! Effects (side effects as data).
//!
//! Effects describe what should happen as a result of a transition. They
//! are pure data; the interpreter executes them against the host API and
//! the filesystem. Mutating effects are only ever emitted from the
//! evaluation round, after every read has completed, and at most once each
//! per pass.

use std::path::PathBuf;

use crate::evaluate::Verdict;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Read the pull request context: changed files, the full review
    /// history, the acting identity and (when a scope mapping is
    /// configured) the labels. Reads run concurrently and fail fast.
    FetchContext,

    /// Walk the filesystem and build the owners map for `changed_files`.
    ResolveOwners {
        changed_files: Vec<PathBuf>,
        /// Workspace-relative scope pattern selected from the labels.
        scope_level: Option<String>,
        /// Pull request author, excluded from every owner set.
        author: String,
    },

    /// Ask the listed owners for a review. The interpreter additionally
    /// skips anyone the host already lists as a requested reviewer.
    RequestReviewers { reviewers: Vec<String> },

    /// Approve the pull request, or dismiss the bot's stale approval.
    SubmitVerdict { verdict: Verdict },

    /// Post the required-approvals report as a comment.
    PostComment { body: String },

    /// Replace the pull request body with `body` (the reviewers block has
    /// already been spliced in; emitted only when the body actually
    /// changes).
    UpdateBody { body: String },

    /// Log a message.
    Log { level: LogLevel, message: String },
}

impl Effect {
    /// True for effects that change remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Effect::RequestReviewers { .. }
                | Effect::SubmitVerdict { .. }
                | Effect::PostComment { .. }
                | Effect::UpdateBody { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}
