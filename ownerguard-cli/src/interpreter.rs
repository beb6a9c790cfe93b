//! Effect interpreter.
//!
//! The boundary between the pure reconciliation machine and the impure
//! world: effects are executed against the GitHub API and the checked-out
//! workspace, and their results are fed back in as events until the
//! machine reaches its terminal state. Read failures and failed mutating
//! calls abort the run; per-declaration read failures are tolerated inside
//! the owners-map builder.

use std::collections::{BTreeSet, VecDeque};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use ownerguard_core::config::OwnershipConfig;
use ownerguard_core::evaluate::Verdict;
use ownerguard_core::machine::{
    transition, Effect, Event, LogLevel, MachineState, RunContext, RunOutcome,
};
use ownerguard_core::owners::build_owners_map;
use ownerguard_core::scope::ScopeMatcher;

use crate::config::Config;
use crate::github::GitHubClient;

/// Message attached to a dismissed stale approval.
const DISMISSAL_MESSAGE: &str = "No sufficient approvals";

/// Everything the interpreter needs to execute effects.
pub struct ReconcilerContext<'a> {
    pub client: &'a GitHubClient,
    pub config: &'a Config,
    pub pr_number: u64,
}

/// Drive one reconciliation pass from the triggering event to completion.
pub async fn run(ctx: &ReconcilerContext<'_>, initial: Event) -> Result<RunOutcome> {
    let mut state = MachineState::Idle;
    let mut queue = VecDeque::from([initial]);

    while let Some(event) = queue.pop_front() {
        info!("Processing event: {}", event.log_summary());

        let result = transition(&ctx.config.ownership, state, event);
        state = result.state;

        for effect in result.effects {
            queue.extend(execute_effect(ctx, effect).await?);
        }

        // Mutating effects produce no events; once the evaluation round's
        // effects have all been applied, tell the machine so.
        if matches!(state, MachineState::Evaluating { .. }) && queue.is_empty() {
            queue.push_back(Event::EffectsApplied);
        }
    }

    match state {
        MachineState::Reconciled { outcome } => Ok(outcome),
        other => Err(anyhow!(
            "reconciliation stopped before completion in state {other:?}"
        )),
    }
}

async fn execute_effect(ctx: &ReconcilerContext<'_>, effect: Effect) -> Result<Vec<Event>> {
    match effect {
        Effect::FetchContext => {
            let context = fetch_context(ctx)
                .await
                .context("resolution failed: could not read pull request context")?;
            Ok(vec![Event::ContextFetched { context }])
        }

        Effect::ResolveOwners {
            changed_files,
            scope_level,
            author,
        } => {
            let ownership = &ctx.config.ownership;
            let scope = compile_scope(ownership, scope_level.as_deref());

            let owners = build_owners_map(
                &changed_files,
                &ownership.declaration_filename,
                scope.as_ref(),
                ownership.override_path.as_deref(),
                &author,
            )
            .await
            .context("resolution failed: could not build the owners map")?;

            Ok(vec![Event::OwnersResolved { owners }])
        }

        Effect::RequestReviewers { reviewers } => {
            // Check remote state first so a re-delivered event never asks
            // the same reviewer twice.
            let already_requested: BTreeSet<String> = ctx
                .client
                .requested_reviewers(&ctx.config.repo_owner, &ctx.config.repo_name, ctx.pr_number)
                .await
                .context("side effect failed: could not list requested reviewers")?
                .into_iter()
                .collect();

            let to_request: Vec<String> = reviewers
                .into_iter()
                .filter(|reviewer| !already_requested.contains(reviewer))
                .collect();

            if to_request.is_empty() {
                info!("All owners already have a review requested");
            } else {
                ctx.client
                    .request_reviewers(
                        &ctx.config.repo_owner,
                        &ctx.config.repo_name,
                        ctx.pr_number,
                        &to_request,
                    )
                    .await
                    .context("side effect failed: could not request reviewers")?;
            }

            Ok(vec![])
        }

        Effect::SubmitVerdict { verdict } => {
            match verdict {
                Verdict::Approve => ctx
                    .client
                    .approve(&ctx.config.repo_owner, &ctx.config.repo_name, ctx.pr_number)
                    .await
                    .context("side effect failed: could not approve the pull request")?,
                Verdict::Dismiss { review_id } => ctx
                    .client
                    .dismiss_review(
                        &ctx.config.repo_owner,
                        &ctx.config.repo_name,
                        ctx.pr_number,
                        review_id,
                        DISMISSAL_MESSAGE,
                    )
                    .await
                    .context("side effect failed: could not dismiss the stale approval")?,
            }
            Ok(vec![])
        }

        Effect::PostComment { body } => {
            ctx.client
                .post_comment(
                    &ctx.config.repo_owner,
                    &ctx.config.repo_name,
                    ctx.pr_number,
                    &body,
                )
                .await
                .context("side effect failed: could not post the report comment")?;
            Ok(vec![])
        }

        Effect::UpdateBody { body } => {
            ctx.client
                .update_pr_body(
                    &ctx.config.repo_owner,
                    &ctx.config.repo_name,
                    ctx.pr_number,
                    &body,
                )
                .await
                .context("side effect failed: could not update the pull request body")?;
            Ok(vec![])
        }

        Effect::Log { level, message } => {
            match level {
                LogLevel::Info => info!("{message}"),
                LogLevel::Warn => warn!("{message}"),
            }
            Ok(vec![])
        }
    }
}

/// The top-level reads: changed files, the page-merged review history, the
/// acting identity and (only when a scope mapping is configured) the
/// labels. They run concurrently and fail fast; each branch owns its own
/// result, so the join below is the only synchronization point.
async fn fetch_context(ctx: &ReconcilerContext<'_>) -> Result<RunContext> {
    let config = ctx.config;
    let client = ctx.client;

    let labels_needed = config.ownership.label_scopes.is_some();

    let (changed, reviews, actor, labels) = tokio::try_join!(
        client.changed_files(&config.repo_owner, &config.repo_name, ctx.pr_number),
        client.reviews(&config.repo_owner, &config.repo_name, ctx.pr_number),
        client.authenticated_login(),
        async {
            if labels_needed {
                client
                    .labels(&config.repo_owner, &config.repo_name, ctx.pr_number)
                    .await
            } else {
                Ok(Vec::new())
            }
        },
    )?;

    let changed_files = changed
        .iter()
        .map(|file| config.ownership.workspace_root.join(file))
        .collect();

    Ok(RunContext {
        changed_files,
        reviews,
        actor,
        labels,
    })
}

/// A scope that fails to compile falls back to unrestricted ascent; the
/// mapping came from configuration and must not sink the run.
fn compile_scope(ownership: &OwnershipConfig, level: Option<&str>) -> Option<ScopeMatcher> {
    let level = level?;
    match ScopeMatcher::compile(&ownership.workspace_root, level) {
        Ok(matcher) => Some(matcher),
        Err(err) => {
            warn!("scope pattern {level:?} could not be compiled, ascending unrestricted: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn ownership() -> OwnershipConfig {
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

    #[test]
    fn test_compile_scope_none_level() {
        assert!(compile_scope(&ownership(), None).is_none());
    }

    #[test]
    fn test_compile_scope_valid_level() {
        let matcher = compile_scope(&ownership(), Some("app/**")).unwrap();
        assert!(matcher.is_match(Path::new("/workspace/app/.owners")));
    }
}
