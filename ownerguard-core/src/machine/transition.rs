//! Pure state transition function.
//!
//! Takes the current state and an event, returns the new state and the
//! effects to execute. No side effects happen here; the evaluation round
//! in particular decides every mutation purely from the fetched context,
//! which is what makes the idempotence guarantees testable.

use std::collections::BTreeSet;

use super::effect::{Effect, LogLevel};
use super::event::Event;
use super::state::{MachineState, PrSnapshot, RunContext, RunOutcome, Trigger};
use crate::config::OwnershipConfig;
use crate::owners::{self, OwnersMap};
use crate::review::latest_review_map;
use crate::{evaluate, render, scope};

/// Review payload states that lead to re-evaluation, matched
/// case-insensitively.
const REEVALUATING_REVIEW_STATES: [&str; 2] = ["approved", "dismissed"];

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub state: MachineState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: MachineState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    pub fn no_change(state: MachineState) -> Self {
        Self {
            state,
            effects: vec![],
        }
    }
}

/// Pure state transition function.
pub fn transition(config: &OwnershipConfig, state: MachineState, event: Event) -> TransitionResult {
    match state {
        MachineState::Idle => idle(event),
        MachineState::Resolving {
            trigger,
            pr,
            context,
        } => resolving(config, trigger, pr, context, event),
        MachineState::Evaluating { can_merge } => evaluating(can_merge, event),
        MachineState::Reconciled { .. } => TransitionResult::no_change(state),
    }
}

fn idle(event: Event) -> TransitionResult {
    match event {
        Event::PrUpdated { pr } => start_resolving(Trigger::PrUpdate, pr),

        Event::ReviewSubmitted {
            pr,
            actor,
            review_state,
        } => {
            let normalized = review_state.to_ascii_lowercase();
            if REEVALUATING_REVIEW_STATES.contains(&normalized.as_str()) {
                start_resolving(Trigger::ReviewSubmission { actor }, pr)
            } else {
                TransitionResult::new(
                    MachineState::Reconciled {
                        outcome: RunOutcome::ReviewStateIgnored {
                            state: review_state.clone(),
                        },
                    },
                    vec![Effect::Log {
                        level: LogLevel::Info,
                        message: format!(
                            "review state {review_state:?} does not affect approvals, nothing to do"
                        ),
                    }],
                )
            }
        }

        Event::TriggerCommentReceived { pr } => start_resolving(Trigger::TriggerComment, pr),

        Event::UnsupportedEvent { kind } => TransitionResult::new(
            MachineState::Reconciled {
                outcome: RunOutcome::UnsupportedEvent { kind: kind.clone() },
            },
            vec![Effect::Log {
                level: LogLevel::Warn,
                message: format!(
                    "only pull request, review and trigger comment events are handled, got {kind:?}"
                ),
            }],
        ),

        other => unexpected(MachineState::Idle, &other),
    }
}

fn start_resolving(trigger: Trigger, pr: PrSnapshot) -> TransitionResult {
    TransitionResult::new(
        MachineState::Resolving {
            trigger,
            pr,
            context: None,
        },
        vec![Effect::FetchContext],
    )
}

fn resolving(
    config: &OwnershipConfig,
    trigger: Trigger,
    pr: PrSnapshot,
    context: Option<RunContext>,
    event: Event,
) -> TransitionResult {
    match event {
        Event::ContextFetched { context } => {
            // Loop guard: never react to the bot's own approve/dismiss
            // calls coming back as review events.
            if let Trigger::ReviewSubmission { actor } = &trigger {
                if *actor == context.actor {
                    return TransitionResult::new(
                        MachineState::Reconciled {
                            outcome: RunOutcome::SelfEventIgnored,
                        },
                        vec![Effect::Log {
                            level: LogLevel::Info,
                            message: "review was submitted by this bot, not re-evaluating"
                                .to_string(),
                        }],
                    );
                }
            }

            let RunContext {
                changed_files,
                reviews,
                actor,
                labels,
            } = context;

            let changed_files = owners::filter_ignored(changed_files, &config.ignore_filenames);
            let scope_level = config
                .label_scopes
                .as_ref()
                .and_then(|mapping| scope::select_scope_level(&labels, mapping));

            let effect = Effect::ResolveOwners {
                changed_files: changed_files.clone(),
                scope_level,
                author: pr.author.clone(),
            };

            TransitionResult::new(
                MachineState::Resolving {
                    trigger,
                    pr,
                    context: Some(RunContext {
                        changed_files,
                        reviews,
                        actor,
                        labels,
                    }),
                },
                vec![effect],
            )
        }

        Event::OwnersResolved { owners } => {
            let Some(context) = context else {
                return unexpected(
                    MachineState::Resolving {
                        trigger,
                        pr,
                        context: None,
                    },
                    &Event::OwnersResolved { owners },
                );
            };
            evaluation_round(config, &trigger, &pr, &context, &owners)
        }

        other => unexpected(
            MachineState::Resolving {
                trigger,
                pr,
                context,
            },
            &other,
        ),
    }
}

/// The evaluation round: reduce the review history, classify files,
/// and decide every mutation for this pass.
fn evaluation_round(
    config: &OwnershipConfig,
    trigger: &Trigger,
    pr: &PrSnapshot,
    context: &RunContext,
    owners: &OwnersMap,
) -> TransitionResult {
    let latest = latest_review_map(&context.reviews);
    let evaluation = evaluate::evaluate(owners, &latest, &context.changed_files, &context.actor);
    let details =
        render::required_approvals_comment(&evaluation.required_approvals, &config.workspace_root);

    let mut effects = Vec::new();

    if !evaluation.can_merge {
        effects.push(Effect::Log {
            level: LogLevel::Warn,
            message: format!(
                "approval is still required for {} files",
                evaluation.required_approvals.len()
            ),
        });
    }

    match trigger {
        Trigger::PrUpdate => {
            let already_involved: BTreeSet<String> = context
                .reviews
                .iter()
                .map(|review| review.reviewer.clone())
                .collect();
            let to_request = evaluate::reviewers_to_add(owners, &already_involved);
            if !to_request.is_empty() {
                effects.push(Effect::RequestReviewers {
                    reviewers: to_request,
                });
            }

            let pending = evaluate::pending_owners(&evaluation);
            if let Some(body) = render::updated_body(pr.body.as_deref(), &pending, &details) {
                effects.push(Effect::UpdateBody { body });
            }
        }
        Trigger::ReviewSubmission { .. } => {}
        Trigger::TriggerComment => {
            effects.push(Effect::PostComment {
                body: details.clone(),
            });
        }
    }

    if let Some(verdict) = evaluate::decide(&evaluation) {
        effects.push(Effect::SubmitVerdict { verdict });
    }

    TransitionResult::new(
        MachineState::Evaluating {
            can_merge: evaluation.can_merge,
        },
        effects,
    )
}

fn evaluating(can_merge: bool, event: Event) -> TransitionResult {
    match event {
        Event::EffectsApplied => TransitionResult::no_change(MachineState::Reconciled {
            outcome: RunOutcome::Completed { can_merge },
        }),
        other => unexpected(MachineState::Evaluating { can_merge }, &other),
    }
}

fn unexpected(state: MachineState, event: &Event) -> TransitionResult {
    let message = format!("unexpected event {} in this state", event.log_summary());
    TransitionResult::new(
        state,
        vec![Effect::Log {
            level: LogLevel::Warn,
            message,
        }],
    )
}
