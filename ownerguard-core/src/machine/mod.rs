//! Reconciliation state machine.
//!
//! One invocation is one pass: `Idle -> Resolving -> Evaluating ->
//! Reconciled`, never persisted. The design separates:
//! - **State**: what the pass knows so far (`MachineState`)
//! - **Events**: what happened (`Event`) — the triggering host event plus
//!   the results of reads performed by the interpreter
//! - **Effects**: what to do (`Effect`)
//! - **Transition**: pure function `(Config, State, Event) -> (State, Vec<Effect>)`
//!
//! The interpreter (in the binary crate) executes effects against the host
//! API and the filesystem and feeds result events back in. Keeping the
//! transition pure means the gating rules, the self-event loop guard and
//! the idempotence of mutations are all testable without any I/O.

pub mod effect;
pub mod event;
pub mod state;
pub mod transition;

pub use effect::*;
pub use event::*;
pub use state::*;
pub use transition::*;
