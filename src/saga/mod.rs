//! # Compensating write protocol.
//!
//! Every user action is a primary mutation followed by a notification to
//! downstream systems. The store and the notifier cannot share a transaction,
//! so a failed notification is answered by running the action's inverse.
//!
//! ```text
//! Saga::run(step, primary, notice, inverse)
//!   ├─► primary() ── Err(SessionInactive) ─► best-effort SessionEnded notice ─► Err
//!   │             └─ Err(other) ───────────────────────────────────────────────► Err
//!   ├─► publish MutationApplied
//!   ├─► notifier.notify(notice(&value))
//!   │     ├─ Ok(true)  ─► publish ActionCommitted ─► Ok(value)
//!   │     └─ Ok(false) / Err ─► publish NotifyFailed
//!   └─► inverse(value)
//!         ├─ Ok  ─► publish ActionReverted ─► Err(Reverted)
//!         └─ Err ─► publish RevertFailed   ─► Err(RevertFailed)   (fatal)
//! ```
//!
//! ## Pairs
//! | action            | primary            | inverse                   |
//! |-------------------|--------------------|---------------------------|
//! | `CreateQuestion`  | insert question    | delete question           |
//! | `Upvote`          | add voter          | restore prior membership  |
//! | `Downvote`        | remove voter       | restore prior membership  |
//! | `MarkAnswered`    | set answered       | restore prior flag        |
//! | `EndSession`      | deactivate session | reactivate session        |

mod action;
mod runner;

pub use action::{ActionKind, ActionState, Step};
pub use runner::Saga;
