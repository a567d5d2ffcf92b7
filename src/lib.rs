//! # qnasaga
//!
//! **qnasaga** is the action core of a chat Q&A session bot: hosts run
//! sessions, participants post and upvote questions, the host marks them
//! answered and eventually ends the session.
//!
//! Two mechanisms keep it consistent when the document store and the
//! downstream systems (chat card refresh, realtime relay) misbehave:
//!
//! - **Retry with backoff**: store calls that fail with a transient error
//!   (throttling, optimistic-concurrency conflicts) are retried under a
//!   per-operation [`RetryPolicy`].
//! - **Compensating writes**: every user action is a primary mutation plus a
//!   notification; when the notification fails, the [`Saga`] runs the inverse
//!   mutation and reports [`ActionError::Reverted`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!       bot handlers
//!            │
//!            ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  QnaController                                                   │
//! │   start_session / create_question / update_upvote /              │
//! │   mark_question_answered / end_session / leaderboard             │
//! └───────┬──────────────────────────────────────┬───────────────────┘
//!         ▼                                      ▼
//! ┌───────────────────────┐            ┌─────────────────────────┐
//! │  Saga                 │ notify ──► │  Notifier               │
//! │  primary → notify →   │            │  (NotifierFn, Fanout)   │
//! │  inverse on failure   │            └─────────────────────────┘
//! └───────┬───────────────┘
//!         ▼
//! ┌───────────────────────┐   retry    ┌─────────────────────────┐
//! │  SessionData /        │ ─────────► │  QnaStore               │
//! │  QuestionData         │  (Retry)   │  (MemoryStore, adapter) │
//! └───────────────────────┘            └─────────────────────────┘
//!
//!   Retry and Saga publish Events ──► Bus ──► listener ──► SubscriberSet
//!                                                            ├─► LogWriter
//!                                                            └─► RemediationLog
//! ```
//!
//! ### Action lifecycle
//! ```text
//! Start ──primary ok──► Mutated ──notify ok──► Committed
//!   │                      │
//!   │ primary err          └──notify failed──► Reverting ──inverse ok──► RolledBack
//!   ▼                                              │
//! error returned as is                             └──inverse err──► Inconsistent
//! (SessionInactive also sends a best-effort                          (RevertFailed)
//!  session-ended notice)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Retry**         | Fixed and exponential backoff with wait budgets.             | [`RetryPolicy`], [`Retry`], [`RetryOn`]     |
//! | **Saga**          | Primary mutation, notification, compensation.               | [`Saga`], [`ActionKind`], [`ActionState`]   |
//! | **Storage**       | Versioned documents with compare-and-swap replaces.         | [`QnaStore`], [`MemoryStore`], [`FaultyStore`] |
//! | **Notification**  | Downstream triggers treated as a black box.                 | [`Notifier`], [`NotifierFn`], [`FanoutNotifier`] |
//! | **Subscriber API**| Hook into retry and action events.                          | [`Subscribe`], [`LogWriter`], [`RemediationLog`] |
//! | **Errors**        | Typed errors with stable labels.                             | [`ActionError`], [`StoreError`]             |
//! | **Configuration** | Retry budgets and bus capacity from the environment.        | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use qnasaga::{Config, QnaServices, UserId};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let services = QnaServices::builder(Config::from_env()?).build();
//!     let ctl = services.controller();
//!
//!     let session = ctl.start_session("Weekly AMA", UserId::from("host"), "conv-1").await?;
//!     let question = ctl
//!         .create_question(session.id, UserId::from("ann"), "What ships next?")
//!         .await?;
//!     ctl.update_upvote(question.id, &UserId::from("bob"), true).await?;
//!
//!     let board = ctl.leaderboard(session.id).await?;
//!     assert_eq!(board.open[0].votes(), 1);
//!
//!     services.shutdown().await;
//!     Ok(())
//! }
//! ```

mod config;
mod controller;
mod data;
mod error;
mod events;
mod model;
mod notify;
mod policies;
mod retry;
mod saga;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use controller::{QnaController, QnaServices, QnaServicesBuilder};
pub use data::{Change, QuestionData, SessionData};
pub use error::{
    ActionError, ConfigError, NotifyError, StoreError, THROTTLE_CODE, Transient, TransientKind,
};
pub use events::{Bus, Event, EventKind};
pub use model::{Entity, Leaderboard, Question, QuestionId, Session, SessionId, UserId};
pub use notify::{FanoutNotifier, Notice, NoticeKind, Notifier, NotifierFn, NotifierRef};
pub use policies::{Backoff, JitterPolicy, RetryOn, RetryPolicy, RetrySettings};
pub use retry::{Retry, run_with_conflict_retry, run_with_retry};
pub use saga::{ActionKind, ActionState, Saga, Step};
pub use store::{DUPLICATE_KEY_CODE, FaultyStore, MemoryStore, QnaStore, StoreOp, StoreRef};
pub use subscribers::{LogWriter, RemediationLog, RemediationRecord, Subscribe, SubscriberSet};
