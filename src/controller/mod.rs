//! # Controller: user actions over the data layer and the saga.
//!
//! [`QnaController`] is what the bot's message handlers call. [`QnaServices`]
//! wires it with a store, a notifier and event subscribers.
//!
//! ## Architecture
//! ```text
//! QnaServices::builder(cfg)
//!     .with_store(..).with_notifier(..).with_subscribers(..)
//!     .build()
//!        │
//!        ├─► Bus ──► listener ──► SubscriberSet ──► LogWriter / RemediationLog / ...
//!        │
//!        └─► QnaController
//!              ├─► Saga ──► Notifier
//!              └─► SessionData / QuestionData ──► Retry ──► QnaStore
//! ```
//!
//! ## Error surface
//! | returned error           | meaning                                               |
//! |--------------------------|-------------------------------------------------------|
//! | `Store(..)`              | store failed (transient ones after retries)           |
//! | `SessionInactive`        | session already ended, nothing changed                |
//! | `InvalidInput`           | rejected before touching the store                    |
//! | `Reverted`               | change undone after a failed notification             |
//! | `RevertFailed`           | change kept although the notification failed (fatal)  |

mod core;
mod services;

pub use self::core::QnaController;
pub use self::services::{QnaServices, QnaServicesBuilder};
