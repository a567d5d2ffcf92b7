//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Retry / Saga ── publish(Event) ──► Bus ──► services listener
//!                                                   │
//!                                              SubscriberSet::emit
//!                                                   │
//!                                   ┌───────────────┼───────────────┐
//!                                   ▼               ▼               ▼
//!                               LogWriter   RemediationLog       Custom
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** observe and react to events (logging, metrics, alerts)
//! - **Stateful subscribers** keep state derived from events ([`RemediationLog`])
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use qnasaga::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct RevertCounter;
//!
//! #[async_trait]
//! impl Subscribe for RevertCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::ActionReverted {
//!             // increment a counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "revert-counter"
//!     }
//! }
//! ```

mod log;
mod remediation;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use remediation::{RemediationLog, RemediationRecord};
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
