//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the retry runner, the saga and the
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `retry::Retry`, `saga::Saga`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `QnaServicesBuilder::build` (fans out to
//!   `SubscriberSet`), and any receiver obtained with [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
