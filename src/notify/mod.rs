//! # Notifications to downstream systems.
//!
//! After a primary mutation, the saga tells downstream systems (chat card
//! refresh job, realtime clients) what happened through a [`Notifier`].
//! A notifier confirms with `Ok(true)`; `Ok(false)` and `Err(_)` are both treated
//! as failure and trigger compensation.
//!
//! ## Contents
//! - [`Notice`], [`NoticeKind`] the payload
//! - [`Notifier`] the async contract, [`NotifierRef`] the shared handle
//! - [`NotifierFn`] closure-backed notifier
//! - [`FanoutNotifier`] requires every inner notifier to confirm

mod fanout;
mod notice;
mod notifier;
mod notifier_fn;

pub use fanout::FanoutNotifier;
pub use notice::{Notice, NoticeKind};
pub use notifier::{Notifier, NotifierRef};
pub use notifier_fn::NotifierFn;
