//! # Function-backed notifier (`NotifierFn`)
//!
//! [`NotifierFn`] wraps a closure `F: Fn(Notice) -> Fut`, producing a fresh
//! future per notification. Shared state goes through an explicit `Arc<...>`
//! captured by the closure.
//!
//! ## Example
//! ```rust
//! use qnasaga::{Notice, Notifier, NotifierFn, NotifierRef, NotifyError};
//!
//! let n: NotifierRef = NotifierFn::arc("realtime", |notice: Notice| async move {
//!     let _ = notice;
//!     Ok::<_, NotifyError>(true)
//! });
//!
//! assert_eq!(n.name(), "realtime");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::notify::{Notice, Notifier};

/// Function-backed notifier.
#[derive(Debug)]
pub struct NotifierFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> NotifierFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the notifier and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Notifier for NotifierFn<F>
where
    F: Fn(Notice) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, NotifyError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, notice: &Notice) -> Result<bool, NotifyError> {
        (self.f)(notice.clone()).await
    }
}
