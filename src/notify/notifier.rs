use std::sync::Arc;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::notify::Notice;

/// # Downstream notification trigger.
///
/// Treated as a black box by the saga: it is never retried here, and
/// both `Ok(false)` and `Err(_)` count as a failed notification.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use qnasaga::{Notice, Notifier, NotifyError};
///
/// struct CardRefresh;
///
/// #[async_trait]
/// impl Notifier for CardRefresh {
///     fn name(&self) -> &str { "card-refresh" }
///
///     async fn notify(&self, notice: &Notice) -> Result<bool, NotifyError> {
///         // enqueue a refresh job for notice.session ...
///         let _ = notice;
///         Ok(true)
///     }
/// }
/// ```
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Stable, human-readable name.
    fn name(&self) -> &str {
        "notifier"
    }

    /// Triggers downstream work for `notice`; `Ok(true)` confirms it was accepted.
    async fn notify(&self, notice: &Notice) -> Result<bool, NotifyError>;
}

/// Shared handle to a notifier.
pub type NotifierRef = Arc<dyn Notifier>;
