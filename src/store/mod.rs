//! # Document store contract.
//!
//! [`QnaStore`] is the persistence seam: the data-access layer talks to it
//! exclusively, so backends are pluggable ([`MemoryStore`] in-process, a
//! document database adapter in production).
//!
//! ## Failure contract
//! - Rate limiting → [`StoreError::Throttled`](crate::StoreError::Throttled)
//!   (adapters use [`StoreError::from_code`](crate::StoreError::from_code)).
//! - Stale version on replace → [`StoreError::VersionConflict`](crate::StoreError::VersionConflict).
//! - Missing documents are **not** errors here: `find_*` and `replace_*` return
//!   `Ok(None)`, `delete_question` returns `Ok(false)`.
//! - Anything else → [`StoreError::Backend`](crate::StoreError::Backend).
//!
//! ## Optimistic concurrency
//! `replace_*` is a compare-and-swap: it succeeds only if the stored version
//! equals the version of the document passed in, and stores it with the
//! version incremented by one.

mod faulty;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Question, QuestionId, Session, SessionId};

pub use faulty::{FaultyStore, StoreOp};
pub use memory::MemoryStore;

/// Error code the store uses for a duplicate `_id`.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Persistence operations for sessions and questions.
#[async_trait]
pub trait QnaStore: Send + Sync + 'static {
    // ── Sessions ──

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;
    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError>;
    /// Compare-and-swap on `data_event_version`; returns the stored document.
    async fn replace_session(&self, session: &Session) -> Result<Option<Session>, StoreError>;

    // ── Questions ──

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError>;
    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, StoreError>;
    /// Compare-and-swap on `version`; returns the stored document.
    async fn replace_question(&self, question: &Question) -> Result<Option<Question>, StoreError>;
    /// Returns `false` if the question did not exist.
    async fn delete_question(&self, id: QuestionId) -> Result<bool, StoreError>;
    async fn questions_for_session(&self, session: SessionId) -> Result<Vec<Question>, StoreError>;
}

/// Shared handle to a store.
pub type StoreRef = Arc<dyn QnaStore>;
