//! # Fault-injecting store wrapper.
//!
//! [`FaultyStore`] wraps any [`QnaStore`] and fails scripted calls before they
//! reach the inner store. Used by tests and failure drills to reproduce
//! throttling, version conflicts and backend outages deterministically.
//!
//! ```text
//! call(op) ─► faults[op].pop_front()
//!               ├─ Some(err) ─► Err(err)        (inner store untouched)
//!               └─ None      ─► inner.call(op)
//! ```
//!
//! # Example
//! ```
//! use qnasaga::{FaultyStore, MemoryStore, StoreError, StoreOp};
//!
//! let store = FaultyStore::new(MemoryStore::new());
//! store.fail_times(StoreOp::InsertQuestion, 2, StoreError::throttled());
//! assert_eq!(store.pending(StoreOp::InsertQuestion), 2);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Question, QuestionId, Session, SessionId};
use crate::store::QnaStore;

/// Store operations that faults can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertSession,
    FindSession,
    ReplaceSession,
    InsertQuestion,
    FindQuestion,
    ReplaceQuestion,
    DeleteQuestion,
    QuestionsForSession,
}

#[derive(Default)]
struct Script {
    faults: HashMap<StoreOp, VecDeque<StoreError>>,
    calls: HashMap<StoreOp, u32>,
}

/// [`QnaStore`] wrapper with scripted failures.
pub struct FaultyStore<S> {
    inner: S,
    script: Mutex<Script>,
}

impl<S: QnaStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            script: Mutex::new(Script::default()),
        }
    }

    /// The wrapped store (bypasses faults).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fails the next call of `op` with `err`.
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.fail_times(op, 1, err);
    }

    /// Fails the next `times` calls of `op` with `err`.
    pub fn fail_times(&self, op: StoreOp, times: u32, err: StoreError) {
        let mut script = self.lock();
        let queue = script.faults.entry(op).or_default();
        queue.extend(std::iter::repeat_n(err, times as usize));
    }

    /// Number of scripted failures not consumed yet for `op`.
    pub fn pending(&self, op: StoreOp) -> usize {
        self.lock().faults.get(&op).map_or(0, VecDeque::len)
    }

    /// Number of calls of `op` seen so far (failed or not).
    pub fn calls(&self, op: StoreOp) -> u32 {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut script = self.lock();
        *script.calls.entry(op).or_default() += 1;
        match script.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<S: QnaStore> QnaStore for FaultyStore<S> {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.check(StoreOp::InsertSession)?;
        self.inner.insert_session(session).await
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        self.check(StoreOp::FindSession)?;
        self.inner.find_session(id).await
    }

    async fn replace_session(&self, session: &Session) -> Result<Option<Session>, StoreError> {
        self.check(StoreOp::ReplaceSession)?;
        self.inner.replace_session(session).await
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        self.check(StoreOp::InsertQuestion)?;
        self.inner.insert_question(question).await
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, StoreError> {
        self.check(StoreOp::FindQuestion)?;
        self.inner.find_question(id).await
    }

    async fn replace_question(&self, question: &Question) -> Result<Option<Question>, StoreError> {
        self.check(StoreOp::ReplaceQuestion)?;
        self.inner.replace_question(question).await
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, StoreError> {
        self.check(StoreOp::DeleteQuestion)?;
        self.inner.delete_question(id).await
    }

    async fn questions_for_session(&self, session: SessionId) -> Result<Vec<Question>, StoreError> {
        self.check(StoreOp::QuestionsForSession)?;
        self.inner.questions_for_session(session).await
    }
}
