//! # In-process store.
//!
//! [`MemoryStore`] keeps documents in two maps behind a `tokio::sync::RwLock`.
//! Replaces perform the version compare-and-swap under the write lock, which
//! makes them atomic per document.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{Entity, Question, QuestionId, Session, SessionId};
use crate::store::{DUPLICATE_KEY_CODE, QnaStore};

#[derive(Default)]
struct Collections {
    sessions: HashMap<SessionId, Session>,
    questions: HashMap<QuestionId, Question>,
}

/// In-memory [`QnaStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate(entity: Entity) -> StoreError {
    StoreError::from_code(DUPLICATE_KEY_CODE, format!("duplicate key: {entity}"))
}

#[async_trait]
impl QnaStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut g = self.inner.write().await;
        if g.sessions.contains_key(&session.id) {
            return Err(duplicate(session.entity()));
        }
        g.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.read().await.sessions.get(&id).cloned())
    }

    async fn replace_session(&self, session: &Session) -> Result<Option<Session>, StoreError> {
        let mut g = self.inner.write().await;
        let Some(stored) = g.sessions.get_mut(&session.id) else {
            return Ok(None);
        };
        if stored.data_event_version != session.data_event_version {
            return Err(StoreError::VersionConflict {
                entity: session.entity(),
                expected: session.data_event_version,
                found: stored.data_event_version,
            });
        }
        *stored = Session {
            data_event_version: session.data_event_version + 1,
            ..session.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        let mut g = self.inner.write().await;
        if g.questions.contains_key(&question.id) {
            return Err(duplicate(question.entity()));
        }
        g.questions.insert(question.id, question.clone());
        Ok(())
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, StoreError> {
        Ok(self.inner.read().await.questions.get(&id).cloned())
    }

    async fn replace_question(&self, question: &Question) -> Result<Option<Question>, StoreError> {
        let mut g = self.inner.write().await;
        let Some(stored) = g.questions.get_mut(&question.id) else {
            return Ok(None);
        };
        if stored.version != question.version {
            return Err(StoreError::VersionConflict {
                entity: question.entity(),
                expected: question.version,
                found: stored.version,
            });
        }
        *stored = Question {
            version: question.version + 1,
            ..question.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.questions.remove(&id).is_some())
    }

    async fn questions_for_session(&self, session: SessionId) -> Result<Vec<Question>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .questions
            .values()
            .filter(|q| q.session_id == session)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    #[tokio::test]
    async fn test_replace_is_compare_and_swap() {
        let store = MemoryStore::new();
        let session = Session::new("retro", UserId::from("host"), "conv");
        store.insert_session(&session).await.unwrap();

        let mut first = session.clone();
        first.title = "first".into();
        let stored = store.replace_session(&first).await.unwrap().unwrap();
        assert_eq!(stored.data_event_version, 1);
        assert_eq!(stored.title, "first");

        // Second writer still holds version 0.
        let mut second = session.clone();
        second.title = "second".into();
        let err = store.replace_session(&second).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionConflict {
                entity: session.entity(),
                expected: 0,
                found: 1
            }
        );

        let current = store.find_session(session.id).await.unwrap().unwrap();
        assert_eq!(current.title, "first");
    }

    #[tokio::test]
    async fn test_missing_documents_are_not_errors() {
        let store = MemoryStore::new();
        let q = Question::new(SessionId::new(), UserId::from("u"), "why?");
        assert_eq!(store.find_question(q.id).await.unwrap(), None);
        assert_eq!(store.replace_question(&q).await.unwrap(), None);
        assert!(!store.delete_question(q.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_backend_error() {
        let store = MemoryStore::new();
        let q = Question::new(SessionId::new(), UserId::from("u"), "why?");
        store.insert_question(&q).await.unwrap();
        let err = store.insert_question(&q).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Backend {
                code: Some(DUPLICATE_KEY_CODE),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_questions_for_session_filters() {
        let store = MemoryStore::new();
        let a = SessionId::new();
        let b = SessionId::new();
        for s in [a, a, b] {
            store
                .insert_question(&Question::new(s, UserId::from("u"), "q"))
                .await
                .unwrap();
        }
        assert_eq!(store.questions_for_session(a).await.unwrap().len(), 2);
        assert_eq!(store.questions_for_session(b).await.unwrap().len(), 1);
    }
}
