use std::sync::Arc;

use crate::config::Config;
use crate::data::{Access, Change, SessionData};
use crate::error::{ActionError, StoreError};
use crate::events::Bus;
use crate::model::{Entity, Leaderboard, Question, QuestionId, SessionId, UserId};
use crate::store::StoreRef;

/// Question document operations.
///
/// Checked mutations touch the owning session before writing the question, so
/// the session card sees a new `data_event_version` for every change.
#[derive(Clone)]
pub struct QuestionData {
    access: Access,
    sessions: SessionData,
}

impl QuestionData {
    pub fn new(store: StoreRef, config: Arc<Config>, bus: Bus) -> Self {
        Self {
            sessions: SessionData::new(store.clone(), config.clone(), bus.clone()),
            access: Access::new(store, config, bus),
        }
    }

    /// Session operations sharing this store and configuration.
    pub fn sessions(&self) -> &SessionData {
        &self.sessions
    }

    /// Persists a new question in an active session.
    pub async fn create(
        &self,
        session: SessionId,
        author: UserId,
        content: &str,
    ) -> Result<Question, ActionError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ActionError::InvalidInput {
                reason: "question content is empty".into(),
            });
        }
        self.sessions.touch(session).await?;

        let question = Question::new(session, author, content);
        let store = &self.access.store;
        let doc = &question;
        self.access
            .fixed("question.insert")
            .run(|| async move { store.insert_question(doc).await })
            .await?;
        Ok(question)
    }

    pub async fn get(&self, id: QuestionId) -> Result<Question, ActionError> {
        let store = &self.access.store;
        self.access
            .fixed("question.find")
            .run(|| async move { store.find_question(id).await })
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Removes a question (compensation for [`QuestionData::create`]).
    pub async fn delete(&self, id: QuestionId) -> Result<(), ActionError> {
        let store = &self.access.store;
        let existed = self
            .access
            .fixed("question.delete")
            .run(|| async move { store.delete_question(id).await })
            .await?;
        if existed { Ok(()) } else { Err(not_found(id)) }
    }

    /// Adds `user` to the voters. Voting twice is a no-op with `before == true`.
    pub async fn upvote(
        &self,
        id: QuestionId,
        user: &UserId,
    ) -> Result<Change<Question>, ActionError> {
        self.vote_checked("question.upvote", id, user, true).await
    }

    /// Removes `user` from the voters.
    pub async fn downvote(
        &self,
        id: QuestionId,
        user: &UserId,
    ) -> Result<Change<Question>, ActionError> {
        self.vote_checked("question.downvote", id, user, false).await
    }

    /// Sets whether `user` voted, regardless of the session state.
    pub async fn restore_vote(
        &self,
        id: QuestionId,
        user: &UserId,
        voted: bool,
    ) -> Result<Question, ActionError> {
        let (doc, _) = self
            .update("question.restore_vote", id, |q| {
                Ok(set_vote(q, user, voted))
            })
            .await?;
        Ok(doc)
    }

    /// Sets the answered flag. An already answered question is returned as is,
    /// without touching the session.
    pub async fn mark_answered(&self, id: QuestionId) -> Result<Change<Question>, ActionError> {
        let current = self.get(id).await?;
        if current.is_answered {
            self.sessions.require_active(current.session_id).await?;
            return Ok(Change {
                doc: current,
                before: true,
            });
        }
        self.sessions.touch(current.session_id).await?;

        let (doc, before) = self
            .update("question.answer", id, |q| {
                Ok(std::mem::replace(&mut q.is_answered, true))
            })
            .await?;
        Ok(Change { doc, before })
    }

    /// Sets the answered flag, regardless of the session state.
    pub async fn restore_answered(
        &self,
        id: QuestionId,
        answered: bool,
    ) -> Result<Question, ActionError> {
        let (doc, _) = self
            .update("question.restore_answered", id, |q| {
                q.is_answered = answered;
                Ok(())
            })
            .await?;
        Ok(doc)
    }

    /// All questions of a session, unordered.
    pub async fn for_session(&self, session: SessionId) -> Result<Vec<Question>, ActionError> {
        let store = &self.access.store;
        Ok(self
            .access
            .fixed("question.list")
            .run(|| async move { store.questions_for_session(session).await })
            .await?)
    }

    /// Ranked open and answered questions of an existing session.
    pub async fn leaderboard(&self, session: SessionId) -> Result<Leaderboard, ActionError> {
        self.sessions.get(session).await?;
        let questions = self.for_session(session).await?;
        Ok(Leaderboard::from_questions(questions))
    }

    /// The session is touched only when the membership actually flips; a
    /// question deleted between the read and the write still leaves it touched.
    async fn vote_checked(
        &self,
        label: &'static str,
        id: QuestionId,
        user: &UserId,
        voted: bool,
    ) -> Result<Change<Question>, ActionError> {
        let current = self.get(id).await?;
        if current.has_voted(user) == voted {
            self.sessions.require_active(current.session_id).await?;
            return Ok(Change {
                doc: current,
                before: voted,
            });
        }
        self.sessions.touch(current.session_id).await?;

        let (doc, before) = self
            .update(label, id, |q| Ok(set_vote(q, user, voted)))
            .await?;
        Ok(Change { doc, before })
    }

    /// Read-modify-replace with conflict retries; `mutate` runs on every attempt
    /// and its output from the successful attempt is returned with the document.
    async fn update<F, R>(
        &self,
        label: &'static str,
        id: QuestionId,
        mutate: F,
    ) -> Result<(Question, R), ActionError>
    where
        F: Fn(&mut Question) -> Result<R, ActionError>,
    {
        let store = &self.access.store;
        let mutate = &mutate;
        self.access
            .versioned(label)
            .run(|| async move {
                let mut question = store.find_question(id).await?.ok_or_else(|| not_found(id))?;
                let out = mutate(&mut question)?;
                let stored = store
                    .replace_question(&question)
                    .await?
                    .ok_or_else(|| not_found(id))?;
                Ok::<_, ActionError>((stored, out))
            })
            .await
    }
}

/// Applies the vote and returns whether `user` had voted before.
fn set_vote(question: &mut Question, user: &UserId, voted: bool) -> bool {
    if voted {
        !question.voters.insert(user.clone())
    } else {
        question.voters.remove(user)
    }
}

fn not_found(id: QuestionId) -> ActionError {
    StoreError::NotFound {
        entity: Entity::Question(id),
    }
    .into()
}
