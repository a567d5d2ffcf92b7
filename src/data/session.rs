use std::sync::Arc;

use crate::config::Config;
use crate::data::Access;
use crate::error::{ActionError, StoreError};
use crate::events::Bus;
use crate::model::{Entity, Session, SessionId, UserId};
use crate::store::StoreRef;

/// Session document operations.
#[derive(Clone)]
pub struct SessionData {
    access: Access,
}

impl SessionData {
    pub fn new(store: StoreRef, config: Arc<Config>, bus: Bus) -> Self {
        Self {
            access: Access::new(store, config, bus),
        }
    }

    /// Persists a new active session.
    pub async fn create(
        &self,
        title: &str,
        host: UserId,
        conversation_id: &str,
    ) -> Result<Session, ActionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ActionError::InvalidInput {
                reason: "session title is empty".into(),
            });
        }
        let session = Session::new(title, host, conversation_id);
        let store = &self.access.store;
        let doc = &session;
        self.access
            .fixed("session.insert")
            .run(|| async move { store.insert_session(doc).await })
            .await?;
        Ok(session)
    }

    pub async fn get(&self, id: SessionId) -> Result<Session, ActionError> {
        let store = &self.access.store;
        self.access
            .fixed("session.find")
            .run(|| async move { store.find_session(id).await })
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Flips `is_active` to false. Fails with `SessionInactive` if already ended.
    pub async fn end(&self, id: SessionId) -> Result<Session, ActionError> {
        self.update("session.end", id, |s| {
            ensure_active(s)?;
            s.is_active = false;
            Ok(())
        })
        .await
    }

    /// Flips `is_active` back to true (compensation for [`SessionData::end`]).
    pub async fn reactivate(&self, id: SessionId) -> Result<Session, ActionError> {
        self.update("session.reactivate", id, |s| {
            s.is_active = true;
            Ok(())
        })
        .await
    }

    /// Records the activity id of the posted session card.
    pub async fn set_activity_id(
        &self,
        id: SessionId,
        activity_id: &str,
    ) -> Result<Session, ActionError> {
        self.update("session.activity_id", id, |s| {
            s.activity_id = Some(activity_id.to_string());
            Ok(())
        })
        .await
    }

    /// Bumps `data_event_version` of an active session.
    ///
    /// Every question change calls this first: it is where a session that was
    /// ended concurrently shows up as `SessionInactive`.
    pub async fn touch(&self, id: SessionId) -> Result<Session, ActionError> {
        self.update("session.touch", id, ensure_active).await
    }

    /// Reads a session and fails with `SessionInactive` if it ended; no write.
    pub async fn require_active(&self, id: SessionId) -> Result<Session, ActionError> {
        let mut session = self.get(id).await?;
        ensure_active(&mut session)?;
        Ok(session)
    }

    /// Records that the card now shows the state at `version`.
    ///
    /// The bookkeeping write bumps the version itself; when nothing else changed
    /// since `version`, that bump is counted as refreshed too.
    pub async fn mark_card_refreshed(
        &self,
        id: SessionId,
        version: u64,
    ) -> Result<Session, ActionError> {
        self.update("session.card_refreshed", id, |s| {
            s.card_refreshed_version = if s.data_event_version == version {
                version + 1
            } else {
                s.card_refreshed_version.max(version)
            };
            Ok(())
        })
        .await
    }

    /// Read-modify-replace with conflict retries; `mutate` runs on every attempt.
    async fn update<F>(
        &self,
        label: &'static str,
        id: SessionId,
        mutate: F,
    ) -> Result<Session, ActionError>
    where
        F: Fn(&mut Session) -> Result<(), ActionError>,
    {
        let store = &self.access.store;
        let mutate = &mutate;
        self.access
            .versioned(label)
            .run(|| async move {
                let mut session = store.find_session(id).await?.ok_or_else(|| not_found(id))?;
                mutate(&mut session)?;
                store
                    .replace_session(&session)
                    .await?
                    .ok_or_else(|| not_found(id))
            })
            .await
    }
}

fn ensure_active(session: &mut Session) -> Result<(), ActionError> {
    if session.is_active {
        Ok(())
    } else {
        Err(ActionError::SessionInactive {
            session: session.id,
        })
    }
}

fn not_found(id: SessionId) -> ActionError {
    StoreError::NotFound {
        entity: Entity::Session(id),
    }
    .into()
}
