use std::sync::Arc;

use tracing::info;

use crate::{
    config::Config,
    data::{Change, QuestionData, SessionData},
    error::ActionError,
    events::Bus,
    model::{Entity, Leaderboard, Question, QuestionId, Session, SessionId, UserId},
    notify::{Notice, NoticeKind, NotifierRef},
    saga::{ActionKind, Saga, Step},
    store::StoreRef,
};

/// Entry point for user actions.
///
/// Actions that change what participants see (`create_question`,
/// `update_upvote`, `mark_question_answered`, `end_session`) run through the
/// [`Saga`]; bookkeeping writes (`start_session`, `set_activity_id`,
/// `record_card_refresh`) go straight to the data layer.
///
/// Cloneable: clones share the store, the notifier and the bus.
#[derive(Clone)]
pub struct QnaController {
    sessions: SessionData,
    questions: QuestionData,
    saga: Saga,
}

impl QnaController {
    pub fn new(store: StoreRef, notifier: NotifierRef, config: Arc<Config>, bus: Bus) -> Self {
        let questions = QuestionData::new(store, config, bus.clone());
        Self {
            sessions: questions.sessions().clone(),
            questions,
            saga: Saga::new(notifier, bus),
        }
    }

    /// Creates a new active session hosted by `host`.
    pub async fn start_session(
        &self,
        title: &str,
        host: UserId,
        conversation_id: &str,
    ) -> Result<Session, ActionError> {
        let session = self.sessions.create(title, host, conversation_id).await?;
        info!(session = %session.id, host = %session.host, "session started");
        Ok(session)
    }

    /// Stores the activity id of the posted session card.
    pub async fn set_activity_id(
        &self,
        session: SessionId,
        activity_id: &str,
    ) -> Result<Session, ActionError> {
        self.sessions.set_activity_id(session, activity_id).await
    }

    /// Ends an active session; reactivated again if the notice is not confirmed.
    pub async fn end_session(&self, session: SessionId) -> Result<Session, ActionError> {
        let sessions = &self.sessions;
        let ended = self
            .saga
            .run(
                Step::new(ActionKind::EndSession, Entity::Session(session)),
                || sessions.end(session),
                |s: &Session| Notice::for_session(NoticeKind::SessionEnded, s),
                |_| async move { sessions.reactivate(session).await.map(drop) },
            )
            .await?;
        info!(%session, "session ended");
        Ok(ended)
    }

    /// Posts a question; deleted again if the notice is not confirmed.
    pub async fn create_question(
        &self,
        session: SessionId,
        author: UserId,
        content: &str,
    ) -> Result<Question, ActionError> {
        let questions = &self.questions;
        // No question id before the insert: a failed insert is reported against
        // the session, anything after it against the new question.
        self.saga
            .run(
                Step::new(ActionKind::CreateQuestion, Entity::Session(session)),
                || questions.create(session, author, content),
                |q: &Question| Notice::for_question(NoticeKind::QuestionAdded, q),
                |q: Question| async move { questions.delete(q.id).await },
            )
            .await
    }

    /// Adds (`upvote == true`) or removes a vote of `user`.
    ///
    /// If the notice is not confirmed, the vote membership `user` had before
    /// the call is restored.
    pub async fn update_upvote(
        &self,
        question: QuestionId,
        user: &UserId,
        upvote: bool,
    ) -> Result<Question, ActionError> {
        let (action, kind) = if upvote {
            (ActionKind::Upvote, NoticeKind::QuestionUpvoted)
        } else {
            (ActionKind::Downvote, NoticeKind::QuestionDownvoted)
        };
        let questions = &self.questions;
        let change = self
            .saga
            .run(
                Step::new(action, Entity::Question(question)),
                || async move {
                    if upvote {
                        questions.upvote(question, user).await
                    } else {
                        questions.downvote(question, user).await
                    }
                },
                |c: &Change<Question>| Notice::for_question(kind, &c.doc),
                |c: Change<Question>| async move {
                    questions
                        .restore_vote(question, user, c.before)
                        .await
                        .map(drop)
                },
            )
            .await?;
        Ok(change.doc)
    }

    /// Marks a question answered; the prior flag is restored if the notice is
    /// not confirmed.
    pub async fn mark_question_answered(
        &self,
        question: QuestionId,
    ) -> Result<Question, ActionError> {
        let questions = &self.questions;
        let change = self
            .saga
            .run(
                Step::new(ActionKind::MarkAnswered, Entity::Question(question)),
                || questions.mark_answered(question),
                |c: &Change<Question>| Notice::for_question(NoticeKind::QuestionAnswered, &c.doc),
                |c: Change<Question>| async move {
                    questions
                        .restore_answered(question, c.before)
                        .await
                        .map(drop)
                },
            )
            .await?;
        Ok(change.doc)
    }

    /// Records that the session card shows the state at `version`.
    pub async fn record_card_refresh(
        &self,
        session: SessionId,
        version: u64,
    ) -> Result<Session, ActionError> {
        self.sessions.mark_card_refreshed(session, version).await
    }

    pub async fn session(&self, id: SessionId) -> Result<Session, ActionError> {
        self.sessions.get(id).await
    }

    pub async fn question(&self, id: QuestionId) -> Result<Question, ActionError> {
        self.questions.get(id).await
    }

    pub async fn leaderboard(&self, session: SessionId) -> Result<Leaderboard, ActionError> {
        self.questions.leaderboard(session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    use crate::error::{NotifyError, StoreError};
    use crate::notify::NotifierFn;
    use crate::policies::RetrySettings;
    use crate::store::{FaultyStore, MemoryStore, StoreOp};

    /// Notifier whose answer can be flipped between calls.
    struct Switch {
        accept: Arc<AtomicBool>,
        calls: Arc<AtomicU32>,
    }

    impl Switch {
        fn notifier(&self, error: bool) -> NotifierRef {
            let accept = self.accept.clone();
            let calls = self.calls.clone();
            NotifierFn::arc("switch", move |_n: Notice| {
                calls.fetch_add(1, Ordering::SeqCst);
                let ok = accept.load(Ordering::SeqCst);
                async move {
                    match (ok, error) {
                        (true, _) => Ok(true),
                        (false, false) => Ok(false),
                        (false, true) => Err(NotifyError::Failed {
                            reason: "card refresh queue rejected".into(),
                        }),
                    }
                }
            })
        }

        fn set(&self, accept: bool) {
            self.accept.store(accept, Ordering::SeqCst);
        }
    }

    struct Fixture {
        store: Arc<FaultyStore<MemoryStore>>,
        ctl: QnaController,
        switch: Switch,
        bus: Bus,
    }

    fn fixture(notify_errors: bool) -> Fixture {
        let store = Arc::new(FaultyStore::new(MemoryStore::new()));
        let bus = Bus::new(256);
        let switch = Switch {
            accept: Arc::new(AtomicBool::new(true)),
            calls: Arc::new(AtomicU32::new(0)),
        };
        let config = Arc::new(Config {
            fixed: RetrySettings::new(2, Duration::from_millis(10), Duration::from_secs(1)),
            exponential: RetrySettings::new(3, Duration::from_millis(5), Duration::from_secs(1)),
            bus_capacity: 256,
            ..Config::default()
        });
        let ctl = QnaController::new(
            store.clone(),
            switch.notifier(notify_errors),
            config,
            bus.clone(),
        );
        Fixture {
            store,
            ctl,
            switch,
            bus,
        }
    }

    async fn open_session(f: &Fixture) -> Session {
        f.ctl
            .start_session("Weekly AMA", UserId::from("host"), "conv-1")
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_question_commits() {
        let f = fixture(false);
        let s = open_session(&f).await;

        let q = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "What ships next?")
            .await
            .unwrap();

        assert_eq!(f.ctl.question(q.id).await.unwrap(), q);
        assert_eq!(f.switch.calls.load(Ordering::SeqCst), 1);
        let board = f.ctl.leaderboard(s.id).await.unwrap();
        assert_eq!(board.open.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_question_reverted_when_notice_declined() {
        let f = fixture(false);
        let s = open_session(&f).await;
        f.switch.set(false);

        let err = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "lost?")
            .await
            .unwrap_err();

        assert_eq!(err.as_label(), "changes_reverted_due_to_background_job_failure");
        assert!(f.ctl.leaderboard(s.id).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_upvote_reverted_removes_voter() {
        let f = fixture(false);
        let s = open_session(&f).await;
        let q = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "q")
            .await
            .unwrap();
        let bob = UserId::from("bob");
        f.switch.set(false);

        let err = f.ctl.update_upvote(q.id, &bob, true).await.unwrap_err();

        assert!(matches!(
            err,
            ActionError::Reverted {
                action: ActionKind::Upvote,
                ..
            }
        ));
        assert!(!f.ctl.question(q.id).await.unwrap().has_voted(&bob));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_repeat_upvote_keeps_existing_vote() {
        let f = fixture(false);
        let s = open_session(&f).await;
        let q = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "q")
            .await
            .unwrap();
        let bob = UserId::from("bob");
        f.ctl.update_upvote(q.id, &bob, true).await.unwrap();
        f.switch.set(false);

        f.ctl.update_upvote(q.id, &bob, true).await.unwrap_err();

        assert!(f.ctl.question(q.id).await.unwrap().has_voted(&bob));
    }

    #[tokio::test(start_paused = true)]
    async fn test_downvote_commits() {
        let f = fixture(false);
        let s = open_session(&f).await;
        let q = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "q")
            .await
            .unwrap();
        let bob = UserId::from("bob");
        f.ctl.update_upvote(q.id, &bob, true).await.unwrap();

        let q = f.ctl.update_upvote(q.id, &bob, false).await.unwrap();

        assert_eq!(q.votes(), 0);
    }

    /// The document apart from its version counter.
    fn without_version(q: &Question) -> Question {
        Question {
            version: 0,
            ..q.clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_downvote_reverted_restores_voter() {
        let f = fixture(false);
        let s = open_session(&f).await;
        let q = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "q")
            .await
            .unwrap();
        let bob = UserId::from("bob");
        f.ctl.update_upvote(q.id, &bob, true).await.unwrap();
        let snapshot = f.ctl.question(q.id).await.unwrap();
        f.switch.set(false);

        let err = f.ctl.update_upvote(q.id, &bob, false).await.unwrap_err();

        assert!(matches!(
            &err,
            ActionError::Reverted { action: ActionKind::Downvote, entity, .. }
                if *entity == Entity::Question(q.id)
        ));
        let after = f.ctl.question(q.id).await.unwrap();
        assert!(after.has_voted(&bob));
        assert_eq!(without_version(&after), without_version(&snapshot));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_answered_reverted_clears_flag() {
        let f = fixture(false);
        let s = open_session(&f).await;
        let q = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "q")
            .await
            .unwrap();
        f.ctl.update_upvote(q.id, &UserId::from("bob"), true).await.unwrap();
        let snapshot = f.ctl.question(q.id).await.unwrap();
        f.switch.set(false);

        let err = f.ctl.mark_question_answered(q.id).await.unwrap_err();

        assert!(matches!(
            err,
            ActionError::Reverted {
                action: ActionKind::MarkAnswered,
                ..
            }
        ));
        let after = f.ctl.question(q.id).await.unwrap();
        assert!(!after.is_answered);
        assert_eq!(without_version(&after), without_version(&snapshot));
        assert!(after.version > snapshot.version);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_session_notifier_error_reactivates() {
        let f = fixture(true);
        let s = open_session(&f).await;
        f.switch.set(false);

        let err = f.ctl.end_session(s.id).await.unwrap_err();

        assert!(matches!(
            &err,
            ActionError::Reverted { action: ActionKind::EndSession, cause, .. }
                if cause.contains("card refresh queue rejected")
        ));
        assert!(err.is_retryable_by_user());
        assert!(f.ctl.session(s.id).await.unwrap().is_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_answered_on_ended_session_is_not_compensated() {
        let f = fixture(false);
        let s = open_session(&f).await;
        let q = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "q")
            .await
            .unwrap();
        f.ctl.end_session(s.id).await.unwrap();
        // The session-ended notice is best effort: a declining notifier is ignored.
        f.switch.set(false);
        let calls_before = f.switch.calls.load(Ordering::SeqCst);
        let replaces_before = f.store.calls(StoreOp::ReplaceQuestion);

        let err = f.ctl.mark_question_answered(q.id).await.unwrap_err();

        assert!(matches!(err, ActionError::SessionInactive { session } if session == s.id));
        assert_eq!(f.switch.calls.load(Ordering::SeqCst), calls_before + 1);
        assert_eq!(f.store.calls(StoreOp::ReplaceQuestion), replaces_before);
        assert!(!f.ctl.question(q.id).await.unwrap().is_answered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_revert_keeps_primary_effect() {
        let f = fixture(false);
        let mut rx = f.bus.subscribe();
        let s = open_session(&f).await;
        f.switch.set(false);
        // Every delete attempt is throttled: first try + 2 fixed retries.
        f.store
            .fail_times(StoreOp::DeleteQuestion, 3, StoreError::throttled());

        let err = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "stuck")
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(
            err.as_label(),
            "revert_operation_failed_after_background_job_failure"
        );
        let board = f.ctl.leaderboard(s.id).await.unwrap();
        assert_eq!(board.len(), 1);
        let orphan = board.open[0].id;
        assert!(matches!(
            err,
            ActionError::RevertFailed { entity: Entity::Question(id), .. } if id == orphan
        ));
        assert!(err.to_string().contains(&format!("question/{orphan}")));

        let mut saw_revert_failed = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == crate::events::EventKind::RevertFailed {
                assert_eq!(ev.op.as_deref(), Some("create_question"));
                assert_eq!(ev.entity.as_deref(), Some(format!("question/{orphan}").as_str()));
                saw_revert_failed = true;
            }
        }
        assert!(saw_revert_failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_absorbed() {
        let f = fixture(false);
        let s = open_session(&f).await;
        let q = f
            .ctl
            .create_question(s.id, UserId::from("ann"), "q")
            .await
            .unwrap();
        f.store.fail_next(StoreOp::FindQuestion, StoreError::throttled());
        f.store.fail_next(
            StoreOp::ReplaceQuestion,
            StoreError::VersionConflict {
                entity: q.entity(),
                expected: 0,
                found: 1,
            },
        );

        let answered = f.ctl.mark_question_answered(q.id).await.unwrap();

        assert!(answered.is_answered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_card_refresh_tracking() {
        let f = fixture(false);
        let s = open_session(&f).await;
        f.ctl.set_activity_id(s.id, "activity-9").await.unwrap();
        f.ctl
            .create_question(s.id, UserId::from("ann"), "q")
            .await
            .unwrap();

        let current = f.ctl.session(s.id).await.unwrap();
        assert_eq!(current.activity_id.as_deref(), Some("activity-9"));
        assert!(current.needs_card_refresh());

        let refreshed = f
            .ctl
            .record_card_refresh(s.id, current.data_event_version)
            .await
            .unwrap();
        assert!(!refreshed.needs_card_refresh());
    }
}
