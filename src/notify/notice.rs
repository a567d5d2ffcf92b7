use crate::model::{Entity, Question, QuestionId, Session, SessionId};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    QuestionAdded,
    QuestionUpvoted,
    QuestionDownvoted,
    QuestionAnswered,
    SessionEnded,
}

impl NoticeKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            NoticeKind::QuestionAdded => "question_added",
            NoticeKind::QuestionUpvoted => "question_upvoted",
            NoticeKind::QuestionDownvoted => "question_downvoted",
            NoticeKind::QuestionAnswered => "question_answered",
            NoticeKind::SessionEnded => "session_ended",
        }
    }
}

/// Payload handed to a [`Notifier`](crate::notify::Notifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub session: SessionId,
    pub question: Option<QuestionId>,
}

impl Notice {
    pub fn for_question(kind: NoticeKind, question: &Question) -> Self {
        Self {
            kind,
            session: question.session_id,
            question: Some(question.id),
        }
    }

    pub fn session_ended(session: SessionId) -> Self {
        Self {
            kind: NoticeKind::SessionEnded,
            session,
            question: None,
        }
    }

    pub fn for_session(kind: NoticeKind, session: &Session) -> Self {
        Self {
            kind,
            session: session.id,
            question: None,
        }
    }

    /// The document the notice is about: the question when there is one.
    pub fn entity(&self) -> Entity {
        match self.question {
            Some(id) => Entity::Question(id),
            None => Entity::Session(self.session),
        }
    }
}
