//! # Session and question documents.
//!
//! Plain data types shared by the store, the data-access layer and the controller.
//! Documents carry their own optimistic-concurrency version:
//! - [`Session::data_event_version`]: bumped by every session write, including
//!   the `touch` issued for question changes so the posted card knows it is stale.
//! - [`Question::version`]: bumped by every question write.

use std::collections::BTreeSet;
use std::fmt;
use std::time::SystemTime;

use uuid::Uuid;

/// Identifier of a Q&A session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuestionId(Uuid);

impl QuestionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Chat user identifier (the directory object id in Teams).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to a stored document, used in errors and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Session(SessionId),
    Question(QuestionId),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Session(id) => write!(f, "session/{id}"),
            Entity::Question(id) => write!(f, "question/{id}"),
        }
    }
}

/// A question-and-answer session attached to a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    /// User who started the session.
    pub host: UserId,
    pub conversation_id: String,
    pub is_active: bool,
    /// Activity id of the posted session card, once the bot has sent it.
    pub activity_id: Option<String>,
    /// Optimistic-concurrency version; monotonic.
    pub data_event_version: u64,
    /// `data_event_version` the card was last refreshed at.
    pub card_refreshed_version: u64,
    pub created_at: SystemTime,
}

impl Session {
    /// Creates a fresh, active session at version 0.
    pub fn new(title: impl Into<String>, host: UserId, conversation_id: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            title: title.into(),
            host,
            conversation_id: conversation_id.into(),
            is_active: true,
            activity_id: None,
            data_event_version: 0,
            card_refreshed_version: 0,
            created_at: SystemTime::now(),
        }
    }

    #[inline]
    pub fn entity(&self) -> Entity {
        Entity::Session(self.id)
    }

    /// True when the card shows an older state than the document.
    #[inline]
    pub fn needs_card_refresh(&self) -> bool {
        self.card_refreshed_version < self.data_event_version
    }
}

/// A question posted in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub session_id: SessionId,
    pub author: UserId,
    pub content: String,
    /// Users who upvoted; membership is the vote.
    pub voters: BTreeSet<UserId>,
    pub is_answered: bool,
    /// Optimistic-concurrency version; monotonic.
    pub version: u64,
    pub created_at: SystemTime,
}

impl Question {
    pub fn new(session_id: SessionId, author: UserId, content: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new(),
            session_id,
            author,
            content: content.into(),
            voters: BTreeSet::new(),
            is_answered: false,
            version: 0,
            created_at: SystemTime::now(),
        }
    }

    #[inline]
    pub fn entity(&self) -> Entity {
        Entity::Question(self.id)
    }

    #[inline]
    pub fn votes(&self) -> usize {
        self.voters.len()
    }

    #[inline]
    pub fn has_voted(&self, user: &UserId) -> bool {
        self.voters.contains(user)
    }
}

/// Read model shown by the leaderboard view.
///
/// Both lists are ordered by vote count (descending), then by creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    pub open: Vec<Question>,
    pub answered: Vec<Question>,
}

impl Leaderboard {
    /// Splits and orders the questions of one session.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        let (mut answered, mut open): (Vec<_>, Vec<_>) =
            questions.into_iter().partition(|q| q.is_answered);
        let order = |a: &Question, b: &Question| {
            b.votes()
                .cmp(&a.votes())
                .then_with(|| a.created_at.cmp(&b.created_at))
        };
        open.sort_by(order);
        answered.sort_by(order);
        Self { open, answered }
    }

    pub fn len(&self) -> usize {
        self.open.len() + self.answered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
