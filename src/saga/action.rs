use std::fmt;

use crate::model::Entity;

/// User actions that run through the compensating write protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Primary: insert question. Inverse: delete it.
    CreateQuestion,
    /// Primary: add voter. Inverse: restore prior vote membership.
    Upvote,
    /// Primary: remove voter. Inverse: restore prior vote membership.
    Downvote,
    /// Primary: set answered. Inverse: restore prior answered flag.
    MarkAnswered,
    /// Primary: deactivate session. Inverse: reactivate it.
    EndSession,
}

impl ActionKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionKind::CreateQuestion => "create_question",
            ActionKind::Upvote => "upvote",
            ActionKind::Downvote => "downvote",
            ActionKind::MarkAnswered => "mark_answered",
            ActionKind::EndSession => "end_session",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One action invocation: what is done, and to which document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub action: ActionKind,
    pub entity: Entity,
}

impl Step {
    pub fn new(action: ActionKind, entity: Entity) -> Self {
        Self { action, entity }
    }

    /// Same action, reported against `entity`.
    #[must_use]
    pub fn with_entity(self, entity: Entity) -> Self {
        Self { entity, ..self }
    }
}

/// Lifecycle of one action.
///
/// ```text
/// Start ──primary ok──► Mutated ──notify ok──► Committed
///   │                      │
///   │ primary err          └──notify failed──► Reverting ──inverse ok──► RolledBack
///   ▼                                              │
/// (error returned, nothing to undo)                └──inverse err──► Inconsistent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Start,
    Mutated,
    Committed,
    Reverting,
    RolledBack,
    Inconsistent,
}

impl ActionState {
    /// True for the states an action ends in after its primary succeeded.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActionState::Committed | ActionState::RolledBack | ActionState::Inconsistent
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: ActionState) -> bool {
        use ActionState::*;
        matches!(
            (self, next),
            (Start, Mutated)
                | (Mutated, Committed)
                | (Mutated, Reverting)
                | (Reverting, RolledBack)
                | (Reverting, Inconsistent)
        )
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            ActionState::Start => "start",
            ActionState::Mutated => "mutated",
            ActionState::Committed => "committed",
            ActionState::Reverting => "reverting",
            ActionState::RolledBack => "rolled_back",
            ActionState::Inconsistent => "inconsistent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;

    #[test]
    fn test_labels_are_snake_case() {
        assert_eq!(ActionKind::CreateQuestion.to_string(), "create_question");
        assert_eq!(ActionKind::EndSession.as_label(), "end_session");
        assert_eq!(ActionState::RolledBack.as_label(), "rolled_back");
    }

    #[test]
    fn test_transitions() {
        use ActionState::*;
        assert!(Start.can_advance_to(Mutated));
        assert!(Mutated.can_advance_to(Committed));
        assert!(Reverting.can_advance_to(Inconsistent));
        assert!(!Start.can_advance_to(Committed));
        assert!(!Committed.can_advance_to(Reverting));
        assert!(!RolledBack.can_advance_to(Mutated));

        assert!(Committed.is_terminal());
        assert!(!Reverting.is_terminal());
    }

    #[test]
    fn test_step_carries_entity() {
        let id = QuestionId::new();
        let step = Step::new(ActionKind::Upvote, Entity::Question(id));
        assert_eq!(step.entity.to_string(), format!("question/{id}"));

        let session = crate::model::SessionId::new();
        let moved = Step::new(ActionKind::CreateQuestion, Entity::Session(session))
            .with_entity(Entity::Question(id));
        assert_eq!(moved.action, ActionKind::CreateQuestion);
        assert_eq!(moved.entity, Entity::Question(id));
    }
}
