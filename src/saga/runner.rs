use std::future::Future;

use tracing::{debug, error, trace, warn};

use crate::{
    error::ActionError,
    events::{Bus, Event, EventKind},
    model::{Entity, SessionId},
    notify::{Notice, NotifierRef},
    saga::{ActionState, Step},
};

/// Runs user actions as primary mutation, notification, and compensation.
///
/// ### Rules
/// - The notifier is called **once** per action and never retried here.
/// - The inverse runs only after a successful primary whose notification failed.
/// - A primary failing with `SessionInactive` triggers a best-effort
///   session-ended notice; its outcome never changes the returned error.
/// - Events are published with the action label as `op` and the entity.
/// - Once the primary succeeded, events and errors name the entity its notice is
///   about, so a created question is reported by its own id.
#[derive(Clone)]
pub struct Saga {
    notifier: NotifierRef,
    bus: Bus,
}

impl Saga {
    pub fn new(notifier: NotifierRef, bus: Bus) -> Self {
        Self { notifier, bus }
    }

    /// Runs one action.
    ///
    /// - `primary` performs the durable mutation (store retries live inside it).
    /// - `notice` builds the notification from the mutation result.
    /// - `inverse` undoes the mutation, given its result.
    ///
    /// Returns the primary's value when the notification is confirmed, the
    /// primary's own error if it failed, [`ActionError::Reverted`] if the change
    /// was undone, or [`ActionError::RevertFailed`] if undoing it failed.
    pub async fn run<T, P, PF, N, I, IF>(
        &self,
        step: Step,
        primary: P,
        notice: N,
        inverse: I,
    ) -> Result<T, ActionError>
    where
        P: FnOnce() -> PF,
        PF: Future<Output = Result<T, ActionError>>,
        N: FnOnce(&T) -> Notice,
        I: FnOnce(T) -> IF,
        IF: Future<Output = Result<(), ActionError>>,
    {
        let mut state = Tracker::new(step);

        let value = match primary().await {
            Ok(value) => value,
            Err(err) => {
                if let ActionError::SessionInactive { session } = &err {
                    self.session_ended(step, *session).await;
                }
                debug!(action = %step.action, entity = %step.entity, error = %err, "primary mutation failed");
                return Err(err);
            }
        };
        let notice = notice(&value);
        let step = state.rebind(notice.entity());
        state.advance(ActionState::Mutated);
        self.publish(step, Event::new(EventKind::MutationApplied));

        let cause = match self.notifier.notify(&notice).await {
            Ok(true) => {
                state.settle(ActionState::Committed);
                self.publish(step, Event::new(EventKind::ActionCommitted));
                return Ok(value);
            }
            Ok(false) => format!("{} returned false", self.notifier.name()),
            Err(e) => format!("{} failed: {e}", self.notifier.name()),
        };
        self.publish(
            step,
            Event::new(EventKind::NotifyFailed).with_reason(cause.clone()),
        );

        state.advance(ActionState::Reverting);
        match inverse(value).await {
            Ok(()) => {
                state.settle(ActionState::RolledBack);
                warn!(action = %step.action, entity = %step.entity, %cause, "action reverted");
                self.publish(
                    step,
                    Event::new(EventKind::ActionReverted).with_reason(cause.clone()),
                );
                Err(ActionError::Reverted {
                    action: step.action,
                    entity: step.entity,
                    cause,
                })
            }
            Err(revert_err) => {
                state.settle(ActionState::Inconsistent);
                error!(
                    action = %step.action,
                    entity = %step.entity,
                    %cause,
                    error = %revert_err,
                    "revert failed, state is inconsistent"
                );
                self.publish(
                    step,
                    Event::new(EventKind::RevertFailed).with_reason(revert_err.to_string()),
                );
                Err(ActionError::RevertFailed {
                    action: step.action,
                    entity: step.entity,
                    source: Box::new(revert_err),
                })
            }
        }
    }

    /// Best-effort notice for a session that turned out to be ended.
    async fn session_ended(&self, step: Step, session: SessionId) {
        self.bus.publish(
            Event::new(EventKind::SessionEndedDetected)
                .with_op(step.action.as_label())
                .with_entity(Entity::Session(session)),
        );
        match self.notifier.notify(&Notice::session_ended(session)).await {
            Ok(true) => debug!(%session, "session-ended notice sent"),
            Ok(false) => debug!(%session, "session-ended notice not accepted"),
            Err(e) => debug!(%session, error = %e, "session-ended notice failed"),
        }
    }

    fn publish(&self, step: Step, ev: Event) {
        self.bus.publish(
            ev.with_op(step.action.as_label())
                .with_entity(step.entity),
        );
    }
}

/// Walks the [`ActionState`] machine of one action.
struct Tracker {
    step: Step,
    state: ActionState,
}

impl Tracker {
    fn new(step: Step) -> Self {
        Self {
            step,
            state: ActionState::Start,
        }
    }

    fn advance(&mut self, next: ActionState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        trace!(
            action = %self.step.action,
            entity = %self.step.entity,
            from = self.state.as_label(),
            to = next.as_label(),
            "action state"
        );
        self.state = next;
    }

    /// Moves to an end state.
    fn settle(&mut self, end: ActionState) {
        self.advance(end);
        debug_assert!(self.state.is_terminal(), "{:?} is not an end state", end);
    }

    /// Reports the action against `entity` from now on.
    fn rebind(&mut self, entity: Entity) -> Step {
        self.step = self.step.with_entity(entity);
        self.step
    }
}
