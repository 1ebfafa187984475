use thiserror::Error;
use uuid::Uuid;

/// Screens a session can be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Filterable, editable match list.
    List,
    /// Per-game results of one match.
    Detail(u32),
    /// Attachments of one match.
    Media(u32),
}

impl Screen {
    /// Match the screen is focused on, if any.
    pub fn match_id(&self) -> Option<u32> {
        match self {
            Screen::List => None,
            Screen::Detail(id) | Screen::Media(id) => Some(*id),
        }
    }
}

/// Events that can be applied to the navigation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    /// The detail toggle of a list row was switched on.
    OpenDetail(u32),
    /// The media toggle of a list row was switched on.
    OpenMedia(u32),
    /// Explicit "back to list" action.
    Back,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while on {from:?}")]
pub struct InvalidTransition {
    /// The screen the session was on when the invalid event was received.
    pub from: Screen,
    /// The event that cannot be applied from this screen.
    pub event: NavigationEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A transition is already pending and must be applied first.
    #[error("a transition is already pending")]
    AlreadyPending,
    /// The event is not allowed from the current screen.
    #[error(transparent)]
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// No transition is currently pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("pending transition {expected} does not match {got}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not taken effect yet.
///
/// Planning first lets callers reset the triggering action flag before the
/// screen actually changes.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Token to hand back to [`NavigationStateMachine::apply`].
    pub id: PlanId,
    /// Screen shown once the plan is applied.
    pub to: Screen,
}

/// Snapshot of the current navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Screen currently shown.
    pub screen: Screen,
    /// Number of transitions applied so far.
    pub version: usize,
    /// Target of a planned but not yet applied transition.
    pub pending: Option<Screen>,
}

/// List / Detail / Media navigation of one session.
#[derive(Debug, Clone)]
pub struct NavigationStateMachine {
    screen: Screen,
    version: usize,
    pending: Option<Plan>,
}

impl Default for NavigationStateMachine {
    fn default() -> Self {
        Self {
            screen: Screen::List,
            version: 0,
            pending: None,
        }
    }
}

impl NavigationStateMachine {
    /// Create a new state machine on the list screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Current screen, transition count and pending target.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            screen: self.screen,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate `event` against the current screen and keep it pending.
    pub fn plan(&mut self, event: NavigationEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let to = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            to,
        };
        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition and return the new screen.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<Screen, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        self.screen = plan.to;
        self.version += 1;

        Ok(self.screen)
    }

    /// Plan and apply in one step, for transitions with no side work attached.
    pub fn transition(&mut self, event: NavigationEvent) -> Result<Screen, PlanError> {
        let plan = self.plan(event)?;
        self.pending = None;
        self.screen = plan.to;
        self.version += 1;
        Ok(self.screen)
    }

    fn compute_transition(&self, event: NavigationEvent) -> Result<Screen, InvalidTransition> {
        let next = match (self.screen, event) {
            (Screen::List, NavigationEvent::OpenDetail(id)) => Screen::Detail(id),
            (Screen::List, NavigationEvent::OpenMedia(id)) => Screen::Media(id),
            (Screen::Detail(_) | Screen::Media(_), NavigationEvent::Back) => Screen::List,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_screen_is_list() {
        let sm = NavigationStateMachine::new();
        assert_eq!(sm.screen(), Screen::List);
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn detail_and_media_cycle_through_list() {
        let mut sm = NavigationStateMachine::new();
        assert_eq!(
            sm.transition(NavigationEvent::OpenDetail(7)).unwrap(),
            Screen::Detail(7)
        );
        assert_eq!(sm.transition(NavigationEvent::Back).unwrap(), Screen::List);
        assert_eq!(
            sm.transition(NavigationEvent::OpenMedia(3)).unwrap(),
            Screen::Media(3)
        );
        assert_eq!(sm.transition(NavigationEvent::Back).unwrap(), Screen::List);
        assert_eq!(sm.snapshot().version, 4);
    }

    #[test]
    fn back_from_list_is_invalid() {
        let mut sm = NavigationStateMachine::new();
        let err = sm.plan(NavigationEvent::Back).unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidTransition(InvalidTransition {
                from: Screen::List,
                event: NavigationEvent::Back,
            })
        );
    }

    #[test]
    fn detail_cannot_jump_to_media() {
        let mut sm = NavigationStateMachine::new();
        sm.transition(NavigationEvent::OpenDetail(1)).unwrap();
        assert!(matches!(
            sm.plan(NavigationEvent::OpenMedia(1)),
            Err(PlanError::InvalidTransition(_))
        ));
        assert_eq!(sm.screen(), Screen::Detail(1));
    }

    #[test]
    fn screen_changes_only_on_apply() {
        let mut sm = NavigationStateMachine::new();
        let plan = sm.plan(NavigationEvent::OpenMedia(2)).unwrap();
        assert_eq!(sm.screen(), Screen::List);
        assert_eq!(sm.snapshot().pending, Some(Screen::Media(2)));
        assert_eq!(
            sm.plan(NavigationEvent::OpenDetail(2)).unwrap_err(),
            PlanError::AlreadyPending
        );
        assert_eq!(sm.apply(plan.id).unwrap(), Screen::Media(2));
        assert_eq!(sm.snapshot().pending, None);
    }

    #[test]
    fn apply_with_wrong_id_keeps_plan_pending() {
        let mut sm = NavigationStateMachine::new();
        let plan = sm.plan(NavigationEvent::OpenDetail(5)).unwrap();
        assert!(matches!(
            sm.apply(Uuid::new_v4()),
            Err(ApplyError::IdMismatch { .. })
        ));
        assert_eq!(sm.apply(plan.id).unwrap(), Screen::Detail(5));
    }

    #[test]
    fn plan_carries_only_its_target() {
        let mut sm = NavigationStateMachine::new();
        let plan = sm.plan(NavigationEvent::OpenDetail(1)).unwrap();
        assert_eq!(plan.to, Screen::Detail(1));
        assert_eq!(sm.apply(plan.id).unwrap(), plan.to);
        assert!(matches!(sm.apply(plan.id), Err(ApplyError::NoPending)));
    }
}
