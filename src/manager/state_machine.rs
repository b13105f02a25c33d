use crate::manager::error::{DeletionError, DeletionResult};
use serde::Serialize;

/// Deletion lifecycle of one committed file.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum DeletionState {
    Present,
    Deleting,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionEvent {
    Begin,
    Confirmed,
    Failed,
}

impl DeletionState {
    /// Apply an event. A second `Begin` while deleting is refused, which is
    /// what keeps double-clicks from issuing two requests.
    pub fn transition(self, id: &str, event: DeletionEvent) -> DeletionResult<DeletionState> {
        match (self, event) {
            (DeletionState::Present, DeletionEvent::Begin) => Ok(DeletionState::Deleting),
            (DeletionState::Deleting, DeletionEvent::Begin) => {
                Err(DeletionError::AlreadyDeleting(id.to_string()))
            }
            (DeletionState::Absent, DeletionEvent::Begin) => {
                Err(DeletionError::NotFound(id.to_string()))
            }
            (DeletionState::Deleting, DeletionEvent::Confirmed) => Ok(DeletionState::Absent),
            (DeletionState::Deleting, DeletionEvent::Failed) => Ok(DeletionState::Present),
            (state, event) => Err(DeletionError::InvalidTransition(format!(
                "Cannot handle {event:?} for {id} in state {state:?}"
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeletionState::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_deletion() {
        let state = DeletionState::Present
            .transition("f1", DeletionEvent::Begin)
            .unwrap();
        assert_eq!(state, DeletionState::Deleting);

        let state = state.transition("f1", DeletionEvent::Confirmed).unwrap();
        assert_eq!(state, DeletionState::Absent);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failed_deletion_reverts() {
        let state = DeletionState::Present
            .transition("f1", DeletionEvent::Begin)
            .unwrap()
            .transition("f1", DeletionEvent::Failed)
            .unwrap();

        assert_eq!(state, DeletionState::Present);
    }

    #[test]
    fn test_double_begin_refused() {
        let result = DeletionState::Deleting.transition("f1", DeletionEvent::Begin);
        assert_eq!(result, Err(DeletionError::AlreadyDeleting("f1".into())));
    }

    #[test]
    fn test_begin_on_absent_is_not_found() {
        let result = DeletionState::Absent.transition("f1", DeletionEvent::Begin);
        assert_eq!(result, Err(DeletionError::NotFound("f1".into())));
    }

    #[test]
    fn test_invalid_transition() {
        // Cannot confirm a deletion that never started
        let result = DeletionState::Present.transition("f1", DeletionEvent::Confirmed);
        assert!(matches!(result, Err(DeletionError::InvalidTransition(_))));
    }
}
