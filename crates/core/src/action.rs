//! Three-state tracking for remote actions.
//!
//! Every control that fires a Data API request owns one [`ActionState`].
//! `begin` flips it to pending and refuses a second trigger while the first
//! is still in flight (requests are never cancelled, the control just stays
//! disabled); `succeed` returns it to idle; `fail` re-enables the control
//! and carries the message to surface next to it.

use thiserror::Error;

/// Returned by [`ActionState::begin`] while a request is already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("an operation is already in flight for this control")]
pub struct AlreadyPending;

/// Lifecycle of one control's remote action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionState {
    /// No request in flight; the control is enabled.
    #[default]
    Idle,
    /// A request is in flight; the control is disabled.
    Pending,
    /// The last request failed; the control is enabled again and the
    /// message should be shown beside it.
    Failed(String),
}

impl ActionState {
    /// Try to start a request.
    ///
    /// # Errors
    ///
    /// [`AlreadyPending`] while a request is in flight.
    pub fn begin(&mut self) -> Result<(), AlreadyPending> {
        if matches!(self, Self::Pending) {
            return Err(AlreadyPending);
        }
        *self = Self::Pending;
        Ok(())
    }

    /// Mark the in-flight request as completed.
    pub fn succeed(&mut self) {
        *self = Self::Idle;
    }

    /// Mark the in-flight request as failed, surfacing `message`.
    pub fn fail(&mut self, message: impl Into<String>) {
        *self = Self::Failed(message.into());
    }

    /// Clear a lingering failure, e.g. when the user edits the field that
    /// caused it.
    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    /// Whether the owning control accepts a new trigger.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Failure message from the last attempt, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            Self::Idle | Self::Pending => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_refuses_a_second_trigger_while_pending() {
        let mut state = ActionState::default();
        state.begin().unwrap();
        assert!(state.is_pending());
        assert!(!state.is_enabled());
        assert_eq!(state.begin(), Err(AlreadyPending));
    }

    #[test]
    fn test_success_returns_to_idle() {
        let mut state = ActionState::default();
        state.begin().unwrap();
        state.succeed();
        assert_eq!(state, ActionState::Idle);
        assert!(state.is_enabled());
    }

    #[test]
    fn test_failure_reenables_and_keeps_the_message() {
        let mut state = ActionState::default();
        state.begin().unwrap();
        state.fail("sin conexión");
        assert!(state.is_enabled());
        assert_eq!(state.error(), Some("sin conexión"));

        // A retry is allowed after a failure.
        state.begin().unwrap();
        assert!(state.is_pending());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_reset_clears_a_lingering_failure() {
        let mut state = ActionState::Failed("viejo error".to_string());
        state.reset();
        assert_eq!(state, ActionState::Idle);
    }
}
