//! Confirmation dialog state machine for destructive actions.
//!
//! Deletes and cart clears never run off a single click: the dialog opens
//! against a target, the confirm control disables while the mutation is in
//! flight, and the dialog refuses dismissal until the mutation settles.

use crate::action::ActionState;

/// Confirmation dialog over a target of type `T` (an entity ID, or `()`
/// for singleton actions like clearing the cart).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog<T> {
    target: Option<T>,
    action: ActionState,
}

impl<T> Default for ConfirmDialog<T> {
    fn default() -> Self {
        Self {
            target: None,
            action: ActionState::Idle,
        }
    }
}

impl<T: Clone> ConfirmDialog<T> {
    /// Closed dialog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the dialog for `target`. Ignored while a mutation is in flight.
    pub fn open(&mut self, target: T) {
        if self.action.is_pending() {
            return;
        }
        self.target = Some(target);
        self.action.reset();
    }

    /// Dismiss the dialog. Returns false (and stays open) while the
    /// mutation is in flight.
    pub fn dismiss(&mut self) -> bool {
        if self.action.is_pending() {
            return false;
        }
        self.target = None;
        self.action.reset();
        true
    }

    /// Whether the dialog is visible.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.target.is_some()
    }

    /// Target awaiting confirmation.
    #[must_use]
    pub const fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    /// Whether the confirm control accepts a click.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        self.target.is_some() && self.action.is_enabled()
    }

    /// Flip to in-flight and yield the target. `None` when the dialog is
    /// closed or the mutation already started; the caller runs the mutation
    /// and reports back through [`Self::complete`] or [`Self::fail`].
    pub fn begin(&mut self) -> Option<T> {
        if !self.can_confirm() {
            return None;
        }
        let target = self.target.clone()?;
        self.action.begin().ok()?;
        Some(target)
    }

    /// The mutation finished: close the dialog.
    pub fn complete(&mut self) {
        self.action.succeed();
        self.target = None;
    }

    /// The mutation failed: keep the dialog open with confirm re-enabled
    /// and surface the message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.action.fail(message);
    }

    /// Whether the confirmed mutation is in flight (dialog locked).
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.action.is_pending()
    }

    /// Failure message from the last confirm attempt.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.action.error()
    }
}
