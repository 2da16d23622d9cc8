//! Execution context for one pass over a journal.

use crate::effects::OperationHandler;
use crate::journal::{CleanupAction, Journal};

/// Everything a journal pass needs, passed explicitly to the executor.
///
/// The session owns the two cleanup journals it accumulates while running:
/// what to do if the transaction commits, and what to do if it rolls back.
pub struct Session<'a, H: ?Sized> {
    handler: &'a mut H,
    continue_on_error: bool,
    rollback_enabled: bool,
    commit_cleanup: Journal,
    rollback_cleanup: Journal,
}

impl<'a, H> Session<'a, H>
where
    H: OperationHandler + ?Sized,
{
    /// Creates a session with rollback enabled and empty cleanup journals.
    ///
    /// A journal without an `enable-rollback` entry still records a rollback
    /// entry for every interface it creates. Planned journals always start
    /// with that entry, so the default only matters for hand-built ones.
    pub fn new(handler: &'a mut H, continue_on_error: bool) -> Self {
        Session {
            handler,
            continue_on_error,
            rollback_enabled: true,
            commit_cleanup: Journal::new(),
            rollback_cleanup: Journal::new(),
        }
    }

    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    pub fn rollback_enabled(&self) -> bool {
        self.rollback_enabled
    }

    pub fn set_rollback_enabled(&mut self, enabled: bool) {
        self.rollback_enabled = enabled;
    }

    pub fn handler(&mut self) -> &mut H {
        self.handler
    }

    pub fn commit_cleanup(&self) -> &Journal {
        &self.commit_cleanup
    }

    pub fn rollback_cleanup(&self) -> &Journal {
        &self.rollback_cleanup
    }

    /// The cleanup journal for `action`.
    pub fn cleanup(&self, action: CleanupAction) -> &Journal {
        match action {
            CleanupAction::Commit => &self.commit_cleanup,
            CleanupAction::Rollback => &self.rollback_cleanup,
        }
    }

    /// Mutable access to the cleanup journal for `action`.
    pub fn cleanup_mut(&mut self, action: CleanupAction) -> &mut Journal {
        match action {
            CleanupAction::Commit => &mut self.commit_cleanup,
            CleanupAction::Rollback => &mut self.rollback_cleanup,
        }
    }

    /// Ends the session, handing back `(commit_cleanup, rollback_cleanup)`.
    pub fn into_cleanup(self) -> (Journal, Journal) {
        (self.commit_cleanup, self.rollback_cleanup)
    }
}
