//! Phase orchestration across process boundaries.
//!
//! A transaction touches the journal three times, each time from a separate
//! invocation that shares nothing with the others but the filesystem:
//!
//! - **Planned**: [`plan_phase`] builds the install and uninstall journals and
//!   persists them, publishing one token (file path) per journal plus the
//!   derived commit and rollback tokens as host properties.
//! - **Executed**: [`run_deferred`] in [`RunMode::Deferred`] loads a journal,
//!   replays it fail-fast, and persists the commit and rollback cleanup
//!   journals the replay produced.
//! - **Finalized**: [`run_deferred`] in [`RunMode::Commit`] or
//!   [`RunMode::Rollback`] replays whichever cleanup journal matches the
//!   transaction outcome, best-effort.
//!
//! The host alone decides which token runs in which mode; nothing here
//! chooses between commit and rollback.

pub mod deferred;
pub mod plan;


use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::executor::ExecutionError;
use crate::host::HostError;
use crate::journal::{CleanupAction, LoadError};
use crate::planner::PlanError;

pub use deferred::{RunOutcome, run_deferred};
pub use plan::{PlanOutcome, PlannedJournal, persist_plan, plan_phase};

/// How the host invoked the deferred pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// The primary pass over a planned journal.
    Deferred,
    /// The transaction committed: run the commit cleanup journal.
    Commit,
    /// The transaction rolled back: run the rollback cleanup journal.
    Rollback,
}

impl RunMode {
    /// Returns true for commit and rollback passes.
    pub fn is_cleanup(self) -> bool {
        self.cleanup_action().is_some()
    }

    pub fn cleanup_action(self) -> Option<CleanupAction> {
        match self {
            RunMode::Deferred => None,
            RunMode::Commit => Some(CleanupAction::Commit),
            RunMode::Rollback => Some(CleanupAction::Rollback),
        }
    }
}

/// Errors surfaced to the host from a phase.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// Planning failed.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The host refused a property update.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A planned journal could not be written.
    #[error("failed to persist journal {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The journal named by the token could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The primary pass failed. Cleanup journals were still persisted.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A cleanup journal could not be written. The rollback journal has
    /// already been replayed inline.
    #[error("failed to persist cleanup journal {}: {source}", path.display())]
    CleanupPersistence {
        path: PathBuf,
        #[source]
        source: io::Error,
        /// Failure of the primary pass, if it failed too.
        execution: Option<ExecutionError>,
    },
}

impl PhaseError {
    /// Returns true if the user cancelled rather than something failing.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(self, PhaseError::Plan(PlanError::UserCancelled))
    }
}
