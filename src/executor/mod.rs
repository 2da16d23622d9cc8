//! Journal replay.
//!
//! The executor walks a journal strictly in order, dispatching each
//! operation to the session's handler. Successful operations that can be
//! undone leave a compensating entry in one of the session's cleanup
//! journals.
//!
//! # Failure policy
//!
//! - **Fail-fast** (`continue_on_error == false`): the first failure stops the
//!   pass; later entries are never attempted.
//! - **Best-effort** (`continue_on_error == true`): every entry is attempted;
//!   the first failure is still reported once the pass completes.
//!
//! The two outcomes are distinguishable through [`ExecutionError`].

pub mod session;

use std::path::Path;

use thiserror::Error;

use crate::effects::{HandlerError, OperationHandler};
use crate::journal::{CleanupAction, Journal};
use crate::types::{Action, Operation};

pub use session::Session;

/// A single failed journal entry.
#[derive(Debug, Error)]
#[error("entry {index} ({operation}) failed: {source}")]
pub struct OperationError {
    /// Position of the entry within its journal.
    pub index: usize,
    pub operation: Operation,
    #[source]
    pub source: HandlerError,
}

/// Errors from a journal pass.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Fail-fast mode stopped at the first failure.
    #[error("execution aborted: {0}")]
    Aborted(OperationError),

    /// Best-effort mode ran every entry, but some failed.
    #[error("execution completed with {failures} failed entries, first: {first}")]
    Completed {
        first: OperationError,
        failures: usize,
    },
}

impl ExecutionError {
    /// The first failure of the pass.
    pub fn first_error(&self) -> &OperationError {
        match self {
            ExecutionError::Aborted(first) | ExecutionError::Completed { first, .. } => first,
        }
    }

    /// Returns true if every entry was attempted despite the failure.
    pub fn ran_to_completion(&self) -> bool {
        matches!(self, ExecutionError::Completed { .. })
    }
}

/// Summary of a pass in which every entry succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Number of entries executed.
    pub executed: usize,
}

/// Replays `journal` against `session`.
pub fn execute<H>(
    journal: &Journal,
    session: &mut Session<'_, H>,
) -> Result<ExecutionReport, ExecutionError>
where
    H: OperationHandler + ?Sized,
{
    let mut first_failure: Option<OperationError> = None;
    let mut failures = 0;

    for (index, op) in journal.iter().enumerate() {
        let result = execute_operation(op, session);
        session.handler().advance(op.cost());

        let Err(source) = result else {
            continue;
        };

        tracing::warn!(index, operation = %op, error = %source, "operation failed");
        let error = OperationError {
            index,
            operation: op.clone(),
            source,
        };

        if !session.continue_on_error() {
            return Err(ExecutionError::Aborted(error));
        }
        failures += 1;
        first_failure.get_or_insert(error);
    }

    match first_failure {
        None => Ok(ExecutionReport {
            executed: journal.len(),
        }),
        Some(first) => Err(ExecutionError::Completed { first, failures }),
    }
}

/// Performs one operation and records its compensation.
fn execute_operation<H>(op: &Operation, session: &mut Session<'_, H>) -> Result<(), HandlerError>
where
    H: OperationHandler + ?Sized,
{
    match op.action() {
        Action::EnableRollback(enabled) => {
            tracing::debug!(enabled, "rollback flag set");
            session.set_rollback_enabled(*enabled);
        }
        Action::CreateInterface(name) => {
            let id = session.handler().create_interface(name)?;
            tracing::info!(name = %name, id = %id, "interface created");
            if session.rollback_enabled() {
                session
                    .cleanup_mut(CleanupAction::Rollback)
                    .push(Operation::delete_interface_by_name(name.clone(), op.cost()));
            }
        }
        Action::DeleteInterfaceByName(name) => {
            session.handler().delete_interface_by_name(name)?;
            tracing::info!(name = %name, "interface deleted");
        }
        Action::DeleteFile(path) => {
            session.handler().delete_file(Path::new(path))?;
            tracing::debug!(path = %path, "file deleted");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{ProgressReply, ProgressSink};
    use crate::types::InterfaceId;

    /// Records every handler call; fails calls whose name is listed.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail: Vec<String>,
        advanced: u64,
    }

    impl Recorder {
        fn failing(names: &[&str]) -> Self {
            Recorder {
                fail: names.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn check(&self, name: &str) -> Result<(), HandlerError> {
            if self.fail.iter().any(|f| f == name) {
                Err(HandlerError::InterfaceNotFound {
                    name: name.to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl ProgressSink for Recorder {
        fn advance(&mut self, ticks: u32) -> ProgressReply {
            self.advanced += u64::from(ticks);
            ProgressReply::Continue
        }
    }

    impl OperationHandler for Recorder {
        fn create_interface(&mut self, name: &str) -> Result<InterfaceId, HandlerError> {
            self.calls.push(format!("create {name}"));
            self.check(name)?;
            Ok(InterfaceId::new(format!("id-{name}")))
        }

        fn delete_interface_by_name(&mut self, name: &str) -> Result<(), HandlerError> {
            self.calls.push(format!("delete {name}"));
            self.check(name)
        }

        fn delete_file(&mut self, path: &Path) -> Result<(), HandlerError> {
            self.calls.push(format!("rm {}", path.display()));
            self.check(&path.display().to_string())
        }
    }

    fn journal(ops: impl IntoIterator<Item = Operation>) -> Journal {
        ops.into_iter().collect()
    }

    #[test]
    fn runs_entries_in_order() {
        let mut handler = Recorder::default();
        let mut session = Session::new(&mut handler, false);
        let j = journal([
            Operation::create_interface("A", 1),
            Operation::delete_interface_by_name("B", 1),
            Operation::delete_file("/tmp/C"),
        ]);

        let report = execute(&j, &mut session).unwrap();

        assert_eq!(report.executed, 3);
        assert_eq!(handler.calls, vec!["create A", "delete B", "rm /tmp/C"]);
    }

    #[test]
    fn fail_fast_stops_at_first_failure() {
        let mut handler = Recorder::failing(&["B"]);
        let mut session = Session::new(&mut handler, false);
        let j = journal([
            Operation::create_interface("A", 0),
            Operation::create_interface("B", 0),
            Operation::create_interface("C", 0),
        ]);

        let err = execute(&j, &mut session).unwrap_err();

        assert!(!err.ran_to_completion());
        assert_eq!(err.first_error().index, 1);
        assert_eq!(
            err.first_error().operation,
            Operation::create_interface("B", 0)
        );
        assert_eq!(handler.calls, vec!["create A", "create B"]);
    }

    #[test]
    fn continue_mode_runs_everything_and_keeps_first_error() {
        let mut handler = Recorder::failing(&["B", "C"]);
        let mut session = Session::new(&mut handler, true);
        let j = journal([
            Operation::create_interface("A", 0),
            Operation::delete_interface_by_name("B", 0),
            Operation::delete_interface_by_name("C", 0),
            Operation::create_interface("D", 0),
        ]);

        let err = execute(&j, &mut session).unwrap_err();

        assert!(err.ran_to_completion());
        assert_eq!(err.first_error().index, 1);
        assert!(matches!(err, ExecutionError::Completed { failures: 2, .. }));
        assert_eq!(
            handler.calls,
            vec!["create A", "delete B", "delete C", "create D"]
        );
    }

    #[test]
    fn create_appends_rollback_delete_only() {
        let mut handler = Recorder::default();
        let mut session = Session::new(&mut handler, false);

        execute(&journal([Operation::create_interface("X", 16384)]), &mut session).unwrap();

        assert_eq!(
            session.rollback_cleanup(),
            &journal([Operation::delete_interface_by_name("X", 16384)])
        );
        assert!(session.commit_cleanup().is_empty());
    }

    #[test]
    fn failed_create_leaves_no_compensation() {
        let mut handler = Recorder::failing(&["X"]);
        let mut session = Session::new(&mut handler, true);

        let _ = execute(&journal([Operation::create_interface("X", 1)]), &mut session);

        assert!(session.cleanup(CleanupAction::Rollback).is_empty());
    }

    #[test]
    fn disabled_rollback_suppresses_compensation() {
        let mut handler = Recorder::default();
        let mut session = Session::new(&mut handler, false);
        let j = journal([
            Operation::create_interface("A", 1),
            Operation::enable_rollback(false),
            Operation::create_interface("B", 1),
            Operation::enable_rollback(true),
            Operation::create_interface("C", 1),
        ]);

        execute(&j, &mut session).unwrap();

        let (commit, rollback) = session.into_cleanup();
        assert!(commit.is_empty());
        assert_eq!(
            rollback,
            journal([
                Operation::delete_interface_by_name("A", 1),
                Operation::delete_interface_by_name("C", 1),
            ])
        );
    }

    #[test]
    fn deletions_have_no_compensation() {
        let mut handler = Recorder::default();
        let mut session = Session::new(&mut handler, false);
        let j = journal([
            Operation::delete_interface_by_name("A", 1),
            Operation::delete_file("/tmp/x"),
        ]);

        execute(&j, &mut session).unwrap();

        assert!(session.commit_cleanup().is_empty());
        assert!(session.rollback_cleanup().is_empty());
    }

    #[test]
    fn progress_advances_by_cost_for_every_entry() {
        let mut handler = Recorder::failing(&["B"]);
        let mut session = Session::new(&mut handler, true);
        let j = journal([
            Operation::create_interface("A", 5),
            Operation::create_interface("B", 7),
        ]);

        let _ = execute(&j, &mut session);

        assert_eq!(handler.advanced, 12);
    }

    #[test]
    fn empty_journal_succeeds() {
        let mut handler = Recorder::default();
        let mut session = Session::new(&mut handler, false);
        assert_eq!(
            execute(&Journal::new(), &mut session).unwrap(),
            ExecutionReport { executed: 0 }
        );
    }
}
