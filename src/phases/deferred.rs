//! The deferred pass and its cleanup passes.

use std::path::{Path, PathBuf};

use crate::effects::OperationHandler;
use crate::executor::{ExecutionError, ExecutionReport, Session, execute};
use crate::journal::{
    CleanupAction, Journal, base_path, cleanup_path, load_journal, remove_journal_file,
    save_journal,
};
use crate::types::Operation;

use super::{PhaseError, RunMode};

/// Result of a successful [`run_deferred`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The journal ran and both cleanup journals were persisted.
    Executed {
        report: ExecutionReport,
        commit_token: PathBuf,
        rollback_token: PathBuf,
    },
    /// A cleanup journal was replayed. Failures were logged, not returned.
    Finalized {
        action: CleanupAction,
        entries: usize,
        failures: usize,
    },
    /// The cleanup journal did not exist: the deferred pass already rolled
    /// back inline and removed it, or it was deleted by someone else.
    NothingToFinalize { action: CleanupAction },
}

/// Runs the journal named by `token` in `mode`.
///
/// In [`RunMode::Deferred`] the journal runs fail-fast and its compensations
/// are persisted next to it as the commit and rollback journals. The cleanup
/// modes run best-effort and always succeed.
pub fn run_deferred<H>(token: &Path, mode: RunMode, handler: &mut H) -> Result<RunOutcome, PhaseError>
where
    H: OperationHandler + ?Sized,
{
    match mode.cleanup_action() {
        None => run_primary(token, handler),
        Some(action) => Ok(finalize(token, action, handler)),
    }
}

fn run_primary<H>(token: &Path, handler: &mut H) -> Result<RunOutcome, PhaseError>
where
    H: OperationHandler + ?Sized,
{
    let journal = load_journal(token)?;
    tracing::info!(token = %token.display(), entries = journal.len(), "running deferred journal");

    let commit_token = cleanup_path(token, CleanupAction::Commit);
    let rollback_token = cleanup_path(token, CleanupAction::Rollback);

    let mut session = Session::new(&mut *handler, false);
    let result = execute(&journal, &mut session);

    // Whichever cleanup runs, the other one becomes stale.
    session
        .cleanup_mut(CleanupAction::Commit)
        .push(Operation::delete_file(path_string(&rollback_token)));
    session
        .cleanup_mut(CleanupAction::Rollback)
        .push(Operation::delete_file(path_string(&commit_token)));
    let (commit, rollback) = session.into_cleanup();

    let persisted = persist_cleanup(&commit_token, &commit)
        .and_then(|()| persist_cleanup(&rollback_token, &rollback));

    if let Err((path, source)) = persisted {
        tracing::error!(
            path = %path.display(),
            error = %source,
            "failed to persist cleanup journal, rolling back now"
        );
        rollback_inline(&rollback, handler);
        for stale in [&commit_token, &rollback_token] {
            discard(stale);
        }
        discard(token);
        return Err(PhaseError::CleanupPersistence {
            path,
            source,
            execution: result.err(),
        });
    }

    discard(token);

    match result {
        Ok(report) => {
            tracing::info!(executed = report.executed, "deferred journal complete");
            Ok(RunOutcome::Executed {
                report,
                commit_token,
                rollback_token,
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "deferred journal failed");
            Err(PhaseError::Execution(e))
        }
    }
}

fn persist_cleanup(path: &Path, journal: &Journal) -> Result<(), (PathBuf, std::io::Error)> {
    save_journal(path, journal).map_err(|e| (path.to_path_buf(), e))
}

/// Replays the rollback journal in-process when it could not be handed off.
fn rollback_inline<H>(rollback: &Journal, handler: &mut H)
where
    H: OperationHandler + ?Sized,
{
    let mut session = Session::new(handler, true);
    match execute(rollback, &mut session) {
        Ok(report) => tracing::info!(executed = report.executed, "inline rollback complete"),
        Err(e) => tracing::warn!(error = %e, "inline rollback incomplete"),
    }
}

fn finalize<H>(token: &Path, action: CleanupAction, handler: &mut H) -> RunOutcome
where
    H: OperationHandler + ?Sized,
{
    let journal = match load_journal(token) {
        Ok(journal) => journal,
        Err(e) if e.is_not_found() => {
            tracing::info!(token = %token.display(), %action, "no cleanup journal");
            return RunOutcome::NothingToFinalize { action };
        }
        Err(e) => {
            tracing::error!(error = %e, %action, "unreadable cleanup journal, discarding");
            discard_with_base(token);
            return RunOutcome::Finalized {
                action,
                entries: 0,
                failures: 0,
            };
        }
    };

    tracing::info!(token = %token.display(), %action, entries = journal.len(), "running cleanup journal");

    // Compensations recorded here are dropped: there is no cleanup of cleanup.
    let mut session = Session::new(handler, true);
    let failures = match execute(&journal, &mut session) {
        Ok(_) => 0,
        Err(e) => {
            tracing::warn!(error = %e, %action, "cleanup journal completed with failures");
            match e {
                ExecutionError::Completed { failures, .. } => failures,
                ExecutionError::Aborted(_) => 1,
            }
        }
    };

    discard_with_base(token);

    RunOutcome::Finalized {
        action,
        entries: journal.len(),
        failures,
    }
}

fn discard_with_base(token: &Path) {
    discard(token);
    if let Some((base, _)) = base_path(token) {
        discard(&base);
    }
}

fn discard(path: &Path) {
    if let Err(e) = remove_journal_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove journal file");
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
