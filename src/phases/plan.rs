//! The planning phase: build journals and hand their tokens to the host.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::JournalConfig;
use crate::host::PlanningHost;
use crate::journal::{
    CleanupAction, Journal, cleanup_path, cleanup_property, create_journal_file,
    remove_journal_file, save_journal,
};
use crate::planner;

use super::PhaseError;

/// A journal persisted for a deferred action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedJournal {
    /// Deferred action the journal belongs to.
    pub action: String,
    /// Path of the journal file; the value published as the token.
    pub token: PathBuf,
    /// Number of entries written.
    pub entries: usize,
}

/// Result of the planning phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The host has no interface table. Nothing was written.
    NothingToPlan,
    /// Journals were written, in action order (install first).
    Planned(Vec<PlannedJournal>),
}

/// Plans and persists the install and uninstall journals.
pub fn plan_phase<H>(host: &mut H, config: &JournalConfig) -> Result<PlanOutcome, PhaseError>
where
    H: PlanningHost + ?Sized,
{
    let Some(plan) = planner::plan(host, config)? else {
        return Ok(PlanOutcome::NothingToPlan);
    };

    let journals = [
        (config.install_action.as_str(), &plan.forward),
        (config.uninstall_action.as_str(), &plan.inverse),
    ];
    let planned = persist_plan(host, &config.journal_dir, &journals)?;
    Ok(PlanOutcome::Planned(planned))
}

/// Writes each journal to a fresh file in `dir` and publishes its tokens.
///
/// For action `A` the host receives property `A` (the journal path),
/// `ACommit` and `ARollback` (the derived cleanup paths).
///
/// Either every journal is persisted or none is: on failure, files already
/// written by this call are deleted before the error is returned.
pub fn persist_plan<H>(
    host: &mut H,
    dir: &Path,
    journals: &[(&str, &Journal)],
) -> Result<Vec<PlannedJournal>, PhaseError>
where
    H: PlanningHost + ?Sized,
{
    let mut written = Vec::with_capacity(journals.len());
    let mut planned = Vec::with_capacity(journals.len());

    for &(action, journal) in journals {
        match persist_one(host, dir, action, journal, &mut written) {
            Ok(p) => planned.push(p),
            Err(e) => {
                tracing::error!(action, error = %e, "failed to persist planned journal");
                for path in written.iter().rev() {
                    if let Err(err) = remove_journal_file(path) {
                        tracing::warn!(path = %path.display(), error = %err, "failed to remove journal");
                    }
                }
                return Err(e);
            }
        }
    }

    Ok(planned)
}

fn persist_one<H>(
    host: &mut H,
    dir: &Path,
    action: &str,
    journal: &Journal,
    written: &mut Vec<PathBuf>,
) -> Result<PlannedJournal, PhaseError>
where
    H: PlanningHost + ?Sized,
{
    let token = create_journal_file(dir, action).map_err(|source| PhaseError::Persistence {
        path: dir.to_path_buf(),
        source,
    })?;
    written.push(token.clone());

    host.set_property(action, token_str(&token)?)?;
    for cleanup in CleanupAction::ALL {
        let path = cleanup_path(&token, cleanup);
        host.set_property(&cleanup_property(action, cleanup), token_str(&path)?)?;
    }

    save_journal(&token, journal).map_err(|source| PhaseError::Persistence {
        path: token.clone(),
        source,
    })?;

    tracing::info!(action, token = %token.display(), entries = journal.len(), "journal planned");
    Ok(PlannedJournal {
        action: action.to_string(),
        token,
        entries: journal.len(),
    })
}

/// Tokens travel through string properties, so paths must be valid UTF-8.
fn token_str(path: &Path) -> Result<&str, PhaseError> {
    path.to_str().ok_or_else(|| PhaseError::Persistence {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path is not valid UTF-8"),
    })
}
