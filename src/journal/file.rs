//! Journal files.
//!
//! A journal file is written once by the process that built the journal and
//! read once by the process the token is handed to. There is a single writer
//! and a single reader over the file's lifetime, so no locking is done.
//!
//! # Durability
//!
//! Saving fsyncs both the file and its directory: the next phase may run in a
//! different process after the host has been interrupted, and a journal that
//! exists only in the page cache is a lost journal.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

use super::Journal;
use super::codec::DecodeError;

/// Errors that can occur while loading a journal file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file does not exist.
    #[error("journal file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read journal {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but its content is malformed.
    #[error("corrupt journal {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}

/// Reserves a new, uniquely named journal file in `dir`.
///
/// The file is created empty as `<prefix><random>.tmp` and left on disk; its
/// absolute path is the correlation token for the journal later saved there.
pub fn create_journal_file(dir: &Path, prefix: &str) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?
        .into_temp_path()
        .keep()
        .map_err(|e| e.error)?;

    if path.is_absolute() {
        Ok(path)
    } else {
        std::path::absolute(&path)
    }
}

/// Writes `journal` to `path`, replacing any previous content.
pub fn save_journal(path: &Path, journal: &Journal) -> io::Result<()> {
    let bytes = journal
        .encode()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(&bytes)?;
        fsync_file(&file)?;
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fsync_dir(parent)?;
    }

    tracing::debug!(path = %path.display(), entries = journal.len(), "saved journal");
    Ok(())
}

/// Reads and decodes the journal file at `path`.
///
/// A missing file is reported as [`LoadError::NotFound`] so callers can
/// decide whether absence is acceptable for their phase.
pub fn load_journal(path: &Path) -> Result<Journal, LoadError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let journal = Journal::decode(Bytes::from(bytes)).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), entries = journal.len(), "loaded journal");
    Ok(journal)
}

/// Deletes a journal file.
///
/// Returns `Ok(false)` if the file was already gone.
pub fn remove_journal_file(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Directory entries (creation, deletion) are only durable once the
/// directory itself is synced.
#[cfg(unix)]
fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
