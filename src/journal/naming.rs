//! Names of cleanup journals and their host properties.
//!
//! Nothing records where cleanup journals live. Both the deferred pass that
//! writes them and the host that later hands them back derive the paths from
//! the forward journal's path by inserting a two-character suffix before the
//! extension:
//!
//! ```text
//! /tmp/InstallTAPInterfaces1A2B.tmp
//! /tmp/InstallTAPInterfaces1A2B-cm.tmp   # commit cleanup
//! /tmp/InstallTAPInterfaces1A2B-rb.tmp   # rollback cleanup
//! ```

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// The two ways a transaction can be finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupAction {
    Commit,
    Rollback,
}

impl CleanupAction {
    pub const ALL: [CleanupAction; 2] = [CleanupAction::Commit, CleanupAction::Rollback];

    /// Suffix inserted into the journal filename.
    pub fn file_suffix(self) -> &'static str {
        match self {
            CleanupAction::Commit => "cm",
            CleanupAction::Rollback => "rb",
        }
    }

    /// Suffix appended to the action name to form the host property holding
    /// the cleanup token.
    pub fn property_suffix(self) -> &'static str {
        match self {
            CleanupAction::Commit => "Commit",
            CleanupAction::Rollback => "Rollback",
        }
    }

    /// The other finalization: a commit makes the rollback journal obsolete
    /// and vice versa.
    pub fn opposite(self) -> Self {
        match self {
            CleanupAction::Commit => CleanupAction::Rollback,
            CleanupAction::Rollback => CleanupAction::Commit,
        }
    }
}

impl fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.property_suffix())
    }
}

/// Derives the cleanup journal path for `base`.
pub fn cleanup_path(base: &Path, action: CleanupAction) -> PathBuf {
    let suffix = action.file_suffix();
    let Some(stem) = base.file_stem() else {
        let mut path = base.as_os_str().to_os_string();
        path.push("-");
        path.push(suffix);
        return PathBuf::from(path);
    };

    let mut name = OsString::from(stem);
    name.push("-");
    name.push(suffix);
    if let Some(ext) = base.extension() {
        name.push(".");
        name.push(ext);
    }
    base.with_file_name(name)
}

/// Recovers the forward journal path from a cleanup journal path.
///
/// Returns `None` if `path` does not carry a cleanup suffix.
pub fn base_path(path: &Path) -> Option<(PathBuf, CleanupAction)> {
    let stem = path.file_stem()?.to_str()?;
    CleanupAction::ALL.into_iter().find_map(|action| {
        let base_stem = stem.strip_suffix(action.file_suffix())?.strip_suffix('-')?;
        if base_stem.is_empty() {
            return None;
        }
        let name = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{base_stem}.{ext}"),
            None => base_stem.to_string(),
        };
        Some((path.with_file_name(name), action))
    })
}

/// Name of the host property holding a cleanup token for `action_name`.
pub fn cleanup_property(action_name: &str, action: CleanupAction) -> String {
    format!("{action_name}{}", action.property_suffix())
}
