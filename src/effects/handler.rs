//! Handler and progress traits.
//!
//! Implementations are constructed with whatever system context they need,
//! so the journal passes them nothing but the operation payload.
//!
//! # Example (recording mock for testing)
//!
//! ```ignore
//! #[derive(Default)]
//! struct Recorder {
//!     calls: Vec<String>,
//! }
//!
//! impl ProgressSink for Recorder {}
//!
//! impl OperationHandler for Recorder {
//!     fn create_interface(&mut self, name: &str) -> Result<InterfaceId, HandlerError> {
//!         self.calls.push(format!("create {name}"));
//!         Ok(InterfaceId::new(name))
//!     }
//!
//!     fn delete_interface_by_name(&mut self, name: &str) -> Result<(), HandlerError> {
//!         self.calls.push(format!("delete {name}"));
//!         Ok(())
//!     }
//! }
//! ```

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::types::InterfaceId;

/// Errors reported by operation handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An external command exited unsuccessfully.
    #[error("command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// No interface carries the requested name.
    #[error("interface not found: {name}")]
    InterfaceNotFound { name: String },

    /// The name cannot be used for an interface on this system.
    #[error("invalid interface name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Reply from the host's progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressReply {
    Continue,
    /// The user asked to cancel the installation.
    Cancel,
}

/// Receives progress accounting from planning and execution.
///
/// Every method defaults to a no-op that never cancels.
pub trait ProgressSink {
    /// Adds `ticks` to the expected total of the progress indicator.
    fn add_total(&mut self, _ticks: u32) -> ProgressReply {
        ProgressReply::Continue
    }

    /// Moves the progress indicator forward by `ticks`.
    fn advance(&mut self, _ticks: u32) -> ProgressReply {
        ProgressReply::Continue
    }

    /// Reports a line of detail about the action in progress.
    fn action_data(&mut self, _text: &str) {}
}

/// Performs the privileged work behind each operation kind.
pub trait OperationHandler: ProgressSink {
    /// Creates an interface with the given display name.
    fn create_interface(&mut self, name: &str) -> Result<InterfaceId, HandlerError>;

    /// Deletes the interface with the given display name.
    fn delete_interface_by_name(&mut self, name: &str) -> Result<(), HandlerError>;

    /// Deletes a file. A file that is already gone counts as deleted.
    fn delete_file(&mut self, path: &Path) -> Result<(), HandlerError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct NoInterfaces;

    impl ProgressSink for NoInterfaces {}

    impl OperationHandler for NoInterfaces {
        fn create_interface(&mut self, name: &str) -> Result<InterfaceId, HandlerError> {
            Err(HandlerError::InvalidName {
                name: name.to_string(),
                reason: "unsupported",
            })
        }

        fn delete_interface_by_name(&mut self, name: &str) -> Result<(), HandlerError> {
            Err(HandlerError::InterfaceNotFound {
                name: name.to_string(),
            })
        }
    }

    #[test]
    fn default_delete_file_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal-rb.tmp");
        std::fs::write(&path, b"x").unwrap();

        NoInterfaces.delete_file(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn default_delete_file_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        NoInterfaces
            .delete_file(&dir.path().join("missing.tmp"))
            .unwrap();
    }

    #[test]
    fn default_delete_file_fails_on_directory() {
        let dir = tempdir().unwrap();
        let err = NoInterfaces.delete_file(dir.path()).unwrap_err();
        assert!(matches!(err, HandlerError::Io(_)), "{err}");
    }

    #[test]
    fn default_progress_never_cancels() {
        let mut sink = NoInterfaces;
        assert_eq!(sink.add_total(10), ProgressReply::Continue);
        assert_eq!(sink.advance(10), ProgressReply::Continue);
    }
}
