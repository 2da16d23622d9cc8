//! Operation handler backed by the `ip` command and sysfs.
//!
//! Interfaces are created as persistent TAP devices
//! (`ip tuntap add dev <name> mode tap`) and removed with
//! `ip link delete <name>`. The interface index read back from sysfs serves as
//! the interface id.

use std::path::PathBuf;
use std::process::{Command, Output};

use crate::types::InterfaceId;

use super::handler::{HandlerError, OperationHandler, ProgressSink};

/// Longest interface name the kernel accepts (`IFNAMSIZ - 1`).
const MAX_NAME_LEN: usize = 15;

/// Handler that drives the system's `ip` tool.
#[derive(Debug, Clone)]
pub struct IpCommandHandler {
    /// Program to run (normally `ip`).
    program: PathBuf,
    /// Root of the network class directory (normally `/sys/class/net`).
    sysfs_root: PathBuf,
}

impl Default for IpCommandHandler {
    fn default() -> Self {
        IpCommandHandler {
            program: PathBuf::from("ip"),
            sysfs_root: PathBuf::from("/sys/class/net"),
        }
    }
}

impl IpCommandHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a different `ip` executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Uses a different sysfs network directory.
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    fn interface_dir(&self, name: &str) -> PathBuf {
        self.sysfs_root.join(name)
    }

    fn run(&self, args: &[&str]) -> Result<Output, HandlerError> {
        let output = Command::new(&self.program).args(args).output()?;

        if output.status.success() {
            Ok(output)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let command = format!("{} {}", self.program.display(), args.join(" "));
            Err(HandlerError::CommandFailed { command, stderr })
        }
    }

    fn read_ifindex(&self, name: &str) -> Result<InterfaceId, HandlerError> {
        let raw = std::fs::read_to_string(self.interface_dir(name).join("ifindex"))?;
        Ok(InterfaceId::new(raw.trim()))
    }
}

/// Checks `name` against the kernel's interface naming rules.
fn validate_name(name: &str) -> Result<(), HandlerError> {
    let invalid = |reason| {
        Err(HandlerError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("empty");
    }
    if name.len() > MAX_NAME_LEN {
        return invalid("longer than 15 bytes");
    }
    if name == "." || name == ".." {
        return invalid("reserved");
    }
    if name
        .chars()
        .any(|c| c == '/' || c == ':' || c.is_whitespace() || c.is_control())
    {
        return invalid("contains '/', ':', whitespace or control characters");
    }
    Ok(())
}

impl ProgressSink for IpCommandHandler {}

impl OperationHandler for IpCommandHandler {
    fn create_interface(&mut self, name: &str) -> Result<InterfaceId, HandlerError> {
        validate_name(name)?;
        self.run(&["tuntap", "add", "dev", name, "mode", "tap"])?;

        // The interface exists from here on; the create must report success.
        let id = match self.read_ifindex(name) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(name, error = %e, "created interface but could not read its index");
                InterfaceId::new(name)
            }
        };
        tracing::info!(name, id = %id, "created interface");
        Ok(id)
    }

    fn delete_interface_by_name(&mut self, name: &str) -> Result<(), HandlerError> {
        validate_name(name)?;
        if !self.interface_dir(name).exists() {
            return Err(HandlerError::InterfaceNotFound {
                name: name.to_string(),
            });
        }
        self.run(&["link", "delete", name])?;
        tracing::info!(name, "deleted interface");
        Ok(())
    }
}
