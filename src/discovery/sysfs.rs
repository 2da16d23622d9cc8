//! Enumerates interfaces from `/sys/class/net`.
//!
//! Interfaces backed by the tun driver expose `tun_flags`; its mode bit is
//! reported as the hardware ID (`tun` or `tap`). Everything else has no
//! hardware IDs. The interface index is the id.

use std::io;
use std::path::{Path, PathBuf};

use super::{DiscoveryError, InterfaceEnumerator, InterfaceInfo, Result};

const IFF_TUN: u32 = 0x0001;
const IFF_TAP: u32 = 0x0002;

/// Reads interfaces from a sysfs `class/net` directory.
#[derive(Debug, Clone)]
pub struct SysfsEnumerator {
    root: PathBuf,
}

impl Default for SysfsEnumerator {
    fn default() -> Self {
        Self::new("/sys/class/net")
    }
}

impl SysfsEnumerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SysfsEnumerator { root: root.into() }
    }

    fn read_interface(&self, name: &str) -> Result<Option<InterfaceInfo>> {
        let dir = self.root.join(name);

        // Interfaces can disappear between listing and reading.
        let Some(index) = read_attr(&dir.join("ifindex"))? else {
            tracing::debug!(name, "interface vanished during discovery");
            return Ok(None);
        };

        let hardware_ids = match read_attr(&dir.join("tun_flags"))? {
            Some(flags) => {
                let path = dir.join("tun_flags");
                mode_ids(parse_flags(&flags).ok_or(DiscoveryError::Parse { path, value: flags })?)
            }
            None => Vec::new(),
        };

        Ok(Some(InterfaceInfo {
            name: name.to_string(),
            hardware_ids,
            id: index,
        }))
    }
}

impl InterfaceEnumerator for SysfsEnumerator {
    fn interfaces(&self) -> Result<Vec<InterfaceInfo>> {
        let io_err = |source| DiscoveryError::Io {
            path: self.root.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        let mut interfaces = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(info) = self.read_interface(name)? {
                interfaces.push(info);
            }
        }
        Ok(interfaces)
    }
}

/// Reads a sysfs attribute, trimmed. `None` if it does not exist.
fn read_attr(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DiscoveryError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parses `tun_flags`, which the kernel prints as `0x1002`.
fn parse_flags(s: &str) -> Option<u32> {
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    u32::from_str_radix(hex, 16).ok()
}

fn mode_ids(flags: u32) -> Vec<String> {
    if flags & IFF_TAP != 0 {
        vec!["tap".to_string()]
    } else if flags & IFF_TUN != 0 {
        vec!["tun".to_string()]
    } else {
        Vec::new()
    }
}
