//! Read-only discovery of existing interfaces.
//!
//! Discovery answers "which interfaces of our kind already exist?" and
//! publishes the answer to the host as a property. It never touches a
//! journal.

pub mod sysfs;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::host::{HostError, PlanningHost};

pub use sysfs::SysfsEnumerator;

/// Errors that can occur during discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Listing or reading an interface failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An attribute held something unparseable.
    #[error("unexpected content in {}: {value:?}", path.display())]
    Parse { path: PathBuf, value: String },

    /// The host refused the result.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Result type for discovery.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// A present interface as reported by an enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Display name.
    pub name: String,
    /// Hardware IDs of the underlying device; may be empty.
    pub hardware_ids: Vec<String>,
    /// Stable identifier reported back to the host.
    pub id: String,
}

impl InterfaceInfo {
    /// Returns true if any hardware ID is `hardware_id` or `root\<hardware_id>`,
    /// ignoring ASCII case.
    pub fn matches_hardware_id(&self, hardware_id: &str) -> bool {
        self.hardware_ids.iter().any(|id| {
            let id = match id.get(..5) {
                Some(prefix) if prefix.eq_ignore_ascii_case("root\\") => &id[5..],
                _ => id.as_str(),
            };
            id.eq_ignore_ascii_case(hardware_id)
        })
    }
}

/// Source of the currently present interfaces.
pub trait InterfaceEnumerator {
    fn interfaces(&self) -> Result<Vec<InterfaceInfo>>;
}

/// Finds interfaces whose hardware ID matches `hardware_id`.
///
/// Each match's id is reported through the host's action data, and the ids
/// joined with `;` are stored in `property`. The property is left alone if
/// nothing matches.
pub fn find_interfaces<E, H>(
    enumerator: &E,
    host: &mut H,
    hardware_id: &str,
    property: &str,
) -> Result<Vec<InterfaceInfo>>
where
    E: InterfaceEnumerator + ?Sized,
    H: PlanningHost + ?Sized,
{
    let found: Vec<InterfaceInfo> = enumerator
        .interfaces()?
        .into_iter()
        .filter(|iface| iface.matches_hardware_id(hardware_id))
        .collect();

    for iface in &found {
        tracing::debug!(name = %iface.name, id = %iface.id, "found interface");
        host.action_data(&iface.id);
    }

    if !found.is_empty() {
        let ids: Vec<&str> = found.iter().map(|iface| iface.id.as_str()).collect();
        host.set_property(property, &ids.join(";"))?;
    }

    tracing::info!(hardware_id, count = found.len(), "interface discovery complete");
    Ok(found)
}
