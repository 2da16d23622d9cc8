//! Configuration shared by the planning and deferred phases.

use std::path::PathBuf;

/// Deferred action that creates interfaces.
pub const DEFAULT_INSTALL_ACTION: &str = "InstallTAPInterfaces";

/// Deferred action that removes interfaces.
pub const DEFAULT_UNINSTALL_ACTION: &str = "UninstallTAPInterfaces";

/// Property that, when truthy, disables rollback entries.
pub const DEFAULT_ROLLBACK_PROPERTY: &str = "RollbackDisabled";

/// Progress ticks reserved for creating or deleting one interface.
pub const DEFAULT_INTERFACE_TICKS: u32 = 16 * 1024;

/// Hardware ID of the interfaces discovery looks for: the device mode
/// reported by the tun driver.
pub const DEFAULT_HARDWARE_ID: &str = "tap";

/// Property discovery stores the found interface ids in.
pub const DEFAULT_INTERFACES_PROPERTY: &str = "TAPINTERFACES";

/// Configuration for planning, persisting and discovering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    /// Directory planned journals are created in.
    pub journal_dir: PathBuf,

    /// Name of the forward (install) action. Also the token property name.
    pub install_action: String,

    /// Name of the inverse (uninstall) action. Also the token property name.
    pub uninstall_action: String,

    /// Property read once at planning time to decide whether rollback is disabled.
    pub rollback_property: String,

    /// Cost weight of one interface operation.
    pub interface_ticks: u32,

    /// Hardware ID matched during discovery.
    pub hardware_id: String,

    /// Property receiving the discovered interface ids.
    pub interfaces_property: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        JournalConfig {
            journal_dir: std::env::temp_dir(),
            install_action: DEFAULT_INSTALL_ACTION.to_string(),
            uninstall_action: DEFAULT_UNINSTALL_ACTION.to_string(),
            rollback_property: DEFAULT_ROLLBACK_PROPERTY.to_string(),
            interface_ticks: DEFAULT_INTERFACE_TICKS,
            hardware_id: DEFAULT_HARDWARE_ID.to_string(),
            interfaces_property: DEFAULT_INTERFACES_PROPERTY.to_string(),
        }
    }
}

impl JournalConfig {
    /// Creates a configuration that keeps journals in `journal_dir`.
    pub fn new(journal_dir: impl Into<PathBuf>) -> Self {
        JournalConfig {
            journal_dir: journal_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_actions(
        mut self,
        install_action: impl Into<String>,
        uninstall_action: impl Into<String>,
    ) -> Self {
        self.install_action = install_action.into();
        self.uninstall_action = uninstall_action.into();
        self
    }

    pub fn with_interface_ticks(mut self, ticks: u32) -> Self {
        self.interface_ticks = ticks;
        self
    }

    pub fn with_hardware_id(mut self, hardware_id: impl Into<String>) -> Self {
        self.hardware_id = hardware_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = JournalConfig::default();
        assert_eq!(config.journal_dir, std::env::temp_dir());
        assert_eq!(config.install_action, "InstallTAPInterfaces");
        assert_eq!(config.uninstall_action, "UninstallTAPInterfaces");
        assert_eq!(config.rollback_property, "RollbackDisabled");
        assert_eq!(config.interface_ticks, 16384);
        assert_eq!(config.hardware_id, "tap");
    }

    #[test]
    fn builders_override() {
        let config = JournalConfig::new("/var/lib/netjournal")
            .with_actions("Add", "Remove")
            .with_interface_ticks(1)
            .with_hardware_id("tun");
        assert_eq!(config.journal_dir, PathBuf::from("/var/lib/netjournal"));
        assert_eq!(config.install_action, "Add");
        assert_eq!(config.uninstall_action, "Remove");
        assert_eq!(config.interface_ticks, 1);
        assert_eq!(config.hardware_id, "tun");
    }
}
