//! The installation host, as seen from the planning side.
//!
//! The host owns the transaction: it knows the interface table, the current
//! and requested state of each component, the user's properties, and it
//! decides later which journal token to run in which mode. Planning talks to
//! it only through [`PlanningHost`].

pub mod condition;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::ProgressSink;

pub use memory::MemoryHost;

/// Errors reported by the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The requested component is not known to the host.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// A property could not be stored.
    #[error("failed to set property {name}: {reason}")]
    SetProperty { name: String, reason: String },

    /// A `[Property]` reference in formatted text is malformed.
    #[error("malformed property reference in {text:?}")]
    Format { text: String },
}

/// Install state of a component, either current or requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    /// No state known, or no action requested.
    Unknown,
    Broken,
    Advertised,
    Absent,
    Local,
    Source,
    Default,
}

impl InstallState {
    /// Returns true if the component's files are (or will be) present.
    pub fn is_present(self) -> bool {
        matches!(
            self,
            InstallState::Local | InstallState::Source | InstallState::Default
        )
    }

    /// Returns true if the component is (or will be) gone or only advertised.
    pub fn is_leaving(self) -> bool {
        matches!(self, InstallState::Advertised | InstallState::Absent)
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallState::Unknown => "unknown",
            InstallState::Broken => "broken",
            InstallState::Advertised => "advertised",
            InstallState::Absent => "absent",
            InstallState::Local => "local",
            InstallState::Source => "source",
            InstallState::Default => "default",
        };
        f.write_str(s)
    }
}

/// Current and requested state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentState {
    pub installed: InstallState,
    pub action: InstallState,
}

impl ComponentState {
    pub fn new(installed: InstallState, action: InstallState) -> Self {
        ComponentState { installed, action }
    }
}

/// One row of the interface table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRow {
    /// Primary key of the row.
    pub interface: String,
    /// Interface display name; may contain `[Property]` references.
    pub display_name: String,
    /// Condition text; empty means unconditional.
    #[serde(default)]
    pub condition: String,
    /// Component that owns the interface.
    pub component: String,
}

impl InterfaceRow {
    pub fn new(
        interface: impl Into<String>,
        display_name: impl Into<String>,
        condition: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        InterfaceRow {
            interface: interface.into(),
            display_name: display_name.into(),
            condition: condition.into(),
            component: component.into(),
        }
    }
}

/// Result of evaluating a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOutcome {
    True,
    False,
    /// The condition is empty. Treated as true.
    None,
    /// The condition could not be evaluated.
    Error,
}

/// Planning-time view of the host transaction.
pub trait PlanningHost: ProgressSink {
    /// Returns the value of a property, if set.
    fn property(&self, name: &str) -> Option<String>;

    /// Sets a property. Tokens are handed to the deferred pass this way.
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), HostError>;

    /// Returns the interface table rows in table order, or `None` if the
    /// package has no interface table at all.
    fn interface_rows(&self) -> Result<Option<Vec<InterfaceRow>>, HostError>;

    /// Returns the current and requested state of a component.
    fn component_state(&self, component: &str) -> Result<ComponentState, HostError>;

    /// Evaluates a row condition.
    fn evaluate_condition(&self, condition: &str) -> ConditionOutcome;

    /// Expands `[Property]` references in `text`.
    fn format_text(&self, text: &str) -> Result<String, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_classification() {
        for state in [InstallState::Local, InstallState::Source, InstallState::Default] {
            assert!(state.is_present());
            assert!(!state.is_leaving());
        }
        for state in [InstallState::Advertised, InstallState::Absent] {
            assert!(!state.is_present());
            assert!(state.is_leaving());
        }
        for state in [InstallState::Unknown, InstallState::Broken] {
            assert!(!state.is_present());
            assert!(!state.is_leaving());
        }
    }

    #[test]
    fn row_condition_defaults_to_empty() {
        let row: InterfaceRow = serde_json::from_value(serde_json::json!({
            "interface": "TAP1",
            "display_name": "tap1",
            "component": "compA"
        }))
        .unwrap();
        assert_eq!(row.condition, "");
    }

    #[test]
    fn install_state_serde_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&InstallState::Absent).unwrap(),
            "\"absent\""
        );
    }
}
