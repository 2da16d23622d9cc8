//! An in-memory host, persisted as a JSON session file.
//!
//! The binary uses this to stand in for an installer: it loads a session file
//! describing properties, component states and the interface table, runs a
//! planning step against it, and writes the updated properties back.
//!
//! Example session file:
//! ```json
//! {
//!   "properties": { "RollbackDisabled": "0" },
//!   "components": {
//!     "compA": { "installed": "absent", "action": "local" }
//!   },
//!   "interfaces": [
//!     { "interface": "TAP1", "display_name": "tap-[ProductName]", "condition": "", "component": "compA" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::{ProgressReply, ProgressSink};

use super::condition::evaluate;
use super::{ComponentState, ConditionOutcome, HostError, InterfaceRow, PlanningHost};

/// Errors that can occur while reading or writing a session file.
#[derive(Debug, Error)]
pub enum SessionFileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Host state held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryHost {
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub components: BTreeMap<String, ComponentState>,

    /// Interface table; `None` when the package has no such table.
    #[serde(default)]
    pub interfaces: Option<Vec<InterfaceRow>>,

    #[serde(skip)]
    progress_total: u64,

    #[serde(skip)]
    progress_done: u64,

    #[serde(skip)]
    action_data: Vec<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>, state: ComponentState) -> Self {
        self.components.insert(component.into(), state);
        self
    }

    /// Adds a row to the interface table, creating the table if needed.
    pub fn with_row(mut self, row: InterfaceRow) -> Self {
        self.interfaces.get_or_insert_with(Vec::new).push(row);
        self
    }

    /// Expected progress total accumulated so far.
    pub fn progress_total(&self) -> u64 {
        self.progress_total
    }

    /// Progress reported as done so far.
    pub fn progress_done(&self) -> u64 {
        self.progress_done
    }

    /// Action detail lines reported so far.
    pub fn reported_action_data(&self) -> &[String] {
        &self.action_data
    }

    /// Loads a session file.
    pub fn load(path: &Path) -> Result<Self, SessionFileError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Writes the session file atomically (write to temp, fsync, rename).
    pub fn save(&self, path: &Path) -> Result<(), SessionFileError> {
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(self)?;

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl ProgressSink for MemoryHost {
    fn add_total(&mut self, ticks: u32) -> ProgressReply {
        self.progress_total += u64::from(ticks);
        ProgressReply::Continue
    }

    fn advance(&mut self, ticks: u32) -> ProgressReply {
        self.progress_done += u64::from(ticks);
        ProgressReply::Continue
    }

    fn action_data(&mut self, text: &str) {
        self.action_data.push(text.to_string());
    }
}

impl PlanningHost for MemoryHost {
    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn set_property(&mut self, name: &str, value: &str) -> Result<(), HostError> {
        self.properties.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn interface_rows(&self) -> Result<Option<Vec<InterfaceRow>>, HostError> {
        Ok(self.interfaces.clone())
    }

    fn component_state(&self, component: &str) -> Result<ComponentState, HostError> {
        self.components
            .get(component)
            .copied()
            .ok_or_else(|| HostError::UnknownComponent(component.to_string()))
    }

    fn evaluate_condition(&self, condition: &str) -> ConditionOutcome {
        evaluate(condition, |name| self.property(name))
    }

    fn format_text(&self, text: &str) -> Result<String, HostError> {
        format_properties(text, |name| self.property(name))
    }
}

/// Replaces every `[Name]` in `text` with the value of property `Name`.
/// Unset properties expand to nothing.
pub fn format_properties<F>(text: &str, lookup: F) -> Result<String, HostError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find(']').ok_or_else(|| HostError::Format {
            text: text.to_string(),
        })?;
        let name = &after[..close];
        if name.is_empty() || name.contains('[') {
            return Err(HostError::Format {
                text: text.to_string(),
            });
        }
        out.push_str(&lookup(name).unwrap_or_default());
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    Ok(out)
}
