//! Operation types.
//!
//! An [`Operation`] is an immutable unit of deferred work: an [`Action`]
//! (which carries the kind and its payload together) plus a cost weight used
//! only to drive the host's progress indicator.

use std::fmt;

/// The closed set of operation kinds, with their on-disk tags.
///
/// Tags are part of the journal file format. New kinds get new tags; the
/// framing of existing kinds never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OperationKind {
    /// Sets the session's rollback-enabled flag.
    EnableRollback = 0x01,
    /// Creates a virtual network interface with a display name.
    CreateInterface = 0x02,
    /// Deletes a file. Only cleanup journals carry these.
    DeleteFile = 0x05,
    /// Deletes a virtual network interface found by its display name.
    DeleteInterfaceByName = 0x13,
}

/// Shape of the payload a kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Bool,
    Text,
}

impl OperationKind {
    /// Returns the on-disk tag of this kind.
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Looks up a kind by its on-disk tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0x01 => Some(OperationKind::EnableRollback),
            0x02 => Some(OperationKind::CreateInterface),
            0x05 => Some(OperationKind::DeleteFile),
            0x13 => Some(OperationKind::DeleteInterfaceByName),
            _ => None,
        }
    }

    /// Returns the payload shape mandated by this kind.
    pub fn payload_shape(self) -> PayloadShape {
        match self {
            OperationKind::EnableRollback => PayloadShape::Bool,
            OperationKind::CreateInterface
            | OperationKind::DeleteFile
            | OperationKind::DeleteInterfaceByName => PayloadShape::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::EnableRollback => "enable-rollback",
            OperationKind::CreateInterface => "create-named-interface",
            OperationKind::DeleteFile => "delete-file",
            OperationKind::DeleteInterfaceByName => "delete-interface-by-name",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an operation does, together with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Enable or disable generation of rollback entries.
    EnableRollback(bool),
    /// Create an interface with this display name.
    CreateInterface(String),
    /// Delete the interface with this display name.
    DeleteInterfaceByName(String),
    /// Delete the file at this path.
    DeleteFile(String),
}

impl Action {
    pub fn kind(&self) -> OperationKind {
        match self {
            Action::EnableRollback(_) => OperationKind::EnableRollback,
            Action::CreateInterface(_) => OperationKind::CreateInterface,
            Action::DeleteInterfaceByName(_) => OperationKind::DeleteInterfaceByName,
            Action::DeleteFile(_) => OperationKind::DeleteFile,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::EnableRollback(enabled) => write!(f, "{}({})", self.kind(), enabled),
            Action::CreateInterface(s)
            | Action::DeleteInterfaceByName(s)
            | Action::DeleteFile(s) => write!(f, "{}({:?})", self.kind(), s),
        }
    }
}

/// A single journal entry.
///
/// Operations are immutable once built; the journal owns them after append.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    action: Action,
    cost: u32,
}

impl Operation {
    pub fn new(action: Action, cost: u32) -> Self {
        Operation { action, cost }
    }

    /// `enable-rollback`. Carries no progress cost.
    pub fn enable_rollback(enabled: bool) -> Self {
        Operation::new(Action::EnableRollback(enabled), 0)
    }

    pub fn create_interface(name: impl Into<String>, cost: u32) -> Self {
        Operation::new(Action::CreateInterface(name.into()), cost)
    }

    pub fn delete_interface_by_name(name: impl Into<String>, cost: u32) -> Self {
        Operation::new(Action::DeleteInterfaceByName(name.into()), cost)
    }

    /// `delete-file`. Carries no progress cost.
    pub fn delete_file(path: impl Into<String>) -> Self {
        Operation::new(Action::DeleteFile(path.into()), 0)
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn kind(&self) -> OperationKind {
        self.action.kind()
    }

    /// Estimated cost in progress ticks.
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action)
    }
}
