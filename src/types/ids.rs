//! Newtype wrappers for identifiers handed out by external collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a network interface as reported by the system.
///
/// The journal never interprets this value. It is logged after an interface
/// is created and reported to the host during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceId(pub String);

impl InterfaceId {
    pub fn new(s: impl Into<String>) -> Self {
        InterfaceId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InterfaceId {
    fn from(s: String) -> Self {
        InterfaceId(s)
    }
}

impl From<&str> for InterfaceId {
    fn from(s: &str) -> Self {
        InterfaceId(s.to_string())
    }
}
