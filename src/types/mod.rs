//! Core domain types for the deferred operation journal.
//!
//! Operations are modelled as a tagged union: the kind of an operation fixes
//! the shape of its payload, so a well-typed [`Operation`] can never carry a
//! payload its handler does not expect.

pub mod ids;
pub mod operation;

pub use ids::InterfaceId;
pub use operation::{Action, Operation, OperationKind, PayloadShape};
