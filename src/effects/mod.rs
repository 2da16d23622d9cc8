//! Side effects the journal drives but does not implement.
//!
//! The executor only knows operations as data. Everything that touches the
//! system goes through the traits defined here, so tests can substitute
//! recording handlers and the binary can plug in [`IpCommandHandler`].

pub mod handler;
pub mod system;

pub use handler::{HandlerError, OperationHandler, ProgressReply, ProgressSink};
pub use system::IpCommandHandler;
