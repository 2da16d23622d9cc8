//! netjournal - deferred operation journal for privileged network interface setup.
//!
//! Interface creation happens in three steps that run in separate processes:
//! an unprivileged planner decides what to do and writes a journal, a
//! privileged executor replays it, and a final cleanup pass either commits or
//! rolls back the result. The journal file path is the only thing passed
//! between the steps.

pub mod config;
pub mod discovery;
pub mod effects;
pub mod executor;
pub mod host;
pub mod journal;
pub mod phases;
pub mod planner;
pub mod types;

#[cfg(test)]
pub mod test_utils;
