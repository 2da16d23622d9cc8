//! The deferred operation journal.
//!
//! A [`Journal`] is an ordered, append-only list of [`Operation`]s. Insertion
//! order is execution order. Journals cross process boundaries as files: the
//! planning process saves them, and a later, unrelated process loads them
//! given nothing but the file path (the correlation token).
//!
//! # File Layout
//!
//! ```text
//! <journal_dir>/
//!   <Action><random>.tmp      # forward or inverse journal (planned)
//!   <Action><random>-cm.tmp   # commit-cleanup journal (written by the deferred pass)
//!   <Action><random>-rb.tmp   # rollback-cleanup journal (written by the deferred pass)
//! ```
//!
//! The record framing is described in [`codec`].

pub mod codec;
pub mod file;
pub mod naming;

use std::path::Path;

use bytes::Bytes;

use crate::types::Operation;

pub use codec::{DecodeError, EncodeError, decode_journal, encode_journal};
pub use file::{LoadError, create_journal_file, load_journal, remove_journal_file, save_journal};
pub use naming::{CleanupAction, base_path, cleanup_path, cleanup_property};

/// An ordered sequence of operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    entries: Vec<Operation>,
}

impl Journal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Journal {
            entries: Vec::new(),
        }
    }

    /// Appends an operation at the tail.
    pub fn push(&mut self, op: Operation) {
        self.entries.push(op);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the operations in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.entries.iter()
    }

    /// Sum of the cost weights of all entries.
    pub fn total_cost(&self) -> u64 {
        self.entries.iter().map(|op| u64::from(op.cost())).sum()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serializes the journal into its on-disk byte form.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        encode_journal(self)
    }

    /// Reconstructs a journal from its on-disk byte form.
    pub fn decode(bytes: impl Into<Bytes>) -> Result<Self, DecodeError> {
        decode_journal(bytes.into())
    }

    /// Loads a journal file. See [`load_journal`].
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        load_journal(path)
    }

    /// Saves this journal to a file. See [`save_journal`].
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        save_journal(path, self)
    }
}

impl FromIterator<Operation> for Journal {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Journal {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<Operation> for Journal {
    fn extend<I: IntoIterator<Item = Operation>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl IntoIterator for Journal {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Journal {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationKind;

    #[test]
    fn push_appends_at_tail() {
        let mut journal = Journal::new();
        journal.push(Operation::enable_rollback(true));
        journal.push(Operation::create_interface("A", 1));
        journal.push(Operation::create_interface("B", 2));

        let kinds: Vec<_> = journal.iter().map(Operation::kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::EnableRollback,
                OperationKind::CreateInterface,
                OperationKind::CreateInterface,
            ]
        );
        assert_eq!(journal.len(), 3);
        assert_eq!(journal.total_cost(), 3);
    }

    #[test]
    fn clear_releases_everything() {
        let mut journal: Journal = [
            Operation::delete_file("/tmp/a"),
            Operation::delete_file("/tmp/b"),
        ]
        .into_iter()
        .collect();
        journal.clear();
        assert!(journal.is_empty());
        assert_eq!(journal, Journal::new());
    }

    #[test]
    fn encode_decode_preserves_order() {
        let journal: Journal = [
            Operation::enable_rollback(false),
            Operation::delete_interface_by_name("Z", 3),
            Operation::create_interface("A", 1),
        ]
        .into_iter()
        .collect();

        let decoded = Journal::decode(journal.encode().unwrap()).unwrap();
        assert_eq!(decoded, journal);
    }
}
