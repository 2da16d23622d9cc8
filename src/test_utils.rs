//! Shared test utilities and arbitrary generators for property-based testing.

use crate::journal::Journal;
use crate::types::Operation;
use proptest::prelude::*;

pub fn arb_interface_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,14}".prop_map(String::from)
}

pub fn arb_file_path() -> impl Strategy<Value = String> {
    "(/[a-zA-Z0-9_.-]{1,16}){1,4}".prop_map(String::from)
}

pub fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        any::<bool>().prop_map(Operation::enable_rollback),
        (arb_interface_name(), any::<u32>())
            .prop_map(|(name, cost)| Operation::create_interface(name, cost)),
        (arb_interface_name(), any::<u32>())
            .prop_map(|(name, cost)| Operation::delete_interface_by_name(name, cost)),
        arb_file_path().prop_map(Operation::delete_file),
        // Non-ASCII names must survive the text payload encoding.
        ("\\PC{1,8}", any::<u32>()).prop_map(|(name, cost)| Operation::create_interface(name, cost)),
    ]
}

pub fn arb_journal() -> impl Strategy<Value = Journal> {
    prop::collection::vec(arb_operation(), 0..16).prop_map(Journal::from_iter)
}
