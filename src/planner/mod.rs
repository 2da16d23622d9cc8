//! Planning: turn the interface table into journals.
//!
//! Planning runs with full access to the host transaction but cannot touch
//! the system. It decides, row by row, which interfaces the install action
//! must create and which the uninstall action must delete, and records those
//! decisions as two structurally parallel journals.
//!
//! Rows are visited in table order; the journals keep that order.

use thiserror::Error;

use crate::config::JournalConfig;
use crate::effects::ProgressReply;
use crate::host::{ConditionOutcome, HostError, PlanningHost};
use crate::journal::Journal;
use crate::types::Operation;

/// Errors that abort planning.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A row condition could not be evaluated.
    #[error("condition {condition:?} of interface {interface} could not be evaluated")]
    ConditionEval {
        interface: String,
        condition: String,
    },

    /// The user cancelled from the progress indicator.
    #[error("cancelled by user")]
    UserCancelled,

    /// The host failed to answer a query.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// The journals produced by planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Journal for the install action: creates interfaces.
    pub forward: Journal,
    /// Journal for the uninstall action: deletes interfaces.
    pub inverse: Journal,
}

/// Returns true if the rollback property disables rollback.
///
/// The value disables rollback when its leading integer is non-zero or when
/// it starts with `y`/`Y`. An unset property leaves rollback enabled.
pub fn rollback_disabled(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    leading_int(value) != 0 || value.starts_with(['y', 'Y'])
}

/// Parses the integer prefix of `s` (after leading whitespace), or 0.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end]
        .bytes()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    if negative { -magnitude } else { magnitude }
}

/// Builds the install and uninstall journals.
///
/// Returns `Ok(None)` when the host has no interface table, in which case
/// there is nothing to plan.
pub fn plan<H>(host: &mut H, config: &JournalConfig) -> Result<Option<Plan>, PlanError>
where
    H: PlanningHost + ?Sized,
{
    let enable_rollback = !rollback_disabled(host.property(&config.rollback_property).as_deref());

    let mut forward = Journal::new();
    let mut inverse = Journal::new();
    forward.push(Operation::enable_rollback(enable_rollback));
    inverse.push(Operation::enable_rollback(enable_rollback));

    let Some(rows) = host.interface_rows()? else {
        tracing::debug!("no interface table, nothing to plan");
        return Ok(None);
    };

    for row in rows {
        let state = host.component_state(&row.component)?;
        let display_name = host.format_text(&row.display_name)?;

        if state.action.is_present() {
            match host.evaluate_condition(&row.condition) {
                ConditionOutcome::True | ConditionOutcome::None => {}
                ConditionOutcome::False => {
                    tracing::debug!(
                        interface = %row.interface,
                        condition = %row.condition,
                        "condition false, skipping interface"
                    );
                    continue;
                }
                ConditionOutcome::Error => {
                    tracing::error!(
                        interface = %row.interface,
                        condition = %row.condition,
                        "failed to evaluate condition"
                    );
                    return Err(PlanError::ConditionEval {
                        interface: row.interface,
                        condition: row.condition,
                    });
                }
            }
            tracing::debug!(interface = %row.interface, name = %display_name, "scheduling creation");
            forward.push(Operation::create_interface(display_name, config.interface_ticks));
        } else if state.action.is_leaving() && state.installed.is_present() {
            tracing::debug!(interface = %row.interface, name = %display_name, "scheduling deletion");
            inverse.push(Operation::delete_interface_by_name(
                display_name,
                config.interface_ticks,
            ));
        } else {
            continue;
        }

        if host.add_total(config.interface_ticks) == ProgressReply::Cancel {
            tracing::info!("planning cancelled by user");
            return Err(PlanError::UserCancelled);
        }
    }

    Ok(Some(Plan { forward, inverse }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ProgressSink;
    use crate::host::{ComponentState, InstallState, InterfaceRow, MemoryHost};
    use crate::types::Action;

    fn installing() -> ComponentState {
        ComponentState::new(InstallState::Absent, InstallState::Local)
    }

    fn removing() -> ComponentState {
        ComponentState::new(InstallState::Local, InstallState::Absent)
    }

    fn actions(journal: &Journal) -> Vec<Action> {
        journal.iter().map(|op| op.action().clone()).collect()
    }

    #[test]
    fn rollback_property_parsing() {
        assert!(!rollback_disabled(None));
        assert!(!rollback_disabled(Some("")));
        assert!(!rollback_disabled(Some("0")));
        assert!(!rollback_disabled(Some("no")));
        assert!(rollback_disabled(Some("1")));
        assert!(rollback_disabled(Some(" 12abc")));
        assert!(rollback_disabled(Some("-1")));
        assert!(rollback_disabled(Some("yes")));
        assert!(rollback_disabled(Some("Y")));
    }

    #[test]
    fn condition_false_suppresses_row() {
        let mut host = MemoryHost::new()
            .with_component("compA", installing())
            .with_component("compB", ComponentState::new(InstallState::Unknown, InstallState::Absent))
            .with_row(InterfaceRow::new("A", "A", "", "compA"))
            .with_row(InterfaceRow::new("B", "B", "0", "compB"));

        let plan = plan(&mut host, &JournalConfig::default()).unwrap().unwrap();

        assert_eq!(
            actions(&plan.forward),
            vec![Action::EnableRollback(true), Action::CreateInterface("A".into())]
        );
        assert_eq!(actions(&plan.inverse), vec![Action::EnableRollback(true)]);
    }

    #[test]
    fn false_condition_on_installing_component_is_skipped() {
        let mut host = MemoryHost::new()
            .with_component("compA", installing())
            .with_row(InterfaceRow::new("A", "A", "0", "compA"));

        let plan = plan(&mut host, &JournalConfig::default()).unwrap().unwrap();

        assert_eq!(actions(&plan.forward), vec![Action::EnableRollback(true)]);
        assert_eq!(host.progress_total(), 0);
    }

    #[test]
    fn removal_ignores_condition() {
        let mut host = MemoryHost::new()
            .with_component("compA", removing())
            .with_row(InterfaceRow::new("A", "tap-a", "0", "compA"));

        let plan = plan(&mut host, &JournalConfig::default()).unwrap().unwrap();

        assert_eq!(actions(&plan.forward), vec![Action::EnableRollback(true)]);
        assert_eq!(
            actions(&plan.inverse),
            vec![
                Action::EnableRollback(true),
                Action::DeleteInterfaceByName("tap-a".into())
            ]
        );
    }

    #[test]
    fn removal_requires_installed_component() {
        let mut host = MemoryHost::new()
            .with_component("compA", ComponentState::new(InstallState::Absent, InstallState::Absent))
            .with_row(InterfaceRow::new("A", "A", "", "compA"));

        let plan = plan(&mut host, &JournalConfig::default()).unwrap().unwrap();

        assert_eq!(plan.inverse.len(), 1);
    }

    #[test]
    fn rows_keep_table_order_and_cost() {
        let config = JournalConfig::default().with_interface_ticks(10);
        let mut host = MemoryHost::new()
            .with_component("compA", installing())
            .with_component("compB", removing())
            .with_row(InterfaceRow::new("3", "c", "", "compA"))
            .with_row(InterfaceRow::new("1", "a", "", "compA"))
            .with_row(InterfaceRow::new("2", "b", "", "compB"));

        let plan = plan(&mut host, &config).unwrap().unwrap();

        assert_eq!(
            actions(&plan.forward),
            vec![
                Action::EnableRollback(true),
                Action::CreateInterface("c".into()),
                Action::CreateInterface("a".into()),
            ]
        );
        assert!(plan.forward.iter().skip(1).all(|op| op.cost() == 10));
        assert_eq!(plan.inverse.len(), 2);
        assert_eq!(host.progress_total(), 30);
    }

    #[test]
    fn display_names_are_formatted() {
        let mut host = MemoryHost::new()
            .with_property("ProductName", "vpn")
            .with_component("compA", installing())
            .with_row(InterfaceRow::new("A", "tap-[ProductName]", "", "compA"));

        let plan = plan(&mut host, &JournalConfig::default()).unwrap().unwrap();

        assert_eq!(
            plan.forward.iter().nth(1).map(|op| op.action().clone()),
            Some(Action::CreateInterface("tap-vpn".into()))
        );
    }

    #[test]
    fn rollback_flag_prefixes_both_journals() {
        let mut host = MemoryHost::new()
            .with_property("RollbackDisabled", "1")
            .with_component("compA", installing())
            .with_row(InterfaceRow::new("A", "A", "", "compA"));

        let plan = plan(&mut host, &JournalConfig::default()).unwrap().unwrap();

        assert_eq!(
            plan.forward.iter().next().map(|op| op.action().clone()),
            Some(Action::EnableRollback(false))
        );
        assert_eq!(actions(&plan.inverse), vec![Action::EnableRollback(false)]);
    }

    #[test]
    fn missing_table_plans_nothing() {
        let mut host = MemoryHost::new();
        assert_eq!(plan(&mut host, &JournalConfig::default()).unwrap(), None);
    }

    #[test]
    fn condition_error_aborts() {
        let mut host = MemoryHost::new()
            .with_component("compA", installing())
            .with_row(InterfaceRow::new("A", "A", "((", "compA"));

        let err = plan(&mut host, &JournalConfig::default()).unwrap_err();
        assert!(
            matches!(err, PlanError::ConditionEval { ref interface, .. } if interface == "A"),
            "{err}"
        );
    }

    #[test]
    fn unknown_component_aborts() {
        let mut host = MemoryHost::new().with_row(InterfaceRow::new("A", "A", "", "compX"));

        let err = plan(&mut host, &JournalConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::Host(HostError::UnknownComponent(_))));
    }

    /// Host that cancels once the expected total reaches a threshold.
    struct CancellingHost {
        inner: MemoryHost,
        cancel_at: u64,
        total: u64,
    }

    impl ProgressSink for CancellingHost {
        fn add_total(&mut self, ticks: u32) -> ProgressReply {
            self.total += u64::from(ticks);
            if self.total >= self.cancel_at {
                ProgressReply::Cancel
            } else {
                ProgressReply::Continue
            }
        }
    }

    impl PlanningHost for CancellingHost {
        fn property(&self, name: &str) -> Option<String> {
            self.inner.property(name)
        }

        fn set_property(&mut self, name: &str, value: &str) -> Result<(), HostError> {
            self.inner.set_property(name, value)
        }

        fn interface_rows(&self) -> Result<Option<Vec<InterfaceRow>>, HostError> {
            self.inner.interface_rows()
        }

        fn component_state(&self, component: &str) -> Result<ComponentState, HostError> {
            self.inner.component_state(component)
        }

        fn evaluate_condition(&self, condition: &str) -> ConditionOutcome {
            self.inner.evaluate_condition(condition)
        }

        fn format_text(&self, text: &str) -> Result<String, HostError> {
            self.inner.format_text(text)
        }
    }

    #[test]
    fn cancellation_is_distinguished() {
        let config = JournalConfig::default().with_interface_ticks(10);
        let mut host = CancellingHost {
            inner: MemoryHost::new()
                .with_component("compA", installing())
                .with_row(InterfaceRow::new("A", "A", "", "compA"))
                .with_row(InterfaceRow::new("B", "B", "", "compA")),
            cancel_at: 20,
            total: 0,
        };

        let err = plan(&mut host, &config).unwrap_err();

        assert!(matches!(err, PlanError::UserCancelled));
        assert_eq!(host.total, 20);
    }
}
