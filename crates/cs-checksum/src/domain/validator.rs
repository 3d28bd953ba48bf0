//! Definition table validation.
//!
//! Pure over the definition table: counts every entry as good, bad or
//! unused and lists each violation in index order. The caller turns the
//! report into events.

use super::entry::DefinitionEntry;
use super::events::{CsEvent, EventId};
use super::types::{EntryState, TableResource};
use crate::error::{status_bits, TableError, ValidationViolation};
use crate::ports::outbound::RangeValidator;

/// A violation found at a specific entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub index: usize,
    pub kind: ValidationViolation,
}

impl Violation {
    /// Operator event describing this violation.
    pub fn to_event(&self, resource: TableResource) -> CsEvent {
        let event = match &self.kind {
            ValidationViolation::IllegalState { state } => CsEvent::error(
                EventId::ValidateState,
                format!(
                    "CS {} Table Validate: Illegal State Field (0x{:04X}) found in Entry ID {}",
                    resource, state, self.index
                ),
            ),
            ValidationViolation::IllegalRange {
                start_address,
                num_bytes,
                code,
            } => CsEvent::error(
                EventId::ValidateRange,
                format!(
                    "CS {} Table Validate: Illegal checksum range 0x{:08X}+{} in Entry ID {}, range check returned 0x{:08X}",
                    resource,
                    start_address,
                    num_bytes,
                    self.index,
                    status_bits(*code)
                ),
            ),
            ValidationViolation::IllegalStateEmptyName { state } => CsEvent::error(
                EventId::ValidateEmptyName,
                format!(
                    "CS {} Table Validate: Illegal State (0x{:04X}) with empty name at entry {}",
                    resource, state, self.index
                ),
            ),
            ValidationViolation::DuplicateName { name, later } => CsEvent::error(
                EventId::ValidateDuplicate,
                format!(
                    "CS {} Table Validate: Duplicate Name ({}) found at entries {} and {}",
                    resource, name, later, self.index
                ),
            ),
        };
        event.for_resource(resource.resource())
    }
}

/// Outcome of validating one definition table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub resource: TableResource,
    pub good: u32,
    pub bad: u32,
    pub unused: u32,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    fn new(resource: TableResource) -> Self {
        Self {
            resource,
            good: 0,
            bad: 0,
            unused: 0,
            violations: Vec::new(),
        }
    }

    fn reject(&mut self, index: usize, kind: ValidationViolation) {
        self.bad += 1;
        self.violations.push(Violation { index, kind });
    }

    pub fn result(&self) -> Result<(), TableError> {
        if self.bad > 0 {
            Err(TableError {
                resource: self.resource.resource(),
                good: self.good,
                bad: self.bad,
                unused: self.unused,
            })
        } else {
            Ok(())
        }
    }

    pub fn is_valid(&self) -> bool {
        self.bad == 0
    }

    /// Closing summary event with the three counts.
    pub fn summary_event(&self) -> CsEvent {
        CsEvent::info(
            EventId::ValidateSummary,
            format!(
                "CS {} Table verification results: good = {}, bad = {}, unused = {}",
                self.resource, self.good, self.bad, self.unused
            ),
        )
        .for_resource(self.resource.resource())
    }
}

/// Validate a definition table.
///
/// Range-addressed tables check every Enabled or Disabled range against the
/// platform, so a disabled entry with a bad range is still caught. Named
/// tables reject empty names on non-empty entries, and an entry whose name
/// reappears later in the table is counted bad once, referencing the first
/// later duplicate.
pub fn validate(
    resource: TableResource,
    table: &[DefinitionEntry],
    ranges: &dyn RangeValidator,
) -> ValidationReport {
    let mut report = ValidationReport::new(resource);

    for (index, entry) in table.iter().enumerate() {
        if resource.is_named() {
            validate_named(&mut report, table, index, entry);
        } else {
            validate_range_entry(&mut report, index, entry, ranges);
        }
    }

    report
}

fn validate_range_entry(
    report: &mut ValidationReport,
    index: usize,
    entry: &DefinitionEntry,
    ranges: &dyn RangeValidator,
) {
    match entry.entry_state() {
        Some(EntryState::Empty) => report.unused += 1,
        Some(EntryState::Enabled) | Some(EntryState::Disabled) => {
            match ranges.check_range(entry.start_address, entry.num_bytes) {
                Ok(()) => report.good += 1,
                Err(code) => report.reject(
                    index,
                    ValidationViolation::IllegalRange {
                        start_address: entry.start_address,
                        num_bytes: entry.num_bytes,
                        code,
                    },
                ),
            }
        }
        None => report.reject(index, ValidationViolation::IllegalState { state: entry.state }),
    }
}

fn validate_named(
    report: &mut ValidationReport,
    table: &[DefinitionEntry],
    index: usize,
    entry: &DefinitionEntry,
) {
    if entry.name.is_empty() {
        if entry.is_empty() {
            report.unused += 1;
        } else {
            report.reject(
                index,
                ValidationViolation::IllegalStateEmptyName { state: entry.state },
            );
        }
        return;
    }

    let Some(state) = entry.entry_state() else {
        report.reject(index, ValidationViolation::IllegalState { state: entry.state });
        return;
    };

    let duplicate = table
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, other)| other.name == entry.name)
        .map(|(later, _)| later);

    match (duplicate, state) {
        (Some(later), _) => report.reject(
            index,
            ValidationViolation::DuplicateName {
                name: entry.name.clone(),
                later,
            },
        ),
        (None, EntryState::Empty) => report.unused += 1,
        (None, _) => report.good += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Accepts ranges inside `[0x1000, 0x2000)`.
    struct WindowValidator;

    impl RangeValidator for WindowValidator {
        fn check_range(&self, address: usize, len: usize) -> Result<(), i32> {
            match address.checked_add(len) {
                Some(end) if address >= 0x1000 && end <= 0x2000 => Ok(()),
                _ => Err(-1),
            }
        }
    }

    fn empty_table(capacity: usize) -> Vec<DefinitionEntry> {
        vec![DefinitionEntry::empty(); capacity]
    }

    #[test]
    fn test_single_valid_eeprom_entry() {
        let mut table = empty_table(16);
        table[0] = DefinitionEntry::range(EntryState::Enabled, 0x1000, 2);

        let report = validate(TableResource::Eeprom, &table, &WindowValidator);

        assert_eq!((report.good, report.bad, report.unused), (1, 0, 15));
        assert!(report.result().is_ok());
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_disabled_entry_with_bad_range_is_bad() {
        let mut table = empty_table(4);
        table[2] = DefinitionEntry::range(EntryState::Disabled, 0x5000, 16);

        let report = validate(TableResource::Memory, &table, &WindowValidator);

        assert_eq!(report.bad, 1);
        assert_eq!(report.violations[0].index, 2);
        assert!(matches!(
            report.violations[0].kind,
            ValidationViolation::IllegalRange { code: -1, .. }
        ));
        assert!(report.result().is_err());
    }

    #[test]
    fn test_illegal_state_on_range_table() {
        let mut table = empty_table(2);
        table[1].state = 7;

        let report = validate(TableResource::Eeprom, &table, &WindowValidator);

        assert_eq!((report.good, report.bad, report.unused), (0, 1, 1));
        assert_eq!(
            report.violations[0].kind,
            ValidationViolation::IllegalState { state: 7 }
        );
    }

    #[test]
    fn test_duplicate_name_counts_once() {
        let mut table = empty_table(24);
        table[0] = DefinitionEntry::named(EntryState::Empty, "name");
        table[1] = DefinitionEntry::named(EntryState::Enabled, "name");

        let report = validate(TableResource::Tables, &table, &WindowValidator);

        assert_eq!((report.good, report.bad, report.unused), (1, 1, 22));
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].index, 0);
        assert_eq!(
            report.violations[0].kind,
            ValidationViolation::DuplicateName {
                name: "name".to_string(),
                later: 1
            }
        );
    }

    #[test]
    fn test_empty_name_with_active_state() {
        let mut table = empty_table(3);
        table[1] = DefinitionEntry::named(EntryState::Enabled, "");

        let report = validate(TableResource::Apps, &table, &WindowValidator);

        assert_eq!(report.bad, 1);
        assert_eq!(
            report.violations[0].kind,
            ValidationViolation::IllegalStateEmptyName { state: 1 }
        );
    }

    #[test]
    fn test_named_table_skips_range_check() {
        let mut table = empty_table(2);
        table[0] = DefinitionEntry {
            state: EntryState::Enabled.raw(),
            start_address: 0xDEAD_0000,
            num_bytes: 4,
            name: "App1".to_string(),
        };

        let report = validate(TableResource::Apps, &table, &WindowValidator);
        assert!(report.is_valid());
    }

    #[test]
    fn test_violation_event_text() {
        let violation = Violation {
            index: 0,
            kind: ValidationViolation::DuplicateName {
                name: "name".to_string(),
                later: 1,
            },
        };
        let event = violation.to_event(TableResource::Tables);
        assert_eq!(event.id, EventId::ValidateDuplicate);
        assert!(event.message.contains("entries 1 and 0"));
    }

    fn arb_entry() -> impl Strategy<Value = DefinitionEntry> {
        (0u16..5, 0x0800usize..0x2200, 0usize..0x400, "[ab]{0,2}").prop_map(
            |(state, start_address, num_bytes, name)| DefinitionEntry {
                state,
                start_address,
                num_bytes,
                name,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_counts_cover_capacity(
            table in prop::collection::vec(arb_entry(), 1..32),
            named in any::<bool>(),
        ) {
            let resource = if named { TableResource::Tables } else { TableResource::Memory };
            let report = validate(resource, &table, &WindowValidator);
            prop_assert_eq!(
                (report.good + report.bad + report.unused) as usize,
                table.len()
            );
            prop_assert_eq!(report.bad as usize, report.violations.len());
        }
    }
}
