//! Budgeted background scan.
//!
//! Each wakeup resumes at the cursor and walks the scheduler order until
//! one entry has been stepped or the last table has been visited. At most
//! `max_bytes_per_cycle` bytes are read per wakeup.

use super::{ChecksumService, ComputeStatus};
use crate::domain::{CsEvent, EventId, ResourceType, StepOutcome, TableResource};
use tracing::{debug, trace};

impl ChecksumService {
    pub(crate) fn background_cycle(&mut self) {
        if !self.state.checksum_state.is_enabled() {
            trace!("Background checksumming disabled");
            return;
        }
        self.metrics.record_cycle();

        let mut done = false;
        let mut end = false;
        while !done && !end {
            end = self.state.cursor.at_last_table();
            let Some(resource) = self.state.cursor.resource() else {
                self.state.cursor.reset();
                break;
            };

            done = match resource {
                ResourceType::CfeCore | ResourceType::Os => self.background_segment(resource),
                ResourceType::Eeprom => self.background_range_table(TableResource::Eeprom),
                ResourceType::Memory => self.background_range_table(TableResource::Memory),
                ResourceType::Tables => self.background_named_table(TableResource::Tables),
                ResourceType::Apps => self.background_named_table(TableResource::Apps),
            };
        }
    }

    fn background_segment(&mut self, resource: ResourceType) -> bool {
        let budget = self.config.max_bytes_per_cycle;
        let enabled = self.state.resource_states.get(resource).is_enabled();
        let segment = match resource {
            ResourceType::Os => &mut self.state.os_segment,
            _ => &mut self.state.cfe_segment,
        };
        if !enabled || !segment.state.is_enabled() {
            self.state.cursor.go_to_next_table();
            return false;
        }

        let expected = segment.comparison_value;
        let bytes = segment.remaining().min(budget);
        let result = self.compute.compute_range(segment, budget);
        self.metrics.record_bytes(bytes);

        match result {
            Ok(StepOutcome::Completed { value, miscompare }) => {
                if miscompare {
                    let what = match resource {
                        ResourceType::Os => "OS code segment",
                        _ => "cFE Core",
                    };
                    self.report_miscompare(
                        resource,
                        format!(
                            "Checksum Failure: {}, Expected: 0x{:08X}, Calculated: 0x{:08X}",
                            what, expected, value
                        ),
                    );
                }
                self.state.cursor.advance_entry();
            }
            Ok(StepOutcome::InProgress) => {}
            Err(err) => {
                self.emit(
                    CsEvent::error(
                        EventId::ComputeReadError,
                        format!("Checksum of {} could not read memory: {}", resource, err),
                    )
                    .for_resource(resource),
                );
                self.state.cursor.advance_entry();
            }
        }

        if self.state.cursor.entry > 0 {
            match resource {
                ResourceType::Os => self.state.os_baseline = self.state.os_segment.comparison_value,
                _ => self.state.cfe_core_baseline = self.state.cfe_segment.comparison_value,
            }
            self.state.cursor.go_to_next_table();
        }
        true
    }

    fn background_range_table(&mut self, table: TableResource) -> bool {
        let resource = table.resource();
        if !self.state.resource_states.get(resource).is_enabled() {
            self.state.cursor.go_to_next_table();
            return false;
        }

        let capacity = self.state.results(table).capacity();
        let Some(index) = self.state.find_enabled_entry(table) else {
            self.finish_range_table(table, capacity);
            return false;
        };

        let budget = self.config.max_bytes_per_cycle;
        let Some(entry) = self.state.results_mut(table).get_mut(index) else {
            return false;
        };
        let expected = entry.comparison_value;
        let bytes = entry.remaining().min(budget);
        let result = self.compute.compute_range(entry, budget);
        self.metrics.record_bytes(bytes);

        match result {
            Ok(StepOutcome::Completed { value, miscompare }) => {
                if miscompare {
                    self.report_miscompare(
                        resource,
                        format!(
                            "Checksum Failure: Entry {} in {} Table, Expected: 0x{:08X}, Calculated: 0x{:08X}",
                            index, resource, expected, value
                        ),
                    );
                }
                self.state.cursor.advance_entry();
            }
            Ok(StepOutcome::InProgress) => {}
            Err(err) => {
                self.emit(
                    CsEvent::error(
                        EventId::ComputeReadError,
                        format!(
                            "Checksum of Entry {} in {} Table could not read memory: {}",
                            index, resource, err
                        ),
                    )
                    .for_resource(resource),
                );
                self.state.cursor.advance_entry();
            }
        }

        if self.state.cursor.entry >= capacity {
            self.finish_range_table(table, capacity);
        }
        true
    }

    /// Leave an Eeprom or Memory table, folding the Eeprom baselines once
    /// the whole table has been walked.
    fn finish_range_table(&mut self, table: TableResource, capacity: usize) {
        if table == TableResource::Eeprom && self.state.cursor.entry >= capacity {
            self.state.eeprom_baseline = self.state.eeprom_baseline_sum();
        }
        self.state.cursor.go_to_next_table();
    }

    fn background_named_table(&mut self, table: TableResource) -> bool {
        let resource = table.resource();
        if !self.state.resource_states.get(resource).is_enabled() {
            self.state.cursor.go_to_next_table();
            return false;
        }
        let Some(index) = self.state.find_enabled_entry(table) else {
            self.state.cursor.go_to_next_table();
            return false;
        };

        let budget = self.config.max_bytes_per_cycle;
        let Some(entry) = self.state.results_mut(table).get_mut(index) else {
            return false;
        };
        let expected = entry.comparison_value;
        let before = entry.byte_offset;
        let status = self.compute.compute(resource, entry, budget);
        let name = entry.name.clone();
        let bytes = match status {
            ComputeStatus::Step(StepOutcome::Completed { .. }) => {
                entry.num_bytes.saturating_sub(before)
            }
            _ => entry.byte_offset.saturating_sub(before),
        };
        self.metrics.record_bytes(bytes);

        match status {
            ComputeStatus::Step(StepOutcome::Completed { value, miscompare }) => {
                if miscompare {
                    let what = match table {
                        TableResource::Apps => "Application",
                        _ => "Table",
                    };
                    self.report_miscompare(
                        resource,
                        format!(
                            "Checksum Failure: {} {}, Expected: 0x{:08X}, Calculated: 0x{:08X}",
                            what, name, expected, value
                        ),
                    );
                }
                self.state.cursor.advance_entry();
            }
            ComputeStatus::Step(StepOutcome::InProgress) => {}
            ComputeStatus::NotFound | ComputeStatus::ReadFailed(_) => {
                let message = match table {
                    TableResource::Apps => format!(
                        "App table computing: App {} could not be found, skipping",
                        name
                    ),
                    _ => format!(
                        "Tables table computing: Table {} could not be found, skipping",
                        name
                    ),
                };
                self.emit(CsEvent::error(EventId::ComputeNotFound, message).for_resource(resource));
                self.state.cursor.advance_entry();
            }
        }

        if self.state.cursor.entry >= self.state.results(table).capacity() {
            self.state.cursor.go_to_next_table();
        }
        true
    }

    fn report_miscompare(&mut self, resource: ResourceType, message: String) {
        debug!(resource = %resource, "Checksum miscompare");
        self.state.error_counters.increment(resource);
        self.metrics.record_miscompare();
        self.emit(CsEvent::error(EventId::Miscompare, message).for_resource(resource));
    }
}
