//! ChecksumApi implementation: the operator command surface.

use super::{ChecksumService, VERSION};
use crate::domain::{
    CsEvent, EntryRef, EntryState, EventId, HousekeepingPacket, ResourceState, ResourceType,
    TableResource,
};
use crate::error::{CsError, CsResult};
use crate::ports::inbound::ChecksumApi;
use tracing::{info, warn};

fn state_word(state: ResourceState) -> &'static str {
    match state {
        ResourceState::Enabled => "Enabled",
        ResourceState::Disabled => "Disabled",
    }
}

/// Resource name as used in the enable and disable events.
fn resource_phrase(resource: ResourceType) -> &'static str {
    match resource {
        ResourceType::Os => "OS code segment",
        other => other.label(),
    }
}

impl ChecksumService {
    /// Index of the non-empty entry `target` names.
    ///
    /// Eeprom and Memory ids outside the table or on an empty slot are
    /// `InvalidEntry`; unmatched names are `NotFound`.
    pub(crate) fn resolve_entry(&self, target: &EntryRef) -> CsResult<usize> {
        let resource = target.resource();
        match (target, resource.table()) {
            (EntryRef::Eeprom(id) | EntryRef::Memory(id), Some(table)) => {
                let results = self.state.results(table);
                match results.get(*id) {
                    Some(_) => Ok(*id),
                    None => Err(CsError::InvalidEntry {
                        resource,
                        entry: *id,
                        state: results.reported_state(*id),
                    }),
                }
            }
            (_, Some(_)) => self.state.locate(target).ok_or_else(|| CsError::NotFound {
                what: target.to_string(),
            }),
            (_, None) => Ok(0),
        }
    }

    /// Highest valid entry id, reported in invalid-id events.
    pub(crate) fn max_entry_id(&self, resource: ResourceType) -> usize {
        resource
            .table()
            .map(|table| self.state.results(table).capacity().saturating_sub(1))
            .unwrap_or(0)
    }

    fn set_resource_state(&mut self, resource: ResourceType, state: ResourceState) {
        self.state.resource_states.set(resource, state);
        if state == ResourceState::Disabled {
            self.state.zero_temp_values(resource);
        }
        self.save_to_cds();

        info!(resource = %resource, %state, "Resource checksumming changed");
        let id = match state {
            ResourceState::Enabled => EventId::EnableResource,
            ResourceState::Disabled => EventId::DisableResource,
        };
        self.emit(
            CsEvent::info(
                id,
                format!(
                    "Checksumming of {} is {}",
                    resource_phrase(resource),
                    state_word(state)
                ),
            )
            .for_resource(resource),
        );
    }

    fn try_set_entry_state(&mut self, target: &EntryRef, state: ResourceState) -> CsResult<()> {
        let resource = target.resource();
        let Some(table) = resource.table() else {
            return Err(CsError::Unsupported {
                operation: "Entry enable/disable",
                resource,
            });
        };
        let (verb, ok_id, invalid_id) = match state {
            ResourceState::Enabled => ("Enable", EventId::EnableEntry, EventId::EnableEntryInvalid),
            ResourceState::Disabled => {
                ("Disable", EventId::DisableEntry, EventId::DisableEntryInvalid)
            }
        };

        let index = match self.resolve_entry(target) {
            Ok(index) => index,
            Err(err) => {
                let message = match (target, &err) {
                    (_, CsError::InvalidEntry { entry, state, .. }) => format!(
                        "{} {} entry failed, invalid Entry ID:  {}, State: {}, Max ID: {}",
                        verb,
                        resource,
                        entry,
                        state,
                        self.max_entry_id(resource)
                    ),
                    (EntryRef::Table(name), _) => format!(
                        "Tables {} table command failed, table {} not found",
                        verb.to_lowercase(),
                        name
                    ),
                    (EntryRef::App(name), _) => format!(
                        "App {} app command failed, app {} not found",
                        verb.to_lowercase(),
                        name
                    ),
                    _ => err.to_string(),
                };
                self.emit(CsEvent::error(invalid_id, message).for_resource(resource));
                return Err(err);
            }
        };

        if let Some(entry) = self.state.results_mut(table).get_mut(index) {
            entry.state = state;
            if state == ResourceState::Disabled {
                entry.zero_temp_values();
            }
        }

        let subject = match target {
            EntryRef::Table(name) => format!("table {}", name),
            EntryRef::App(name) => format!("app {}", name),
            _ => format!("{} Entry ID {}", resource, index),
        };
        self.emit(
            CsEvent::info(
                ok_id,
                format!("Checksumming of {} is {}", subject, state_word(state)),
            )
            .for_resource(resource),
        );

        self.mirror_definition_state(table, target, index, state);
        Ok(())
    }

    /// Copy an entry's new state into the definition table, so a later
    /// reload or reboot keeps it.
    fn mirror_definition_state(
        &mut self,
        table: TableResource,
        target: &EntryRef,
        index: usize,
        state: ResourceState,
    ) {
        let handle = self.state.own_tables.definition(table);
        let mut entries = handle
            .and_then(|handle| self.deps.tables.definition(handle).ok())
            .unwrap_or_default();
        let position = match target {
            EntryRef::Table(name) | EntryRef::App(name) => entries
                .iter()
                .position(|def| !def.is_empty() && def.name == *name),
            _ => entries
                .get(index)
                .filter(|def| !def.is_empty())
                .map(|_| index),
        };

        match (handle, position) {
            (Some(handle), Some(position)) => {
                if let Some(def) = entries.get_mut(position) {
                    def.state = state.entry_state().raw();
                }
                match self.deps.tables.write_definition(handle, &entries) {
                    Ok(()) => self.state.reset_well_known(table),
                    Err(err) => {
                        warn!(resource = %table, error = %err, "Definition table not updated")
                    }
                }
            }
            _ => {
                let message = match target {
                    EntryRef::Table(name) | EntryRef::App(name) => format!(
                        "CS unable to update {} definition table for entry {}",
                        table.resource().label().to_lowercase(),
                        name
                    ),
                    _ => format!(
                        "CS unable to update {} definition table for entry {}, State: {}",
                        table,
                        index,
                        entries
                            .get(index)
                            .map(|def| def.state)
                            .unwrap_or(EntryState::UNDEFINED)
                    ),
                };
                self.emit(
                    CsEvent::debug(EventId::DefinitionEntryMissing, message)
                        .for_resource(table.resource()),
                );
            }
        }
    }

    fn find_entries_at(&self, table: TableResource, address: usize) -> Vec<usize> {
        let ids: Vec<usize> = self
            .state
            .results(table)
            .iter()
            .filter(|(_, entry)| entry.window().contains_inclusive(address))
            .map(|(index, _)| index)
            .collect();

        for id in &ids {
            self.emit(
                CsEvent::info(
                    EventId::GetEntryId,
                    format!("{} Found Address 0x{:08X} in Entry ID {}", table, address, id),
                )
                .for_resource(table.resource()),
            );
        }
        if ids.is_empty() {
            self.emit(
                CsEvent::info(
                    EventId::GetEntryIdNotFound,
                    format!("Address 0x{:08X} was not found in {} table", address, table),
                )
                .for_resource(table.resource()),
            );
        }
        ids
    }
}

impl ChecksumApi for ChecksumService {
    fn noop(&mut self) -> CsResult<()> {
        self.emit(CsEvent::info(
            EventId::Noop,
            format!("No-op command. Version {}", VERSION),
        ));
        self.finish(Ok(()))
    }

    fn reset_counters(&mut self) -> CsResult<()> {
        self.state.command_counter = 0;
        self.state.command_error_counter = 0;
        self.state.error_counters.reset();
        self.state.cursor.pass_counter = 0;
        self.emit(CsEvent::debug(
            EventId::Reset,
            "Reset Counters command received",
        ));
        Ok(())
    }

    fn enable_all(&mut self) -> CsResult<()> {
        self.state.checksum_state = ResourceState::Enabled;
        self.emit(CsEvent::info(
            EventId::EnableAll,
            "Background Checksumming Enabled",
        ));
        self.finish(Ok(()))
    }

    fn disable_all(&mut self) -> CsResult<()> {
        self.state.checksum_state = ResourceState::Disabled;
        self.state.zero_all_temp_values();
        self.emit(CsEvent::info(
            EventId::DisableAll,
            "Background Checksumming Disabled",
        ));
        self.finish(Ok(()))
    }

    fn enable_resource(&mut self, resource: ResourceType) -> CsResult<()> {
        self.set_resource_state(resource, ResourceState::Enabled);
        self.finish(Ok(()))
    }

    fn disable_resource(&mut self, resource: ResourceType) -> CsResult<()> {
        self.set_resource_state(resource, ResourceState::Disabled);
        self.finish(Ok(()))
    }

    fn report_baseline(&mut self, target: &EntryRef) -> CsResult<u32> {
        let resource = target.resource();
        let index = match self.resolve_entry(target) {
            Ok(index) => index,
            Err(err) => {
                let message = match (target, &err) {
                    (_, CsError::InvalidEntry { entry, state, .. }) => format!(
                        "{} report baseline failed, Entry ID invalid: {}, State: {} Max ID: {}",
                        resource,
                        entry,
                        state,
                        self.max_entry_id(resource)
                    ),
                    (EntryRef::Table(name), _) => {
                        format!("Tables report baseline failed, table {} not found", name)
                    }
                    (EntryRef::App(name), _) => {
                        format!("App report baseline failed, app {} not found", name)
                    }
                    _ => err.to_string(),
                };
                self.emit(CsEvent::error(EventId::BaselineInvalid, message).for_resource(resource));
                self.state.reject_command();
                self.metrics.record_command(false);
                return Err(err);
            }
        };

        let subject = match target {
            EntryRef::CfeCore => "Baseline of cFE Core".to_string(),
            EntryRef::Os => "Baseline of OS code segment".to_string(),
            EntryRef::Eeprom(id) | EntryRef::Memory(id) => {
                format!("Report baseline of {} Entry {}", resource, id)
            }
            EntryRef::Table(name) => format!("Report baseline of table {}", name),
            EntryRef::App(name) => format!("Report baseline of app {}", name),
        };

        let baseline = self
            .state
            .entry(resource, index)
            .map(|entry| (entry.computed_yet, entry.comparison_value));
        match baseline {
            Some((true, value)) => {
                self.emit(
                    CsEvent::info(
                        EventId::Baseline,
                        format!("{} is 0x{:08X}", subject, value),
                    )
                    .for_resource(resource),
                );
                Ok(value)
            }
            _ => {
                self.emit(
                    CsEvent::info(
                        EventId::NoBaseline,
                        format!("{} has not been computed yet", subject),
                    )
                    .for_resource(resource),
                );
                Err(CsError::NotYetComputed {
                    what: target.to_string(),
                })
            }
        }
    }

    fn recompute(&mut self, target: &EntryRef) -> CsResult<()> {
        let result = self.request_recompute(target);
        self.finish(result)
    }

    fn set_entry_state(&mut self, target: &EntryRef, state: ResourceState) -> CsResult<()> {
        let result = self.try_set_entry_state(target, state);
        self.finish(result)
    }

    fn get_entry_id(&mut self, resource: ResourceType, address: usize) -> CsResult<Vec<usize>> {
        let result = match resource.table() {
            Some(table @ (TableResource::Eeprom | TableResource::Memory)) => {
                Ok(self.find_entries_at(table, address))
            }
            _ => Err(CsError::Unsupported {
                operation: "Get entry id",
                resource,
            }),
        };
        self.finish(result)
    }

    fn one_shot(
        &mut self,
        address: usize,
        size: usize,
        max_bytes_per_cycle: usize,
    ) -> CsResult<()> {
        let result = self.request_one_shot(address, size, max_bytes_per_cycle);
        self.finish(result)
    }

    fn cancel_one_shot(&mut self) -> CsResult<()> {
        let result = self.request_cancel_one_shot();
        self.finish(result)
    }

    fn run_cycle(&mut self) {
        self.background_cycle();
    }

    fn send_housekeeping(&mut self) -> HousekeepingPacket {
        self.publish_housekeeping()
    }

    fn resource_state(&self, resource: ResourceType) -> ResourceState {
        self.state.resource_states.get(resource)
    }
}
