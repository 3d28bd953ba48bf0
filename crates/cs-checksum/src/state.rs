//! Mutable engine state owned by the main task.

use crate::domain::{
    CdsHandle, ChecksumConfig, ChildTaskSlot, EntryRef, ErrorCounters, HousekeepingPacket,
    MemoryWindow, OwnTables, ResourceState, ResourceStates, ResourceType, ResultEntry,
    ResultsTable, ScheduleCursor, TableResource, WellKnownSlots,
};

/// Parameters and result of the most recent one-shot request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LastOneShot {
    pub address: usize,
    pub size: usize,
    pub max_bytes_per_cycle: usize,
    pub checksum: u32,
}

pub struct CoreState {
    /// Global background switch
    pub checksum_state: ResourceState,
    pub resource_states: ResourceStates,
    pub error_counters: ErrorCounters,
    pub command_counter: u8,
    pub command_error_counter: u8,
    pub eeprom: ResultsTable,
    pub memory: ResultsTable,
    pub tables: ResultsTable,
    pub apps: ResultsTable,
    /// Kernel text segment
    pub os_segment: ResultEntry,
    /// Core executive text segment
    pub cfe_segment: ResultEntry,
    pub cursor: ScheduleCursor,
    /// Wrapping sum of all Eeprom baselines after the last full table pass
    pub eeprom_baseline: u32,
    pub os_baseline: u32,
    pub cfe_core_baseline: u32,
    pub last_one_shot: LastOneShot,
    pub child: ChildTaskSlot,
    /// Tables entries that checksum this app's definition tables
    pub well_known: WellKnownSlots,
    pub own_tables: OwnTables,
    pub cds_handle: Option<CdsHandle>,
}

impl CoreState {
    pub fn new(config: &ChecksumConfig) -> Self {
        let capacities = config.capacities;
        Self {
            checksum_state: ResourceState::Enabled,
            resource_states: config.power_on_states,
            error_counters: ErrorCounters::default(),
            command_counter: 0,
            command_error_counter: 0,
            eeprom: ResultsTable::with_capacity(capacities.get(TableResource::Eeprom)),
            memory: ResultsTable::with_capacity(capacities.get(TableResource::Memory)),
            tables: ResultsTable::with_capacity(capacities.get(TableResource::Tables)),
            apps: ResultsTable::with_capacity(capacities.get(TableResource::Apps)),
            os_segment: ResultEntry::new(ResourceState::Disabled, MemoryWindow::EMPTY),
            cfe_segment: ResultEntry::new(ResourceState::Disabled, MemoryWindow::EMPTY),
            cursor: ScheduleCursor::new(),
            eeprom_baseline: 0,
            os_baseline: 0,
            cfe_core_baseline: 0,
            last_one_shot: LastOneShot::default(),
            child: ChildTaskSlot::new(),
            well_known: WellKnownSlots::default(),
            own_tables: OwnTables::default(),
            cds_handle: None,
        }
    }

    pub fn results(&self, resource: TableResource) -> &ResultsTable {
        match resource {
            TableResource::Eeprom => &self.eeprom,
            TableResource::Memory => &self.memory,
            TableResource::Tables => &self.tables,
            TableResource::Apps => &self.apps,
        }
    }

    pub fn results_mut(&mut self, resource: TableResource) -> &mut ResultsTable {
        match resource {
            TableResource::Eeprom => &mut self.eeprom,
            TableResource::Memory => &mut self.memory,
            TableResource::Tables => &mut self.tables,
            TableResource::Apps => &mut self.apps,
        }
    }

    /// Entry `index` of `resource`; index 0 addresses the code segments.
    pub fn entry(&self, resource: ResourceType, index: usize) -> Option<&ResultEntry> {
        match (resource, resource.table()) {
            (_, Some(table)) => self.results(table).get(index),
            (ResourceType::Os, None) if index == 0 => Some(&self.os_segment),
            (ResourceType::CfeCore, None) if index == 0 => Some(&self.cfe_segment),
            _ => None,
        }
    }

    pub fn entry_mut(&mut self, resource: ResourceType, index: usize) -> Option<&mut ResultEntry> {
        match (resource, resource.table()) {
            (_, Some(table)) => self.results_mut(table).get_mut(index),
            (ResourceType::Os, None) if index == 0 => Some(&mut self.os_segment),
            (ResourceType::CfeCore, None) if index == 0 => Some(&mut self.cfe_segment),
            _ => None,
        }
    }

    /// Index of the non-empty entry `target` refers to.
    pub fn locate(&self, target: &EntryRef) -> Option<usize> {
        match target {
            EntryRef::CfeCore | EntryRef::Os => Some(0),
            EntryRef::Eeprom(id) => self.eeprom.get(*id).map(|_| *id),
            EntryRef::Memory(id) => self.memory.get(*id).map(|_| *id),
            EntryRef::Table(name) => self.tables.find_by_name(name),
            EntryRef::App(name) => self.apps.find_by_name(name),
        }
    }

    /// Move the cursor to the next Enabled entry of `table`.
    pub fn find_enabled_entry(&mut self, table: TableResource) -> Option<usize> {
        let results = match table {
            TableResource::Eeprom => &self.eeprom,
            TableResource::Memory => &self.memory,
            TableResource::Tables => &self.tables,
            TableResource::Apps => &self.apps,
        };
        self.cursor.find_enabled_entry(results)
    }

    /// Wrapping sum of the baselines of every non-empty Eeprom entry.
    pub fn eeprom_baseline_sum(&self) -> u32 {
        self.eeprom
            .iter()
            .fold(0u32, |sum, (_, entry)| sum.wrapping_add(entry.comparison_value))
    }

    /// Drop the partial passes of one resource.
    pub fn zero_temp_values(&mut self, resource: ResourceType) {
        match resource.table() {
            Some(table) => self.results_mut(table).zero_temp_values(),
            None if resource == ResourceType::Os => self.os_segment.zero_temp_values(),
            None => self.cfe_segment.zero_temp_values(),
        }
    }

    pub fn zero_all_temp_values(&mut self) {
        for resource in ResourceType::ALL {
            self.zero_temp_values(resource);
        }
    }

    /// Restart the Tables entry that checksums `resource`'s definition
    /// table, if one is listed.
    pub fn reset_well_known(&mut self, resource: TableResource) {
        if let Some(entry) = self
            .well_known
            .get(resource)
            .and_then(|index| self.tables.get_mut(index))
        {
            entry.restart();
        }
    }

    pub fn accept_command(&mut self) {
        self.command_counter = self.command_counter.wrapping_add(1);
    }

    pub fn reject_command(&mut self) {
        self.command_error_counter = self.command_error_counter.wrapping_add(1);
    }

    pub fn housekeeping(&self) -> HousekeepingPacket {
        let states = &self.resource_states;
        let errors = &self.error_counters;
        HousekeepingPacket {
            command_counter: self.command_counter,
            command_error_counter: self.command_error_counter,
            checksum_state: self.checksum_state,
            eeprom_state: states.get(ResourceType::Eeprom),
            memory_state: states.get(ResourceType::Memory),
            app_state: states.get(ResourceType::Apps),
            tables_state: states.get(ResourceType::Tables),
            os_state: states.get(ResourceType::Os),
            cfe_core_state: states.get(ResourceType::CfeCore),
            recompute_in_progress: self.child.recompute_in_progress(),
            one_shot_in_progress: self.child.one_shot_in_progress(),
            eeprom_error_counter: errors.get(ResourceType::Eeprom),
            memory_error_counter: errors.get(ResourceType::Memory),
            app_error_counter: errors.get(ResourceType::Apps),
            tables_error_counter: errors.get(ResourceType::Tables),
            os_error_counter: errors.get(ResourceType::Os),
            cfe_core_error_counter: errors.get(ResourceType::CfeCore),
            current_table: self.cursor.table,
            current_entry: self.cursor.entry,
            eeprom_baseline: self.eeprom_baseline,
            os_baseline: self.os_baseline,
            cfe_core_baseline: self.cfe_core_baseline,
            last_one_shot_address: self.last_one_shot.address,
            last_one_shot_size: self.last_one_shot.size,
            last_one_shot_max_bytes_per_cycle: self.last_one_shot.max_bytes_per_cycle,
            last_one_shot_checksum: self.last_one_shot.checksum,
            pass_counter: self.cursor.pass_counter,
        }
    }
}
