//! Housekeeping telemetry packet.

use super::types::{ResourceState, ResourceType};
use serde::Serialize;

/// Periodic status snapshot published on request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HousekeepingPacket {
    pub command_counter: u8,
    pub command_error_counter: u8,
    pub checksum_state: ResourceState,
    pub eeprom_state: ResourceState,
    pub memory_state: ResourceState,
    pub app_state: ResourceState,
    pub tables_state: ResourceState,
    pub os_state: ResourceState,
    pub cfe_core_state: ResourceState,
    pub recompute_in_progress: bool,
    pub one_shot_in_progress: bool,
    pub eeprom_error_counter: u32,
    pub memory_error_counter: u32,
    pub app_error_counter: u32,
    pub tables_error_counter: u32,
    pub os_error_counter: u32,
    pub cfe_core_error_counter: u32,
    /// Scheduler table index the next cycle resumes at
    pub current_table: usize,
    pub current_entry: usize,
    pub eeprom_baseline: u32,
    pub os_baseline: u32,
    pub cfe_core_baseline: u32,
    pub last_one_shot_address: usize,
    pub last_one_shot_size: usize,
    pub last_one_shot_max_bytes_per_cycle: usize,
    pub last_one_shot_checksum: u32,
    pub pass_counter: u32,
}

impl HousekeepingPacket {
    /// Reported state of one resource.
    pub fn state_of(&self, resource: ResourceType) -> ResourceState {
        match resource {
            ResourceType::Eeprom => self.eeprom_state,
            ResourceType::Memory => self.memory_state,
            ResourceType::Apps => self.app_state,
            ResourceType::Tables => self.tables_state,
            ResourceType::Os => self.os_state,
            ResourceType::CfeCore => self.cfe_core_state,
        }
    }

    /// Reported miscompare counter of one resource.
    pub fn error_counter_of(&self, resource: ResourceType) -> u32 {
        match resource {
            ResourceType::Eeprom => self.eeprom_error_counter,
            ResourceType::Memory => self.memory_error_counter,
            ResourceType::Apps => self.app_error_counter,
            ResourceType::Tables => self.tables_error_counter,
            ResourceType::Os => self.os_error_counter,
            ResourceType::CfeCore => self.cfe_core_error_counter,
        }
    }
}
