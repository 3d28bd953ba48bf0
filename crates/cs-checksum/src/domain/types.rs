//! Core value types shared by every checksum component.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of monitored resource.
///
/// Each resource has its own enable state and error counter. The four
/// table-backed resources also own a definition/results table pair, while
/// `Os` and `CfeCore` monitor one fixed code segment each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Eeprom,
    Memory,
    Apps,
    Tables,
    Os,
    CfeCore,
}

impl ResourceType {
    /// All resources in persisted (CDS) order.
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Eeprom,
        ResourceType::Memory,
        ResourceType::Apps,
        ResourceType::Tables,
        ResourceType::Os,
        ResourceType::CfeCore,
    ];

    /// Background scheduler visiting order.
    pub const SCHEDULE_ORDER: [ResourceType; 6] = [
        ResourceType::CfeCore,
        ResourceType::Os,
        ResourceType::Eeprom,
        ResourceType::Memory,
        ResourceType::Tables,
        ResourceType::Apps,
    ];

    /// Position in the persisted snapshot.
    pub fn persisted_index(self) -> usize {
        match self {
            ResourceType::Eeprom => 0,
            ResourceType::Memory => 1,
            ResourceType::Apps => 2,
            ResourceType::Tables => 3,
            ResourceType::Os => 4,
            ResourceType::CfeCore => 5,
        }
    }

    /// Position in the background scheduler order.
    pub fn schedule_index(self) -> usize {
        match self {
            ResourceType::CfeCore => 0,
            ResourceType::Os => 1,
            ResourceType::Eeprom => 2,
            ResourceType::Memory => 3,
            ResourceType::Tables => 4,
            ResourceType::Apps => 5,
        }
    }

    /// Resource visited at `index` of the scheduler order.
    pub fn from_schedule_index(index: usize) -> Option<ResourceType> {
        Self::SCHEDULE_ORDER.get(index).copied()
    }

    /// Table-backed view of this resource, if it has one.
    pub fn table(self) -> Option<TableResource> {
        match self {
            ResourceType::Eeprom => Some(TableResource::Eeprom),
            ResourceType::Memory => Some(TableResource::Memory),
            ResourceType::Apps => Some(TableResource::Apps),
            ResourceType::Tables => Some(TableResource::Tables),
            ResourceType::Os | ResourceType::CfeCore => None,
        }
    }

    /// Operator-facing label used in event text.
    pub fn label(self) -> &'static str {
        match self {
            ResourceType::Eeprom => "Eeprom",
            ResourceType::Memory => "Memory",
            ResourceType::Apps => "App",
            ResourceType::Tables => "Tables",
            ResourceType::Os => "OS",
            ResourceType::CfeCore => "cFE Core",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four resources backed by a definition/results table pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableResource {
    Eeprom,
    Memory,
    Apps,
    Tables,
}

impl TableResource {
    /// Initialization order.
    pub const ALL: [TableResource; 4] = [
        TableResource::Eeprom,
        TableResource::Memory,
        TableResource::Apps,
        TableResource::Tables,
    ];

    pub fn resource(self) -> ResourceType {
        match self {
            TableResource::Eeprom => ResourceType::Eeprom,
            TableResource::Memory => ResourceType::Memory,
            TableResource::Apps => ResourceType::Apps,
            TableResource::Tables => ResourceType::Tables,
        }
    }

    /// Entries are addressed by name rather than by memory range.
    pub fn is_named(self) -> bool {
        matches!(self, TableResource::Apps | TableResource::Tables)
    }

    /// Name this app registers the definition table under.
    pub fn definition_table_name(self) -> &'static str {
        match self {
            TableResource::Eeprom => "DefEepromTbl",
            TableResource::Memory => "DefMemoryTbl",
            TableResource::Apps => "DefAppTbl",
            TableResource::Tables => "DefTablesTbl",
        }
    }

    /// Name this app registers the results table under.
    pub fn results_table_name(self) -> &'static str {
        match self {
            TableResource::Eeprom => "ResEepromTbl",
            TableResource::Memory => "ResMemoryTbl",
            TableResource::Apps => "ResAppTbl",
            TableResource::Tables => "ResTablesTbl",
        }
    }
}

impl fmt::Display for TableResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.resource().fmt(f)
    }
}

/// Raw state of a definition-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum EntryState {
    Empty = 0,
    Enabled = 1,
    Disabled = 2,
}

impl EntryState {
    /// Reported state for entry ids outside the table.
    pub const UNDEFINED: u16 = 3;

    pub fn from_raw(raw: u16) -> Option<EntryState> {
        match raw {
            0 => Some(EntryState::Empty),
            1 => Some(EntryState::Enabled),
            2 => Some(EntryState::Disabled),
            _ => None,
        }
    }

    pub fn raw(self) -> u16 {
        self as u16
    }
}

/// Enable state of a resource, of the global checksum switch, and of a
/// non-empty results entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceState {
    Enabled = 1,
    Disabled = 2,
}

impl ResourceState {
    pub fn from_raw(raw: u8) -> Option<ResourceState> {
        match raw {
            1 => Some(ResourceState::Enabled),
            2 => Some(ResourceState::Disabled),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        self as u8
    }

    pub fn is_enabled(self) -> bool {
        self == ResourceState::Enabled
    }

    /// Matching definition-entry state.
    pub fn entry_state(self) -> EntryState {
        match self {
            ResourceState::Enabled => EntryState::Enabled,
            ResourceState::Disabled => EntryState::Disabled,
        }
    }

    /// Results-entry state for a definition state; `None` for Empty.
    pub fn from_entry_state(state: EntryState) -> Option<ResourceState> {
        match state {
            EntryState::Empty => None,
            EntryState::Enabled => Some(ResourceState::Enabled),
            EntryState::Disabled => Some(ResourceState::Disabled),
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceState::Enabled => f.write_str("enabled"),
            ResourceState::Disabled => f.write_str("disabled"),
        }
    }
}

/// Opaque address window `[base, base + len)`.
///
/// Only the memory adapters turn a window into actual reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryWindow {
    pub base: usize,
    pub len: usize,
}

impl MemoryWindow {
    pub const EMPTY: MemoryWindow = MemoryWindow { base: 0, len: 0 };

    pub fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }

    /// One past the last byte, `None` on address-space overflow.
    pub fn end(&self) -> Option<usize> {
        self.base.checked_add(self.len)
    }

    /// Inclusive containment used by entry lookup by address.
    pub fn contains_inclusive(&self, address: usize) -> bool {
        match self.end() {
            Some(end) => address >= self.base && address <= end,
            None => address >= self.base,
        }
    }

    /// Whether `inner` lies completely inside this window.
    pub fn covers(&self, inner: &MemoryWindow) -> bool {
        match (self.end(), inner.end()) {
            (Some(end), Some(inner_end)) => inner.base >= self.base && inner_end <= end,
            _ => false,
        }
    }
}

/// Handle issued by the table service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableHandle(pub u32);

/// Handle issued by the critical data store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CdsHandle(pub u32);

/// Identifier of a spawned child task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(pub u32);

/// Kind of the most recent boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetKind {
    PowerOn,
    Processor,
}

/// Operator reference to one monitored entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryRef {
    CfeCore,
    Os,
    Eeprom(usize),
    Memory(usize),
    Table(String),
    App(String),
}

impl EntryRef {
    pub fn resource(&self) -> ResourceType {
        match self {
            EntryRef::CfeCore => ResourceType::CfeCore,
            EntryRef::Os => ResourceType::Os,
            EntryRef::Eeprom(_) => ResourceType::Eeprom,
            EntryRef::Memory(_) => ResourceType::Memory,
            EntryRef::Table(_) => ResourceType::Tables,
            EntryRef::App(_) => ResourceType::Apps,
        }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRef::CfeCore | EntryRef::Os => write!(f, "{}", self.resource()),
            EntryRef::Eeprom(id) | EntryRef::Memory(id) => {
                write!(f, "{} entry {}", self.resource(), id)
            }
            EntryRef::Table(name) => write!(f, "table {}", name),
            EntryRef::App(name) => write!(f, "app {}", name),
        }
    }
}
