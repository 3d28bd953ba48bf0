//! Definition and results table entries.

use super::types::{EntryState, MemoryWindow, ResourceState, TableHandle};
use serde::{Deserialize, Serialize};

/// One row of an operator-supplied definition table.
///
/// The state is kept raw so that validation can see illegal values.
/// `name` is only meaningful for the Tables and Apps definition tables.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionEntry {
    pub state: u16,
    #[serde(default)]
    pub start_address: usize,
    #[serde(default)]
    pub num_bytes: usize,
    #[serde(default)]
    pub name: String,
}

impl DefinitionEntry {
    /// An unused slot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Address-range entry for the Eeprom or Memory tables.
    pub fn range(state: EntryState, start_address: usize, num_bytes: usize) -> Self {
        Self {
            state: state.raw(),
            start_address,
            num_bytes,
            name: String::new(),
        }
    }

    /// Name-addressed entry for the Tables or Apps tables.
    pub fn named(state: EntryState, name: impl Into<String>) -> Self {
        Self {
            state: state.raw(),
            start_address: 0,
            num_bytes: 0,
            name: name.into(),
        }
    }

    pub fn entry_state(&self) -> Option<EntryState> {
        EntryState::from_raw(self.state)
    }

    pub fn is_empty(&self) -> bool {
        self.state == EntryState::Empty.raw()
    }

    pub fn window(&self) -> MemoryWindow {
        MemoryWindow::new(self.start_address, self.num_bytes)
    }
}

/// Live checksum progress for one non-empty definition entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub state: ResourceState,
    pub computed_yet: bool,
    /// Accepted baseline, only meaningful once `computed_yet` is set
    pub comparison_value: u32,
    /// Resume cursor into the range, never past `num_bytes`
    pub byte_offset: usize,
    /// Partial accumulator for the bytes before `byte_offset`
    pub temp_checksum_value: u32,
    pub start_address: usize,
    pub num_bytes: usize,
    pub name: String,
    pub table_handle: Option<TableHandle>,
    pub is_cs_owner: bool,
}

impl ResultEntry {
    /// Fresh entry over a range, with no progress and no baseline.
    pub fn new(state: ResourceState, window: MemoryWindow) -> Self {
        Self {
            state,
            computed_yet: false,
            comparison_value: 0,
            byte_offset: 0,
            temp_checksum_value: 0,
            start_address: window.base,
            num_bytes: window.len,
            name: String::new(),
            table_handle: None,
            is_cs_owner: false,
        }
    }

    /// Fresh name-addressed entry; its range is resolved when computed.
    pub fn named(state: ResourceState, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new(state, MemoryWindow::EMPTY)
        }
    }

    pub fn window(&self) -> MemoryWindow {
        MemoryWindow::new(self.start_address, self.num_bytes)
    }

    pub fn remaining(&self) -> usize {
        self.num_bytes.saturating_sub(self.byte_offset)
    }

    /// Drop a partial pass.
    pub fn zero_temp_values(&mut self) {
        self.byte_offset = 0;
        self.temp_checksum_value = 0;
    }

    /// Drop a partial pass and require a new baseline capture.
    pub fn restart(&mut self) {
        self.zero_temp_values();
        self.computed_yet = false;
    }

    /// Forget the baseline entirely.
    pub fn clear_baseline(&mut self) {
        self.restart();
        self.comparison_value = 0;
    }
}

/// Fixed-capacity results table; `None` is an empty slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsTable {
    slots: Box<[Option<ResultEntry>]>,
}

impl ResultsTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&ResultEntry> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ResultEntry> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Replace a slot. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, entry: Option<ResultEntry>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = entry;
        }
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Raw state reported for `index`: Empty for a free slot, Undefined
    /// when the index lies outside the table.
    pub fn reported_state(&self, index: usize) -> u16 {
        match self.slots.get(index) {
            None => EntryState::UNDEFINED,
            Some(None) => EntryState::Empty.raw(),
            Some(Some(entry)) => entry.state.entry_state().raw(),
        }
    }

    /// Non-empty entries with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ResultEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (i, e)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut ResultEntry)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|e| (i, e)))
    }

    /// Index of the first non-empty entry named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.iter().find(|(_, e)| e.name == name).map(|(i, _)| i)
    }

    /// First Enabled entry at or after `from`.
    pub fn next_enabled(&self, from: usize) -> Option<usize> {
        (from..self.slots.len()).find(|&i| {
            self.get(i)
                .map(|e| e.state == ResourceState::Enabled)
                .unwrap_or(false)
        })
    }

    pub fn active_count(&self) -> usize {
        self.iter().count()
    }

    pub fn zero_temp_values(&mut self) {
        for (_, entry) in self.iter_mut() {
            entry.zero_temp_values();
        }
    }
}
