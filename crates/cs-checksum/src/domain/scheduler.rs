//! Background scheduler cursor.
//!
//! The cursor names the (table, entry) the background cycle resumes at.
//! Tables are visited in [`ResourceType::SCHEDULE_ORDER`]; wrapping past the
//! last one starts a new pass.

use super::entry::ResultsTable;
use super::types::ResourceType;
use serde::Serialize;

/// Resumable position of the background scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleCursor {
    /// Index into the scheduler order
    pub table: usize,
    /// Entry within the current table
    pub entry: usize,
    /// Completed passes over all tables
    pub pass_counter: u32,
}

impl ScheduleCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource the cursor currently points at.
    pub fn resource(&self) -> Option<ResourceType> {
        ResourceType::from_schedule_index(self.table)
    }

    /// Whether the current table is the last in the scheduler order.
    pub fn at_last_table(&self) -> bool {
        self.table + 1 >= ResourceType::SCHEDULE_ORDER.len()
    }

    /// Move to the first entry of the next table, wrapping to the first
    /// table and counting a pass after the last one.
    pub fn go_to_next_table(&mut self) {
        if self.table + 1 < ResourceType::SCHEDULE_ORDER.len() {
            self.table += 1;
        } else {
            self.table = 0;
            self.pass_counter = self.pass_counter.wrapping_add(1);
        }
        self.entry = 0;
    }

    /// Advance the entry cursor to the first Enabled entry at or after it.
    ///
    /// Returns `None`, with the cursor left at the table's capacity, when no
    /// Enabled entry remains.
    pub fn find_enabled_entry(&mut self, table: &ResultsTable) -> Option<usize> {
        match table.next_enabled(self.entry) {
            Some(index) => {
                self.entry = index;
                Some(index)
            }
            None => {
                self.entry = self.entry.max(table.capacity());
                None
            }
        }
    }

    /// Move past the current entry.
    pub fn advance_entry(&mut self) {
        self.entry += 1;
    }

    pub fn reset(&mut self) {
        self.table = 0;
        self.entry = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::ResultEntry;
    use crate::domain::types::{MemoryWindow, ResourceState};

    #[test]
    fn test_wraps_and_counts_pass() {
        let mut cursor = ScheduleCursor::new();
        for _ in 0..5 {
            cursor.go_to_next_table();
        }
        assert_eq!(cursor.resource(), Some(ResourceType::Apps));
        assert!(cursor.at_last_table());
        assert_eq!(cursor.pass_counter, 0);

        cursor.go_to_next_table();
        assert_eq!(cursor.resource(), Some(ResourceType::CfeCore));
        assert_eq!(cursor.pass_counter, 1);
    }

    #[test]
    fn test_next_table_resets_entry() {
        let mut cursor = ScheduleCursor::new();
        cursor.entry = 7;
        cursor.go_to_next_table();
        assert_eq!(cursor.entry, 0);
    }

    #[test]
    fn test_find_enabled_entry() {
        let mut table = ResultsTable::with_capacity(4);
        table.set(
            2,
            Some(ResultEntry::new(ResourceState::Enabled, MemoryWindow::new(0, 4))),
        );

        let mut cursor = ScheduleCursor::new();
        assert_eq!(cursor.find_enabled_entry(&table), Some(2));
        assert_eq!(cursor.entry, 2);

        cursor.advance_entry();
        assert_eq!(cursor.find_enabled_entry(&table), None);
        assert_eq!(cursor.entry, 4);
    }
}
