//! In-memory table service.
//!
//! Tables are keyed by their qualified name (`App.Table`). Tables this app
//! registers hold definition entries and read back through the fixed
//! record encoding of [`encode_definition`]; tables of other apps are raw
//! byte images added through [`InMemoryTableService::add_foreign_table`].
//!
//! Each handle carries its own "updated" flag: a load or reload marks every
//! handle open on that table, and `get_address` reports and clears it.

use crate::domain::{DefinitionEntry, TableHandle};
use crate::error::TableServiceError;
use crate::ports::outbound::{AddressStatus, TableInfo, TableService, TableSource};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Width of the name field in an encoded definition record.
pub const NAME_FIELD_LEN: usize = 40;

/// Bytes per encoded definition entry: state, start, length, name.
pub const DEFINITION_RECORD_SIZE: usize = 2 + 8 + 8 + NAME_FIELD_LEN;

/// Byte image of a definition table, as checksummed through the table
/// service.
pub fn encode_definition(entries: &[DefinitionEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * DEFINITION_RECORD_SIZE);
    for entry in entries {
        out.extend_from_slice(&entry.state.to_le_bytes());
        out.extend_from_slice(&(entry.start_address as u64).to_le_bytes());
        out.extend_from_slice(&(entry.num_bytes as u64).to_le_bytes());
        let mut name = [0u8; NAME_FIELD_LEN];
        let raw = entry.name.as_bytes();
        let len = raw.len().min(NAME_FIELD_LEN);
        name[..len].copy_from_slice(&raw[..len]);
        out.extend_from_slice(&name);
    }
    out
}

#[derive(Debug, Clone)]
enum Contents {
    Definition(Vec<DefinitionEntry>),
    Raw(Vec<u8>),
}

impl Contents {
    fn bytes(&self) -> Vec<u8> {
        match self {
            Contents::Definition(entries) => encode_definition(entries),
            Contents::Raw(bytes) => bytes.clone(),
        }
    }
}

#[derive(Debug)]
struct StoredTable {
    capacity: usize,
    /// `None` until the first load
    contents: Option<Contents>,
    /// Load waiting for the next `manage` call
    pending: Option<Contents>,
}

#[derive(Debug)]
struct HandleSlot {
    table: String,
    updated: bool,
    /// The table was dropped by its owner after this handle was issued
    orphaned: bool,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, StoredTable>,
    handles: HashMap<u32, HandleSlot>,
    next_handle: u32,
}

impl Inner {
    fn open(&mut self, table: &str) -> TableHandle {
        self.next_handle += 1;
        self.handles.insert(
            self.next_handle,
            HandleSlot {
                table: table.to_string(),
                updated: false,
                orphaned: false,
            },
        );
        TableHandle(self.next_handle)
    }

    fn slot(&self, handle: TableHandle) -> Result<&HandleSlot, TableServiceError> {
        let slot = self
            .handles
            .get(&handle.0)
            .ok_or(TableServiceError::InvalidHandle(handle))?;
        if slot.orphaned {
            return Err(TableServiceError::Unregistered);
        }
        Ok(slot)
    }

    fn table(&self, handle: TableHandle) -> Result<&StoredTable, TableServiceError> {
        let name = &self.slot(handle)?.table;
        self.tables
            .get(name)
            .ok_or_else(|| TableServiceError::NotFound { name: name.clone() })
    }

    fn table_mut(&mut self, handle: TableHandle) -> Result<&mut StoredTable, TableServiceError> {
        let name = self.slot(handle)?.table.clone();
        self.tables
            .get_mut(&name)
            .ok_or(TableServiceError::NotFound { name })
    }

    fn mark_updated(&mut self, table: &str) {
        for slot in self.handles.values_mut() {
            if slot.table == table {
                slot.updated = true;
            }
        }
    }
}

/// Table service held entirely in memory.
#[derive(Debug)]
pub struct InMemoryTableService {
    app_name: String,
    inner: Mutex<Inner>,
}

impl InMemoryTableService {
    /// Service for tables registered by `app_name`.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.app_name, name)
    }

    /// Add a loaded table owned by another app.
    pub fn add_foreign_table(&self, qualified_name: &str, bytes: Vec<u8>) {
        let mut inner = self.inner.lock();
        inner.tables.insert(
            qualified_name.to_string(),
            StoredTable {
                capacity: 0,
                contents: Some(Contents::Raw(bytes)),
                pending: None,
            },
        );
        inner.mark_updated(qualified_name);
    }

    /// Add a table of another app that has been registered but never loaded.
    pub fn add_unloaded_table(&self, qualified_name: &str) {
        self.inner.lock().tables.insert(
            qualified_name.to_string(),
            StoredTable {
                capacity: 0,
                contents: None,
                pending: None,
            },
        );
    }

    /// Replace the bytes of a foreign table, as its owner reloading it.
    pub fn update_foreign_table(&self, qualified_name: &str, bytes: Vec<u8>) -> bool {
        let mut inner = self.inner.lock();
        match inner.tables.get_mut(qualified_name) {
            Some(table) => {
                table.contents = Some(Contents::Raw(bytes));
                inner.mark_updated(qualified_name);
                true
            }
            None => false,
        }
    }

    /// Drop a table as its owner would on exit. Open handles become
    /// orphaned and report `Unregistered`.
    pub fn remove_table(&self, qualified_name: &str) {
        let mut inner = self.inner.lock();
        inner.tables.remove(qualified_name);
        for slot in inner.handles.values_mut() {
            if slot.table == qualified_name {
                slot.orphaned = true;
            }
        }
    }

    /// Queue a load of one of this app's tables, applied by the next
    /// `manage` call on it.
    pub fn stage_load(&self, local_name: &str, entries: Vec<DefinitionEntry>) -> bool {
        let name = self.qualify(local_name);
        let mut inner = self.inner.lock();
        match inner.tables.get_mut(&name) {
            Some(table) => {
                table.pending = Some(Contents::Definition(pad(entries, table.capacity)));
                true
            }
            None => false,
        }
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> usize {
        self.inner.lock().handles.len()
    }
}

fn pad(mut entries: Vec<DefinitionEntry>, capacity: usize) -> Vec<DefinitionEntry> {
    if entries.len() < capacity {
        entries.resize(capacity, DefinitionEntry::empty());
    }
    entries
}

fn read_file(source: &TableSource) -> Result<Vec<DefinitionEntry>, TableServiceError> {
    match source {
        TableSource::Default(entries) => Ok(entries.clone()),
        TableSource::File(path) => {
            let text = std::fs::read_to_string(path).map_err(|err| TableServiceError::LoadFailed {
                reason: format!("{}: {}", path.display(), err),
            })?;
            serde_json::from_str(&text).map_err(|err| TableServiceError::LoadFailed {
                reason: format!("{}: {}", path.display(), err),
            })
        }
    }
}

impl TableService for InMemoryTableService {
    fn register(&self, name: &str, capacity: usize) -> Result<TableHandle, TableServiceError> {
        let qualified = self.qualify(name);
        let mut inner = self.inner.lock();
        inner.tables.insert(
            qualified.clone(),
            StoredTable {
                capacity,
                contents: Some(Contents::Definition(pad(Vec::new(), capacity))),
                pending: None,
            },
        );
        let handle = inner.open(&qualified);
        debug!(table = %qualified, ?handle, "Table registered");
        Ok(handle)
    }

    fn load(&self, handle: TableHandle, source: TableSource) -> Result<(), TableServiceError> {
        let entries = read_file(&source)?;
        let mut inner = self.inner.lock();
        let table = inner.table_mut(handle)?;
        if entries.len() > table.capacity {
            return Err(TableServiceError::LoadFailed {
                reason: format!(
                    "{} entries exceed capacity {}",
                    entries.len(),
                    table.capacity
                ),
            });
        }
        table.contents = Some(Contents::Definition(pad(entries, table.capacity)));
        table.pending = None;
        let name = inner.slot(handle)?.table.clone();
        inner.mark_updated(&name);
        Ok(())
    }

    fn definition(&self, handle: TableHandle) -> Result<Vec<DefinitionEntry>, TableServiceError> {
        let inner = self.inner.lock();
        match &inner.table(handle)?.contents {
            Some(Contents::Definition(entries)) => Ok(entries.clone()),
            Some(Contents::Raw(_)) => Err(TableServiceError::InvalidHandle(handle)),
            None => Err(TableServiceError::NeverLoaded),
        }
    }

    fn write_definition(
        &self,
        handle: TableHandle,
        entries: &[DefinitionEntry],
    ) -> Result<(), TableServiceError> {
        let mut inner = self.inner.lock();
        let table = inner.table_mut(handle)?;
        match &mut table.contents {
            Some(Contents::Definition(current)) if entries.len() == current.len() => {
                current.clone_from_slice(entries);
                Ok(())
            }
            Some(Contents::Definition(current)) => Err(TableServiceError::OutOfBounds {
                offset: 0,
                len: entries.len(),
                size: current.len(),
            }),
            _ => Err(TableServiceError::InvalidHandle(handle)),
        }
    }

    fn get_address(&self, handle: TableHandle) -> Result<AddressStatus, TableServiceError> {
        let mut inner = self.inner.lock();
        if inner.table(handle)?.contents.is_none() {
            return Err(TableServiceError::NeverLoaded);
        }
        let slot = inner
            .handles
            .get_mut(&handle.0)
            .ok_or(TableServiceError::InvalidHandle(handle))?;
        if std::mem::take(&mut slot.updated) {
            Ok(AddressStatus::Updated)
        } else {
            Ok(AddressStatus::Current)
        }
    }

    fn release_address(&self, handle: TableHandle) -> Result<(), TableServiceError> {
        self.inner.lock().slot(handle).map(|_| ())
    }

    fn manage(&self, handle: TableHandle) -> Result<(), TableServiceError> {
        let mut inner = self.inner.lock();
        let table = inner.table_mut(handle)?;
        if let Some(pending) = table.pending.take() {
            table.contents = Some(pending);
            let name = inner.slot(handle)?.table.clone();
            debug!(table = %name, "Staged load applied");
            inner.mark_updated(&name);
        }
        Ok(())
    }

    fn share(&self, qualified_name: &str) -> Result<TableHandle, TableServiceError> {
        let mut inner = self.inner.lock();
        if !inner.tables.contains_key(qualified_name) {
            return Err(TableServiceError::NotFound {
                name: qualified_name.to_string(),
            });
        }
        Ok(inner.open(qualified_name))
    }

    fn unregister(&self, handle: TableHandle) -> Result<(), TableServiceError> {
        self.inner
            .lock()
            .handles
            .remove(&handle.0)
            .map(|_| ())
            .ok_or(TableServiceError::InvalidHandle(handle))
    }

    fn get_info(&self, handle: TableHandle) -> Result<TableInfo, TableServiceError> {
        let inner = self.inner.lock();
        let size = inner
            .table(handle)?
            .contents
            .as_ref()
            .map(|contents| contents.bytes().len())
            .unwrap_or(0);
        Ok(TableInfo { size })
    }

    fn read(
        &self,
        handle: TableHandle,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), TableServiceError> {
        let inner = self.inner.lock();
        let bytes = inner
            .table(handle)?
            .contents
            .as_ref()
            .ok_or(TableServiceError::NeverLoaded)?
            .bytes();
        let end = offset
            .checked_add(buf.len())
            .filter(|end| *end <= bytes.len())
            .ok_or(TableServiceError::OutOfBounds {
                offset,
                len: buf.len(),
                size: bytes.len(),
            })?;
        buf.copy_from_slice(&bytes[offset..end]);
        Ok(())
    }
}
