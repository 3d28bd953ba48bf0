//! # Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the engine depends on. Production adapters live in
//! `crate::adapters`; tests swap in the in-memory ones.

use crate::domain::{
    CdsHandle, CsEvent, DefinitionEntry, HousekeepingPacket, MemoryWindow, ResetKind,
    TableHandle, TaskId,
};
use crate::error::TableServiceError;
use std::path::PathBuf;

// =============================================================================
// CHECKSUM PRIMITIVE
// =============================================================================

/// Incremental checksum primitive.
///
/// `calculate(b, calculate(a, seed))` must equal `calculate(a ++ b, seed)`
/// so that a range can be folded over any number of wakeup cycles.
pub trait ChecksumProvider: Send + Sync {
    /// Fold `data` into the running value `seed`.
    fn calculate(&self, data: &[u8], seed: u32) -> u32;

    /// Checksum of `data` from a zero seed.
    fn checksum(&self, data: &[u8]) -> u32 {
        self.calculate(data, 0)
    }
}

// =============================================================================
// MEMORY ACCESS
// =============================================================================

/// Failure to read monitored memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Memory read of {len} bytes at 0x{address:08X} failed")]
pub struct MemoryReadError {
    pub address: usize,
    pub len: usize,
}

/// Reads bytes from the platform address space.
pub trait MemoryReader: Send + Sync {
    /// Copy `buf.len()` bytes starting at `address`.
    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), MemoryReadError>;
}

/// Platform address range validity check.
pub trait RangeValidator: Send + Sync {
    /// `Err` carries the platform status code.
    fn check_range(&self, address: usize, len: usize) -> Result<(), i32>;

    fn validate_range(&self, address: usize, len: usize) -> bool {
        self.check_range(address, len).is_ok()
    }
}

// =============================================================================
// TABLE SERVICE
// =============================================================================

/// Where a definition table load comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// Operator-provided table file
    File(PathBuf),
    /// Built-in default image
    Default(Vec<DefinitionEntry>),
}

/// Outcome of acquiring a table's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStatus {
    /// Contents unchanged since this handle last looked
    Current,
    /// Contents were reloaded since this handle last looked
    Updated,
}

/// Table metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInfo {
    pub size: usize,
}

/// Loads, registers and holds table memory, and reports updates.
///
/// Names passed to `register` are local to this app; names passed to
/// `share` are fully qualified (`App.Table`).
pub trait TableService: Send + Sync {
    /// Register a table owned by this app with room for `capacity` entries.
    fn register(&self, name: &str, capacity: usize) -> Result<TableHandle, TableServiceError>;

    /// Load new contents into a registered table.
    fn load(&self, handle: TableHandle, source: TableSource) -> Result<(), TableServiceError>;

    /// Current definition entries of a definition table.
    fn definition(&self, handle: TableHandle) -> Result<Vec<DefinitionEntry>, TableServiceError>;

    /// Replace the entries of a definition table in place.
    fn write_definition(
        &self,
        handle: TableHandle,
        entries: &[DefinitionEntry],
    ) -> Result<(), TableServiceError>;

    /// Acquire the table's address, reporting whether it changed.
    fn get_address(&self, handle: TableHandle) -> Result<AddressStatus, TableServiceError>;

    fn release_address(&self, handle: TableHandle) -> Result<(), TableServiceError>;

    /// Give the service a chance to apply pending loads.
    fn manage(&self, handle: TableHandle) -> Result<(), TableServiceError>;

    /// Obtain access to a table owned by another app.
    fn share(&self, qualified_name: &str) -> Result<TableHandle, TableServiceError>;

    fn unregister(&self, handle: TableHandle) -> Result<(), TableServiceError>;

    fn get_info(&self, handle: TableHandle) -> Result<TableInfo, TableServiceError>;

    /// Copy table bytes starting at `offset`.
    fn read(
        &self,
        handle: TableHandle,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), TableServiceError>;
}

// =============================================================================
// EXECUTIVE SERVICES
// =============================================================================

/// Code-segment lookups and boot information.
pub trait ExecutiveServices: Send + Sync {
    fn reset_kind(&self) -> ResetKind;

    /// Core executive text segment.
    fn cfe_text_segment(&self) -> MemoryWindow;

    /// Kernel text segment, `None` when the platform cannot provide it.
    fn kernel_text_segment(&self) -> Option<MemoryWindow>;

    /// Code segment of a loaded application.
    ///
    /// `Err` carries the status for an unknown app; `Ok(None)` means the
    /// app is known but the platform reports no valid addresses.
    fn app_code_segment(&self, app_name: &str) -> Result<Option<MemoryWindow>, i32>;
}

// =============================================================================
// CHILD TASKS
// =============================================================================

/// Body of a child task.
pub type ChildJob = Box<dyn FnOnce() + Send + 'static>;

/// Platform child-task primitive.
pub trait TaskSpawner: Send + Sync {
    /// `Err` carries the platform status code.
    fn spawn(&self, name: &str, job: ChildJob) -> Result<TaskId, i32>;

    /// Request deletion of a child task.
    fn delete(&self, id: TaskId) -> Result<(), i32>;
}

// =============================================================================
// CRITICAL DATA STORE
// =============================================================================

/// Result of registering a CDS block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdsRegistration {
    pub handle: CdsHandle,
    /// The block survived from before this boot
    pub already_existed: bool,
}

/// Battery-backed storage that survives a processor reset.
pub trait CriticalDataStore: Send + Sync {
    fn register(&self, name: &str, size: usize) -> Result<CdsRegistration, i32>;

    fn restore(&self, handle: CdsHandle, buf: &mut [u8]) -> Result<(), i32>;

    fn save(&self, handle: CdsHandle, data: &[u8]) -> Result<(), i32>;
}

// =============================================================================
// EVENTS AND TELEMETRY
// =============================================================================

/// Operator event sink.
pub trait EventSink: Send + Sync {
    fn send(&self, event: CsEvent);
}

/// Housekeeping telemetry output.
pub trait HousekeepingPublisher: Send + Sync {
    fn publish(&self, packet: &HousekeepingPacket);
}
