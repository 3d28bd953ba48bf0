//! Driving Ports (API - Inbound)
//!
//! The operator command surface of the checksum engine. Every mutating
//! operation updates the command or command-error counter and reports
//! through the event sink, so callers may ignore the returned error.

use crate::domain::{EntryRef, HousekeepingPacket, ResourceState, ResourceType};
use crate::error::CsResult;

/// Primary checksum engine API
///
/// Implemented by [`crate::service::ChecksumService`]. All methods run on
/// the single owning task and never block.
pub trait ChecksumApi {
    /// Count the command and report the version.
    fn noop(&mut self) -> CsResult<()>;

    /// Zero the command, error and per-resource counters and the pass counter.
    fn reset_counters(&mut self) -> CsResult<()>;

    /// Turn background checksumming on for every resource.
    fn enable_all(&mut self) -> CsResult<()>;

    /// Turn background checksumming off and drop all partial passes.
    fn disable_all(&mut self) -> CsResult<()>;

    fn enable_resource(&mut self, resource: ResourceType) -> CsResult<()>;

    /// Disable a resource and drop its partial passes.
    fn disable_resource(&mut self, resource: ResourceType) -> CsResult<()>;

    /// Accepted baseline of one entry.
    ///
    /// # Errors
    /// * `NotFound` / `InvalidEntry` - no such non-empty entry
    /// * `NotYetComputed` - the entry has no baseline yet
    fn report_baseline(&mut self, target: &EntryRef) -> CsResult<u32>;

    /// Recompute the baseline of one entry in the child task.
    ///
    /// # Errors
    /// * `AlreadyInProgress` - the child-task slot is taken
    /// * `NotFound` / `InvalidEntry` - no such non-empty entry
    /// * `SpawnFailed` - the platform refused the child task
    fn recompute(&mut self, target: &EntryRef) -> CsResult<()>;

    /// Enable or disable one Eeprom, Memory, Tables or Apps entry.
    fn set_entry_state(&mut self, target: &EntryRef, state: ResourceState) -> CsResult<()>;

    /// Ids of every Eeprom or Memory entry whose range holds `address`.
    fn get_entry_id(&mut self, resource: ResourceType, address: usize) -> CsResult<Vec<usize>>;

    /// Checksum an arbitrary range once in the child task.
    ///
    /// A `max_bytes_per_cycle` of zero selects the configured default.
    fn one_shot(&mut self, address: usize, size: usize, max_bytes_per_cycle: usize)
        -> CsResult<()>;

    /// Stop the active one-shot.
    fn cancel_one_shot(&mut self) -> CsResult<()>;

    /// One budgeted background wakeup.
    fn run_cycle(&mut self);

    /// Publish housekeeping, then look for table updates.
    fn send_housekeeping(&mut self) -> HousekeepingPacket;

    fn resource_state(&self, resource: ResourceType) -> ResourceState;
}
