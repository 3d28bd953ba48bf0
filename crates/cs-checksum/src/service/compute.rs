//! Per-resource compute steps.
//!
//! [`ComputeContext`] holds only the collaborators a compute step needs, so
//! an owned clone can move into a child task while the main task keeps
//! scanning with its own.

use super::ChecksumDependencies;
use crate::domain::{
    apply_chunk, fold_chunk, step, ChildOutcome, CsEvent, EventId, MemorySource, MemoryWindow,
    ResourceState, ResourceType, ResultEntry, SourceError, StepOutcome, TableBytes, TableHandle,
};
use crate::error::{status_bits, TableServiceError};
use crate::ports::outbound::{
    AddressStatus, ChecksumProvider, EventSink, ExecutiveServices, MemoryReader, TableInfo,
    TableService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of one compute attempt on an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ComputeStatus {
    Step(StepOutcome),
    /// The table or app behind a named entry could not be located
    NotFound,
    /// The bytes of a range could not be read
    ReadFailed(SourceError),
}

/// Status codes collected while acquiring a table, for the failure event.
#[derive(Default)]
struct TableAccess {
    share: i32,
    info: i32,
    address: i32,
}

#[derive(Clone)]
pub(crate) struct ComputeContext {
    checksum: Arc<dyn ChecksumProvider>,
    memory: Arc<dyn MemoryReader>,
    tables: Arc<dyn TableService>,
    executive: Arc<dyn ExecutiveServices>,
    events: Arc<dyn EventSink>,
}

impl ComputeContext {
    pub(crate) fn new(deps: &ChecksumDependencies) -> Self {
        Self {
            checksum: Arc::clone(&deps.checksum),
            memory: Arc::clone(&deps.memory),
            tables: Arc::clone(&deps.tables),
            executive: Arc::clone(&deps.executive),
            events: Arc::clone(&deps.events),
        }
    }

    /// Fold the next chunk of `entry`, resolving its bytes the way its
    /// resource requires.
    pub(crate) fn compute(
        &self,
        resource: ResourceType,
        entry: &mut ResultEntry,
        budget: usize,
    ) -> ComputeStatus {
        match resource {
            ResourceType::Tables => self.compute_table(entry, budget),
            ResourceType::Apps => self.compute_app(entry, budget),
            ResourceType::Eeprom
            | ResourceType::Memory
            | ResourceType::Os
            | ResourceType::CfeCore => match self.compute_range(entry, budget) {
                Ok(outcome) => ComputeStatus::Step(outcome),
                Err(err) => ComputeStatus::ReadFailed(err),
            },
        }
    }

    /// Raw address range.
    pub(crate) fn compute_range(
        &self,
        entry: &mut ResultEntry,
        budget: usize,
    ) -> Result<StepOutcome, SourceError> {
        let source = MemorySource::new(self.memory.as_ref(), entry.start_address);
        step(entry, &source, self.checksum.as_ref(), budget)
    }

    /// Code segment of a loaded application, looked up on every step.
    pub(crate) fn compute_app(&self, entry: &mut ResultEntry, budget: usize) -> ComputeStatus {
        let window = match self.executive.app_code_segment(&entry.name) {
            Ok(Some(window)) => window,
            Ok(None) => {
                self.events.send(
                    CsEvent::debug(
                        EventId::ComputeAppPlatform,
                        format!(
                            "CS cannot get a valid address for {}, due to the platform",
                            entry.name
                        ),
                    )
                    .for_resource(ResourceType::Apps),
                );
                self.app_not_found(&entry.name, 0, false);
                return ComputeStatus::NotFound;
            }
            Err(code) => {
                self.app_not_found(&entry.name, code, true);
                return ComputeStatus::NotFound;
            }
        };

        entry.start_address = window.base;
        entry.num_bytes = window.len;
        if entry.byte_offset > entry.num_bytes {
            entry.zero_temp_values();
        }

        match self.compute_range(entry, budget) {
            Ok(outcome) => ComputeStatus::Step(outcome),
            Err(err) => {
                warn!(app = %entry.name, error = %err, "App code segment unreadable");
                self.events.send(
                    CsEvent::error(
                        EventId::ComputeAppError,
                        format!("CS Apps: Could not read code segment of app {}: {}", entry.name, err),
                    )
                    .for_resource(ResourceType::Apps),
                );
                ComputeStatus::NotFound
            }
        }
    }

    fn app_not_found(&self, name: &str, code: i32, address_valid: bool) {
        self.events.send(
            CsEvent::error(
                EventId::ComputeAppError,
                format!(
                    "CS Apps: Problems getting app {} info, status: 0x{:08X}, address valid: {}",
                    name,
                    status_bits(code),
                    u8::from(address_valid)
                ),
            )
            .for_resource(ResourceType::Apps),
        );
    }

    /// Table owned by some app, accessed through the table service.
    ///
    /// The table's address is always released before returning so that
    /// its owner can keep updating it.
    pub(crate) fn compute_table(&self, entry: &mut ResultEntry, budget: usize) -> ComputeStatus {
        let mut access = TableAccess::default();
        match self.try_compute_table(entry, budget, &mut access) {
            Ok(outcome) => ComputeStatus::Step(outcome),
            Err(err) => {
                debug!(table = %entry.name, error = %err, "Table checksum skipped");
                self.events.send(
                    CsEvent::error(
                        EventId::ComputeTablesError,
                        format!(
                            "CS Tables: Problem Getting table {} info Share: 0x{:08X}, GetInfo: 0x{:08X}, GetAddress: 0x{:08X}",
                            entry.name,
                            status_bits(access.share),
                            status_bits(access.info),
                            status_bits(access.address)
                        ),
                    )
                    .for_resource(ResourceType::Tables),
                );
                ComputeStatus::NotFound
            }
        }
    }

    fn try_compute_table(
        &self,
        entry: &mut ResultEntry,
        budget: usize,
        access: &mut TableAccess,
    ) -> Result<StepOutcome, SourceError> {
        let handle = match entry.table_handle {
            Some(handle) => handle,
            None => self.share(entry, access)?,
        };

        let (handle, info, status) = match self.acquire(handle, access) {
            Ok((info, status)) => (handle, info, status),
            Err(TableServiceError::Unregistered) => {
                // The owner dropped the table; see whether it came back.
                if let Err(err) = self.tables.unregister(handle) {
                    debug!(table = %entry.name, error = %err, "Stale table handle not unregistered");
                }
                entry.table_handle = None;
                entry.clear_baseline();
                entry.start_address = 0;
                entry.num_bytes = 0;

                let handle = self.share(entry, access)?;
                let (info, status) = self.acquire(handle, access)?;
                (handle, info, status)
            }
            Err(err) => return Err(err.into()),
        };

        entry.start_address = 0;
        entry.num_bytes = info.size;
        if status == AddressStatus::Updated || entry.byte_offset > entry.num_bytes {
            entry.restart();
        }

        let outcome = self.fold_table(entry, handle, budget);

        if let Err(err) = self.tables.release_address(handle) {
            self.events.send(
                CsEvent::error(
                    EventId::ComputeTablesRelease,
                    format!(
                        "CS Tables: Could not release address for table {}, returned: 0x{:08X}",
                        entry.name,
                        status_bits(err.code())
                    ),
                )
                .for_resource(ResourceType::Tables),
            );
        }

        outcome
    }

    fn fold_table(
        &self,
        entry: &mut ResultEntry,
        handle: TableHandle,
        budget: usize,
    ) -> Result<StepOutcome, SourceError> {
        let source = TableBytes::new(self.tables.as_ref(), handle);
        let chunk = fold_chunk(entry, &source, self.checksum.as_ref(), budget)?;

        if chunk.last {
            // Start over if the table was reloaded while this pass ran.
            let _ = self.tables.release_address(handle);
            if let Ok(AddressStatus::Updated) = self.tables.get_address(handle) {
                entry.clear_baseline();
                return Ok(StepOutcome::InProgress);
            }
        }

        Ok(apply_chunk(entry, chunk))
    }

    fn share(
        &self,
        entry: &mut ResultEntry,
        access: &mut TableAccess,
    ) -> Result<TableHandle, TableServiceError> {
        let handle = self.tables.share(&entry.name).map_err(|err| {
            access.share = err.code();
            err
        })?;
        entry.table_handle = Some(handle);
        Ok(handle)
    }

    /// Size and address of a table. The address of a never-loaded table
    /// is handed straight back so its owner is not locked out.
    fn acquire(
        &self,
        handle: TableHandle,
        access: &mut TableAccess,
    ) -> Result<(TableInfo, AddressStatus), TableServiceError> {
        let info = self.tables.get_info(handle);
        if let Err(err) = &info {
            access.info = err.code();
        }

        let status = match self.tables.get_address(handle) {
            Ok(status) => status,
            Err(err) => {
                access.address = err.code();
                if err == TableServiceError::NeverLoaded {
                    let _ = self.tables.release_address(handle);
                }
                return Err(err);
            }
        };

        match info {
            Ok(info) => Ok((info, status)),
            Err(err) => {
                let _ = self.tables.release_address(handle);
                Err(err)
            }
        }
    }

    // =========================================================================
    // CHILD TASK BODIES
    // =========================================================================

    /// Drive a recompute entry through a full pass.
    pub(crate) fn recompute(
        &self,
        resource: ResourceType,
        mut entry: ResultEntry,
        budget: usize,
        delay: Duration,
    ) -> ChildOutcome {
        loop {
            match self.compute(resource, &mut entry, budget) {
                ComputeStatus::Step(StepOutcome::Completed { .. }) => {
                    return ChildOutcome::Recomputed { entry };
                }
                ComputeStatus::Step(StepOutcome::InProgress) => pause(delay),
                ComputeStatus::NotFound => return ChildOutcome::RecomputeFailed { entry },
                ComputeStatus::ReadFailed(err) => {
                    warn!(resource = %resource, error = %err, "Recompute read failed");
                    return ChildOutcome::RecomputeFailed { entry };
                }
            }
        }
    }

    /// Checksum an arbitrary window once.
    pub(crate) fn one_shot(&self, window: MemoryWindow, budget: usize, delay: Duration) -> ChildOutcome {
        let mut entry = ResultEntry::new(ResourceState::Enabled, window);
        loop {
            match self.compute_range(&mut entry, budget) {
                Ok(StepOutcome::Completed { value, .. }) => {
                    return ChildOutcome::OneShot { checksum: value };
                }
                Ok(StepOutcome::InProgress) => pause(delay),
                Err(err) => {
                    return ChildOutcome::OneShotFailed {
                        reason: err.to_string(),
                    };
                }
            }
        }
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
