//! Persisting resource states across a processor reset.

use super::ChecksumService;
use crate::domain::{CdsHandle, CdsSnapshot, CsEvent, EventId, ResetKind, ResourceStates};
use crate::error::{status_bits, CdsError};
use tracing::{debug, error, info};

/// Name of this app's CDS block.
pub(crate) const CDS_NAME: &str = "CS_CDS";

impl ChecksumService {
    /// Register the store and, after a processor reset of a store that
    /// survived, restore the resource states from it.
    ///
    /// Returns `true` when the store was created by this registration and
    /// still has to be seeded with the current states.
    pub(crate) fn init_cds(&mut self) -> bool {
        if !self.config.preserve_states_on_processor_reset {
            return false;
        }

        let registration = match self.deps.cds.register(CDS_NAME, CdsSnapshot::SIZE) {
            Ok(registration) => registration,
            Err(code) => {
                self.cds_failure(CdsError::Register(code));
                return false;
            }
        };
        self.state.cds_handle = Some(registration.handle);

        let reset = self.deps.executive.reset_kind();
        if registration.already_existed && reset == ResetKind::Processor {
            self.restore_from_cds(registration.handle);
        } else {
            debug!(?reset, existed = registration.already_existed, "Resource states left at power-on defaults");
        }
        !registration.already_existed
    }

    fn restore_from_cds(&mut self, handle: CdsHandle) {
        let mut buf = [0u8; CdsSnapshot::SIZE];
        let restored = self
            .deps
            .cds
            .restore(handle, &mut buf)
            .map_err(CdsError::Restore)
            .and_then(|()| CdsSnapshot::from_bytes(&buf))
            .and_then(|snapshot| ResourceStates::from_snapshot(&snapshot));

        match restored {
            Ok(states) => {
                info!("Resource states restored from critical data store");
                self.state.resource_states = states;
            }
            Err(err) => self.cds_failure(err),
        }
    }

    /// Write the current resource states. No-op without a store.
    pub(crate) fn save_to_cds(&mut self) {
        let Some(handle) = self.state.cds_handle else {
            return;
        };
        let snapshot = self.state.resource_states.snapshot();
        if let Err(code) = self.deps.cds.save(handle, snapshot.as_bytes()) {
            error!(error = %CdsError::Save(code), "Critical data store save failed");
            self.emit(CsEvent::error(
                EventId::CdsError,
                format!(
                    "Critical Data Store access error = 0x{:08X}",
                    status_bits(code)
                ),
            ));
            self.state.cds_handle = None;
        }
    }

    /// Fall back to the power-on states and stop using the store.
    fn cds_failure(&mut self, err: CdsError) {
        error!(error = %err, "Critical data store unusable");
        self.state.resource_states = self.config.power_on_states;
        self.state.cds_handle = None;
        self.emit(CsEvent::error(
            EventId::CdsError,
            format!(
                "Critical Data Store access error = 0x{:08X}",
                status_bits(err.code())
            ),
        ));
    }
}
