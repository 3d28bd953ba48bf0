//! Startup sequence.

use super::{ChecksumService, VERSION};
use crate::domain::{
    CsEvent, EventId, MemoryWindow, ResourceState, ResultEntry, ScheduleCursor, TableResource,
};
use tracing::info;

impl ChecksumService {
    /// Bring the engine to its running state.
    ///
    /// 1. Power-on resource states, then the critical data store restore
    /// 2. The four definition/results table pairs; a newly created store
    ///    is seeded with the resulting states
    /// 3. The core executive and kernel code segments
    /// 4. Cursor at the first table, background checksumming enabled
    ///
    /// Failures of individual resources disable that resource and are
    /// reported; initialization itself always completes.
    pub fn initialize(&mut self) {
        self.state.resource_states = self.config.power_on_states;
        let seed_cds = self.init_cds();

        for table in TableResource::ALL {
            self.init_table(table);
        }
        if seed_cds {
            self.save_to_cds();
        }

        let cfe = self.deps.executive.cfe_text_segment();
        self.state.cfe_segment = ResultEntry::new(ResourceState::Enabled, cfe);

        self.state.os_segment = match self.deps.executive.kernel_text_segment() {
            Some(kernel) => ResultEntry::new(ResourceState::Enabled, kernel),
            None => {
                self.emit(CsEvent::info(
                    EventId::OsTextSegment,
                    "OS Text Segment disabled due to platform",
                ));
                ResultEntry::new(ResourceState::Disabled, MemoryWindow::EMPTY)
            }
        };

        self.state.cursor = ScheduleCursor::new();
        self.state.checksum_state = ResourceState::Enabled;
        self.state.child.clear();

        info!(version = VERSION, "Checksum engine initialized");
        self.emit(CsEvent::info(
            EventId::Init,
            format!("CS Initialized. Version {}", VERSION),
        ));
    }
}
