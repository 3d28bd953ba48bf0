//! Simulated platform shared by the integration flows.

use std::sync::Arc;

use cs_checksum::adapters::{
    Crc32ChecksumProvider, InMemoryCds, InMemoryTableService, InlineTaskSpawner,
    RecordingEventSink, RecordingHousekeepingPublisher, SimulatedMemory, StaticExecutive,
};
use cs_checksum::{
    ChecksumApi, ChecksumConfig, ChecksumDependencies, ChecksumHandler, ChecksumProvider,
    ChecksumService, CommandArgs, CsResult, DefinitionEntry, DefinitionFiles, EntryState,
    InboundMessage, MemoryReader, MemoryWindow, Reply, ResetKind, TableCapacities,
    TableResource, TaskSpawner,
};
use tempfile::TempDir;

pub const MEMORY_BASE: usize = 0x2000;
pub const MEMORY_LEN: usize = 0x2000;

pub const CFE: MemoryWindow = MemoryWindow {
    base: 0x2000,
    len: 0x200,
};
pub const KERNEL: MemoryWindow = MemoryWindow {
    base: 0x2200,
    len: 0x200,
};
pub const EEPROM_A: MemoryWindow = MemoryWindow {
    base: 0x2400,
    len: 0x100,
};
pub const EEPROM_B: MemoryWindow = MemoryWindow {
    base: 0x2500,
    len: 0x100,
};
pub const RAM: MemoryWindow = MemoryWindow {
    base: 0x2800,
    len: 0x200,
};
pub const APP_HS: MemoryWindow = MemoryWindow {
    base: 0x3800,
    len: 0x100,
};

pub const FOREIGN_TABLE: &str = "HS.AppMonTbl";
pub const BUDGET: usize = 0x80;
pub const CAPACITY: usize = 8;

/// Upper bound on wakeups for any flow to settle.
const MAX_CYCLES: usize = 1_000;

/// Collaborators that outlive a single engine instance.
pub struct Platform {
    pub memory: Arc<SimulatedMemory>,
    pub tables: Arc<InMemoryTableService>,
    pub cds: Arc<InMemoryCds>,
    pub events: Arc<RecordingEventSink>,
    pub housekeeping: Arc<RecordingHousekeepingPublisher>,
    dir: TempDir,
}

impl Platform {
    /// Platform with the default definition files written out.
    pub fn new() -> Self {
        Self::with_cds(Arc::new(InMemoryCds::new()))
    }

    /// Platform whose critical data store survives from an earlier boot.
    pub fn with_cds(cds: Arc<InMemoryCds>) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let platform = Self {
            memory: Arc::new(SimulatedMemory::patterned(MEMORY_BASE, MEMORY_LEN)),
            tables: Arc::new(InMemoryTableService::new("CS")),
            cds,
            events: Arc::new(RecordingEventSink::new()),
            housekeeping: Arc::new(RecordingHousekeepingPublisher::new()),
            dir,
        };
        platform.tables.add_foreign_table(FOREIGN_TABLE, vec![0x5A; 0x40]);

        platform.write_definition(
            TableResource::Eeprom,
            &[
                DefinitionEntry::range(EntryState::Enabled, EEPROM_A.base, EEPROM_A.len),
                DefinitionEntry::range(EntryState::Enabled, EEPROM_B.base, EEPROM_B.len),
            ],
        );
        platform.write_definition(
            TableResource::Memory,
            &[DefinitionEntry::range(EntryState::Enabled, RAM.base, RAM.len)],
        );
        platform.write_definition(
            TableResource::Tables,
            &[
                DefinitionEntry::named(EntryState::Enabled, FOREIGN_TABLE),
                DefinitionEntry::named(EntryState::Enabled, "CS.DefMemoryTbl"),
            ],
        );
        platform.write_definition(
            TableResource::Apps,
            &[DefinitionEntry::named(EntryState::Enabled, "HS")],
        );
        platform
    }

    pub fn files(&self) -> DefinitionFiles {
        DefinitionFiles::in_dir(self.dir.path())
    }

    /// Replace the file a definition table is loaded from at boot.
    pub fn write_definition(&self, table: TableResource, entries: &[DefinitionEntry]) {
        let json = serde_json::to_string(entries).expect("definition json");
        std::fs::write(self.files().get(table), json).expect("definition file");
    }

    /// Boot an engine with child tasks run inline.
    pub fn boot(&self, reset: ResetKind) -> ChecksumHandler {
        self.boot_with(reset, Arc::new(InlineTaskSpawner::new()))
    }

    pub fn boot_with(&self, reset: ResetKind, spawner: Arc<dyn TaskSpawner>) -> ChecksumHandler {
        let executive = StaticExecutive::new(reset, CFE)
            .with_kernel_segment(KERNEL)
            .with_app("HS", APP_HS);
        let deps = ChecksumDependencies {
            checksum: Arc::new(Crc32ChecksumProvider::new()),
            memory: Arc::clone(&self.memory) as _,
            ranges: Arc::clone(&self.memory) as _,
            tables: Arc::clone(&self.tables) as _,
            executive: Arc::new(executive),
            spawner,
            cds: Arc::clone(&self.cds) as _,
            events: Arc::clone(&self.events) as _,
            housekeeping: Arc::clone(&self.housekeeping) as _,
        };
        let config = ChecksumConfig::default()
            .with_max_bytes_per_cycle(BUDGET)
            .with_capacities(TableCapacities {
                eeprom: CAPACITY,
                memory: CAPACITY,
                tables: CAPACITY,
                apps: CAPACITY,
            })
            .with_definition_files(self.files());

        let mut service = ChecksumService::new(deps, config).expect("valid config");
        service.initialize();
        ChecksumHandler::new(service)
    }

    pub fn crc_of(&self, window: MemoryWindow) -> u32 {
        let mut buf = vec![0u8; window.len];
        self.memory
            .read(window.base, &mut buf)
            .expect("window inside simulated memory");
        Crc32ChecksumProvider::new().checksum(&buf)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new()
    }
}

/// Send one command through the dispatcher.
pub fn command(handler: &mut ChecksumHandler, code: u16, args: CommandArgs) -> CsResult<Reply> {
    handler.handle(InboundMessage::Command { code, args })
}

/// Wake the engine until the scheduler has wrapped around once.
pub fn run_pass(handler: &mut ChecksumHandler) {
    let start = handler.service().state().cursor.pass_counter;
    for _ in 0..MAX_CYCLES {
        handler
            .handle(InboundMessage::BackgroundCycle)
            .expect("background cycle");
        if handler.service().state().cursor.pass_counter != start {
            return;
        }
    }
    panic!("background pass did not complete");
}

pub fn counters(handler: &ChecksumHandler) -> (u8, u8) {
    let state = handler.service().state();
    (state.command_counter, state.command_error_counter)
}

/// Whether the engine reports `resource` as enabled.
pub fn enabled(handler: &ChecksumHandler, resource: cs_checksum::ResourceType) -> bool {
    handler.service().resource_state(resource).is_enabled()
}

/// Apply every child-task completion already reported.
pub fn settle(handler: &mut ChecksumHandler) -> usize {
    handler.service_mut().poll_completions()
}
