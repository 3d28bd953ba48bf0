//! # Simulated Platform
//!
//! Wires the engine to in-process adapters: a patterned memory image, a
//! fixed executive layout, an in-memory table service and CDS, and the
//! tokio blocking pool for child tasks.

use std::env;
use std::sync::Arc;

use anyhow::{bail, Result};
use cs_checksum::adapters::{
    Crc32ChecksumProvider, InMemoryCds, InMemoryTableService, JsonHousekeepingPublisher,
    SimulatedMemory, StaticExecutive, TokioTaskSpawner, TracingEventSink,
};
use cs_checksum::{ChecksumConfig, ChecksumDependencies, MemoryWindow, ResetKind};
use tokio::runtime::Handle;

/// Base of the simulated address space.
const MEMORY_BASE: usize = 0x0010_0000;
const MEMORY_LEN: usize = 0x0004_0000;

const CFE_SEGMENT: MemoryWindow = MemoryWindow {
    base: MEMORY_BASE,
    len: 0x8000,
};
const KERNEL_SEGMENT: MemoryWindow = MemoryWindow {
    base: MEMORY_BASE + 0x8000,
    len: 0x8000,
};

/// Application code segments known to the simulated executive.
const APPS: [(&str, MemoryWindow); 2] = [
    (
        "CS",
        MemoryWindow {
            base: MEMORY_BASE + 0x1_0000,
            len: 0x4000,
        },
    ),
    (
        "LC",
        MemoryWindow {
            base: MEMORY_BASE + 0x1_4000,
            len: 0x2000,
        },
    ),
];

/// Reset kind from `CS_RESET_KIND` (`power-on` or `processor`).
pub fn reset_kind_from_env() -> Result<ResetKind> {
    match env::var("CS_RESET_KIND").as_deref() {
        Err(_) | Ok("power-on") => Ok(ResetKind::PowerOn),
        Ok("processor") => Ok(ResetKind::Processor),
        Ok(other) => bail!("CS_RESET_KIND must be power-on or processor, got {other}"),
    }
}

/// Build the adapter set for `config`.
pub fn build_dependencies(
    config: &ChecksumConfig,
    reset: ResetKind,
    runtime: Handle,
) -> ChecksumDependencies {
    let memory = Arc::new(SimulatedMemory::patterned(MEMORY_BASE, MEMORY_LEN));
    let executive = APPS.iter().fold(
        StaticExecutive::new(reset, CFE_SEGMENT).with_kernel_segment(KERNEL_SEGMENT),
        |executive, (name, segment)| executive.with_app(name, *segment),
    );

    ChecksumDependencies {
        checksum: Arc::new(Crc32ChecksumProvider::new()),
        memory: memory.clone(),
        ranges: memory,
        tables: Arc::new(InMemoryTableService::new(&config.app_name)),
        executive: Arc::new(executive),
        spawner: Arc::new(TokioTaskSpawner::new(runtime)),
        cds: Arc::new(InMemoryCds::new()),
        events: Arc::new(TracingEventSink::new()),
        housekeeping: Arc::new(JsonHousekeepingPublisher::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_inside_memory() {
        let memory = MemoryWindow::new(MEMORY_BASE, MEMORY_LEN);
        assert!(memory.covers(&CFE_SEGMENT));
        assert!(memory.covers(&KERNEL_SEGMENT));
        for (_, segment) in APPS {
            assert!(memory.covers(&segment));
        }
    }
}
