//! # Adapters Module
//!
//! Concrete implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `checksum`: CRC-32 checksum primitive (crc32fast)
//! - `memory`: raw and simulated address spaces, range validation
//! - `events`: tracing-backed and recording event sinks
//! - `tables`: in-memory table service
//! - `cds`: in-memory critical data store
//! - `tasks`: child-task spawners (tokio blocking pool, inline, deferred)
//! - `executive`: static code-segment and boot information
//! - `telemetry`: housekeeping publishers

pub mod cds;
pub mod checksum;
pub mod events;
pub mod executive;
pub mod memory;
pub mod tables;
pub mod tasks;
pub mod telemetry;

pub use cds::InMemoryCds;
pub use checksum::Crc32ChecksumProvider;
pub use events::{RecordingEventSink, TracingEventSink};
pub use executive::StaticExecutive;
pub use memory::{RawMemoryReader, SimulatedMemory};
pub use tables::{encode_definition, InMemoryTableService, DEFINITION_RECORD_SIZE};
pub use tasks::{DeferredTaskSpawner, InlineTaskSpawner, TokioTaskSpawner};
pub use telemetry::{JsonHousekeepingPublisher, RecordingHousekeepingPublisher};
