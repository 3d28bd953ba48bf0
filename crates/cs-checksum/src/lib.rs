//! # Checksum Engine (cs-checksum)
//!
//! Table-driven background integrity monitoring. The engine keeps a
//! checksum baseline for every monitored memory region and re-verifies it
//! a bounded number of bytes at a time, so a single wakeup never starves
//! command processing.
//!
//! ## Architecture
//!
//! ```text
//! Table service ──definition table──→ Validator ──→ Compiler ──→ Results tables
//!                                                                    │
//!   Wakeup ──BackgroundCycle──→ Scheduler (budgeted) ←───────────────┤
//!                                   │                                │
//!                                   └──miscompare──→ Events          │
//!                                                                    │
//!   Command ──→ ChecksumHandler ──→ ChecksumService ──recompute──→ Child task
//!                                        │      ↑                    │
//!                                        │      └────completion──────┘
//!                                        ↓
//!                              Resource states ──→ CDS
//! ```
//!
//! ## Resources
//!
//! | Resource | Entries | Addressed by |
//! |----------|---------|--------------|
//! | cFE core | 1 | fixed code segment |
//! | OS | 1 | kernel code segment, if the platform reports one |
//! | Eeprom | table | entry id |
//! | Memory | table | entry id |
//! | Tables | table | qualified table name |
//! | Apps | table | application name |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant |
//! |----|-----------|
//! | 1 | An entry's byte offset never passes its length |
//! | 2 | Empty entries are never scheduled |
//! | 3 | Named entries are unique within their table |
//! | 4 | At most one recompute or one-shot runs at a time |
//! | 5 | Child tasks never touch engine state; completions apply on the main task |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure domain logic (entries, validator, compiler, compute step)
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `state.rs` - The engine's owned state
//! - `service/` - Application service implementing the API
//! - `ipc/` - Command decoding and the message dispatcher
//! - `adapters/` - Concrete outbound port implementations
//! - `runtime.rs` - The main cooperative task loop
//!
//! ## Usage
//!
//! ```ignore
//! use cs_checksum::{run, ChecksumHandler, ChecksumService, InboundMessage};
//!
//! let mut service = ChecksumService::new(deps, ChecksumConfig::default())?;
//! service.initialize();
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(32);
//! tokio::spawn(run(ChecksumHandler::new(service), rx));
//! tx.send(InboundMessage::BackgroundCycle).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ipc;
pub mod metrics;
pub mod ports;
pub mod runtime;
pub mod service;
pub mod state;

// Re-export key types for convenience
pub use domain::{
    ChecksumConfig, CsEvent, DefinitionEntry, DefinitionFiles, EntryRef, EntryState, EventId,
    HousekeepingPacket, MemoryWindow, ResetKind, ResourceState, ResourceType, ResultEntry,
    Severity, TableCapacities, TableResource,
};
pub use error::{CsError, CsResult};
pub use metrics::{Metrics, MetricsSnapshot};
pub use ports::inbound::ChecksumApi;
pub use ports::outbound::{
    ChecksumProvider, CriticalDataStore, EventSink, ExecutiveServices, HousekeepingPublisher,
    MemoryReader, RangeValidator, TableService, TaskSpawner,
};
pub use service::{ChecksumDependencies, ChecksumService, VERSION};
pub use state::CoreState;

// Re-export IPC and runtime
pub use ipc::{codes, ChecksumHandler, Command, CommandArgs, InboundMessage, Reply};
pub use runtime::run;
