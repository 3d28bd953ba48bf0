//! Domain module for the checksum engine
//!
//! ## Core Modules
//! - types: resource kinds, entry states, handles, memory windows
//! - entry: definition and results table entries
//! - validator: definition table validation
//! - compiler: definition-to-results compilation and table ownership
//! - compute: the incremental checksum step
//! - scheduler: background cursor
//!
//! ## Supporting Modules
//! - child_task: single-flight recompute/one-shot lease
//! - resource_state: enable states, error counters, persisted snapshot
//! - events, housekeeping, config, name

pub mod child_task;
pub mod compiler;
pub mod compute;
pub mod config;
pub mod entry;
pub mod events;
pub mod housekeeping;
pub mod name;
pub mod resource_state;
pub mod scheduler;
pub mod types;
pub mod validator;

// Core exports
pub use entry::{DefinitionEntry, ResultEntry, ResultsTable};
pub use types::{
    CdsHandle, EntryRef, EntryState, MemoryWindow, ResetKind, ResourceState, ResourceType,
    TableHandle, TableResource, TaskId,
};
pub use validator::{validate, ValidationReport, Violation};
pub use compiler::{
    compile, default_definition, resolve_owner, CompileReport, OwnTables, Ownership,
    ResolvedOwner, WellKnownSlots,
};
pub use compute::{
    apply_chunk, fold_chunk, step, ByteSource, Chunk, MemorySource, SourceError, StepOutcome,
    TableBytes,
};
pub use scheduler::ScheduleCursor;

// Supporting exports
pub use child_task::{
    ChildActivity, ChildCompletion, ChildOutcome, ChildPhase, ChildTaskSlot, HeldDefinition,
    OneShotTicket, RecomputeTicket,
};
pub use config::{ChecksumConfig, DefinitionFiles, TableCapacities};
pub use events::{CsEvent, EventId, Severity};
pub use housekeeping::HousekeepingPacket;
pub use name::{parse_qualified_name, AppName, NameLimits, TableName};
pub use resource_state::{CdsSnapshot, ErrorCounters, ResourceStates};
