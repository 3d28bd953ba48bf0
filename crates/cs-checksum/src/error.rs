//! Error types for the checksum engine

use crate::domain::{ResourceType, TableHandle};
use thiserror::Error;

/// Platform status code as reported in events: the two's-complement bit
/// pattern of the signed code, so `-1` reads as `0xFFFFFFFF`.
pub fn status_bits(code: i32) -> u32 {
    code as u32
}

/// Checksum engine errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsError {
    /// The single child-task slot is already taken by a recompute or one-shot
    #[error("Child task already in use by a recompute or one-shot")]
    AlreadyInProgress,

    /// No non-empty entry matches the requested id or name
    #[error("{what} not found")]
    NotFound { what: String },

    /// Entry exists but no baseline has been captured yet
    #[error("Baseline for {what} has not been computed yet")]
    NotYetComputed { what: String },

    /// Platform refused to create the child task
    #[error("Child task creation failed: 0x{code:08X}")]
    SpawnFailed { code: u32 },

    /// Entry id out of range or referring to an empty slot
    #[error("Invalid entry {entry} in {resource} table, state {state}")]
    InvalidEntry {
        resource: ResourceType,
        entry: usize,
        state: u16,
    },

    /// Address range rejected by the platform range validator
    #[error("Invalid memory range 0x{address:08X} + {len}, status 0x{code:08X}")]
    InvalidRange { address: usize, len: usize, code: u32 },

    /// Cancel requested while no one-shot is running
    #[error("No one-shot checksum is active")]
    NoOneShotActive,

    /// Platform refused to delete the one-shot task
    #[error("Failed to delete one-shot child task: 0x{code:08X}")]
    CancelFailed { code: u32 },

    /// Command code outside the known set
    #[error("Invalid command code {code}")]
    InvalidCommandCode { code: u16 },

    /// Message identifier not handled by this engine
    #[error("Invalid message id 0x{id:04X}")]
    InvalidMessageId { id: u16 },

    /// Command arguments do not match the shape the command code expects
    #[error("Invalid command length: code {code}, got {actual}, expected {expected}")]
    InvalidLength {
        code: u16,
        actual: &'static str,
        expected: &'static str,
    },

    /// Operation not defined for this resource type
    #[error("{operation} is not supported for {resource}")]
    Unsupported {
        operation: &'static str,
        resource: ResourceType,
    },

    /// Definition table failed validation
    #[error(transparent)]
    Table(#[from] TableError),

    /// Table service collaborator failure
    #[error(transparent)]
    TableService(#[from] TableServiceError),

    /// Critical data store failure
    #[error(transparent)]
    Cds(#[from] CdsError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for checksum engine operations
pub type CsResult<T> = Result<T, CsError>;

/// Summary failure of a definition table validation pass
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{resource} definition table invalid: good {good}, bad {bad}, unused {unused}")]
pub struct TableError {
    pub resource: ResourceType,
    pub good: u32,
    pub bad: u32,
    pub unused: u32,
}

/// Per-entry definition table violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationViolation {
    /// State field is not Empty, Enabled or Disabled
    IllegalState { state: u16 },
    /// Address range rejected by the platform
    IllegalRange {
        start_address: usize,
        num_bytes: usize,
        code: i32,
    },
    /// Enabled or Disabled entry with no name
    IllegalStateEmptyName { state: u16 },
    /// Name repeated by a later entry
    DuplicateName { name: String, later: usize },
}

/// Which component of a qualified `App.Table` name overflowed its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameComponent {
    App,
    Table,
}

/// Qualified table name could not be split within the platform limits
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{component:?} component of qualified name exceeds {limit} characters")]
pub struct NameTooLong {
    pub component: NameComponent,
    pub limit: usize,
}

/// Table service collaborator errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableServiceError {
    #[error("Invalid table handle {0:?}")]
    InvalidHandle(TableHandle),

    #[error("Table {name} not found")]
    NotFound { name: String },

    #[error("Table has never been loaded")]
    NeverLoaded,

    #[error("Table has been unregistered by its owner")]
    Unregistered,

    #[error("Table load failed: {reason}")]
    LoadFailed { reason: String },

    #[error("Read of {len} bytes at offset {offset} exceeds table size {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },
}

impl TableServiceError {
    /// Platform status code for event reporting
    pub fn code(&self) -> i32 {
        // cFE-style table service codes: high bit set, service id 0xCC.
        let bits: u32 = match self {
            Self::InvalidHandle(_) => 0xCC00_0001,
            Self::NotFound { .. } => 0xCC00_000F,
            Self::NeverLoaded => 0xCC00_0019,
            Self::Unregistered => 0xCC00_001C,
            Self::LoadFailed { .. } => 0xCC00_0027,
            Self::OutOfBounds { .. } => 0xCC00_0028,
        };
        bits as i32
    }
}

/// Critical data store errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CdsError {
    #[error("CDS registration failed: 0x{0:08X}")]
    Register(i32),

    #[error("CDS restore failed: 0x{0:08X}")]
    Restore(i32),

    #[error("CDS save failed: 0x{0:08X}")]
    Save(i32),

    #[error("CDS snapshot holds invalid state byte {byte} at position {position}")]
    Corrupt { position: usize, byte: u8 },

    #[error("CDS snapshot has {actual} bytes, expected {expected}")]
    Truncated { actual: usize, expected: usize },
}

impl CdsError {
    /// Platform status code for event reporting. Snapshot decoding
    /// failures have no platform code and report as `-1`.
    pub fn code(&self) -> i32 {
        match self {
            Self::Register(code) | Self::Restore(code) | Self::Save(code) => *code,
            Self::Corrupt { .. } | Self::Truncated { .. } => -1,
        }
    }
}
