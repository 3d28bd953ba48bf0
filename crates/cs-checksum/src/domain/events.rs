//! Operator events.
//!
//! Every externally visible condition is reported as a [`CsEvent`] with a
//! stable numeric id, a severity and a formatted message.

use super::types::ResourceType;
use serde::Serialize;
use std::fmt;

/// Event severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Debug,
    Info,
    Error,
}

/// Stable event identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum EventId {
    Init = 1,
    Noop = 2,
    Reset = 3,
    DisableAll = 4,
    EnableAll = 5,
    DisableResource = 6,
    EnableResource = 7,
    Baseline = 8,
    NoBaseline = 9,
    BaselineInvalid = 10,
    RecomputeStarted = 11,
    RecomputeSpawnFailed = 12,
    RecomputeBusy = 13,
    RecomputeInvalid = 14,
    RecomputeFinished = 15,
    RecomputeFailed = 16,
    OneShotStarted = 17,
    OneShotSpawnFailed = 18,
    OneShotBusy = 19,
    OneShotRangeInvalid = 20,
    OneShotCancelled = 21,
    OneShotCancelFailed = 22,
    OneShotCancelNoTask = 23,
    OneShotFinished = 24,
    Miscompare = 25,
    InvalidMessageId = 26,
    InvalidCommandCode = 27,
    InvalidLength = 28,
    EnableEntry = 29,
    EnableEntryInvalid = 30,
    DisableEntry = 31,
    DisableEntryInvalid = 32,
    DefinitionEntryMissing = 33,
    GetEntryId = 34,
    GetEntryIdNotFound = 35,
    ComputeNotFound = 36,
    ComputeTablesError = 37,
    ComputeTablesRelease = 38,
    ComputeAppError = 39,
    ComputeAppPlatform = 40,
    ComputeReadError = 41,
    ValidateState = 42,
    ValidateRange = 43,
    ValidateEmptyName = 44,
    ValidateDuplicate = 45,
    ValidateSummary = 46,
    NoValidEntries = 47,
    TableInit = 48,
    TableUpdate = 49,
    CdsError = 50,
    OsTextSegment = 51,
    Exit = 52,
}

impl EventId {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One operator event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CsEvent {
    pub id: EventId,
    pub severity: Severity,
    pub resource: Option<ResourceType>,
    pub message: String,
}

impl CsEvent {
    pub fn new(id: EventId, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id,
            severity,
            resource: None,
            message: message.into(),
        }
    }

    pub fn info(id: EventId, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Info, message)
    }

    pub fn debug(id: EventId, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Debug, message)
    }

    pub fn error(id: EventId, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Error, message)
    }

    /// Attach the resource the event concerns.
    pub fn for_resource(mut self, resource: ResourceType) -> Self {
        self.resource = Some(resource);
        self
    }
}
