//! Message dispatcher for the checksum engine.
//!
//! Turns inbound messages into [`ChecksumApi`] calls. Malformed messages
//! are reported through the event sink and counted as command errors;
//! engine state is left untouched.

use super::command::{Command, CommandArgs};
use crate::domain::{CsEvent, EventId, HousekeepingPacket};
use crate::error::{CsError, CsResult};
use crate::ports::inbound::ChecksumApi;
use crate::service::ChecksumService;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Message identifiers on the command pipe.
pub mod message_ids {
    pub const CMD: u16 = 0x189F;
    pub const SEND_HK: u16 = 0x18A0;
    pub const BACKGROUND_CYCLE: u16 = 0x18A1;
}

/// A message arriving on the command pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundMessage {
    SendHousekeeping,
    BackgroundCycle,
    Command { code: u16, args: CommandArgs },
    Unknown { message_id: u16 },
}

impl InboundMessage {
    pub fn message_id(&self) -> u16 {
        match self {
            InboundMessage::SendHousekeeping => message_ids::SEND_HK,
            InboundMessage::BackgroundCycle => message_ids::BACKGROUND_CYCLE,
            InboundMessage::Command { .. } => message_ids::CMD,
            InboundMessage::Unknown { message_id } => *message_id,
        }
    }
}

/// What a handled message produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    None,
    Housekeeping(HousekeepingPacket),
    Baseline(u32),
    EntryIds(Vec<usize>),
}

/// Checksum engine message handler
///
/// Wraps [`ChecksumService`] and owns it for the life of the main task.
pub struct ChecksumHandler {
    service: ChecksumService,
}

impl ChecksumHandler {
    pub fn new(service: ChecksumService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ChecksumService {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut ChecksumService {
        &mut self.service
    }

    pub fn into_service(self) -> ChecksumService {
        self.service
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Handle one inbound message.
    ///
    /// Errors have already been reported and counted by the time they are
    /// returned; callers may drop them.
    pub fn handle(&mut self, message: InboundMessage) -> CsResult<Reply> {
        trace!(message_id = message.message_id(), "Inbound message");
        match message {
            InboundMessage::SendHousekeeping => {
                Ok(Reply::Housekeeping(self.service.send_housekeeping()))
            }
            InboundMessage::BackgroundCycle => {
                self.service.run_cycle();
                Ok(Reply::None)
            }
            InboundMessage::Command { code, args } => match Command::decode(code, args) {
                Ok(command) => self.execute(command),
                Err(err) => self.reject_malformed(err),
            },
            InboundMessage::Unknown { message_id } => {
                self.reject_malformed(CsError::InvalidMessageId { id: message_id })
            }
        }
    }

    /// Run a decoded command against the service.
    pub fn execute(&mut self, command: Command) -> CsResult<Reply> {
        debug!(?command, "Executing command");
        let service = &mut self.service;
        match command {
            Command::Noop => service.noop().map(|()| Reply::None),
            Command::ResetCounters => service.reset_counters().map(|()| Reply::None),
            Command::OneShot {
                address,
                size,
                max_bytes_per_cycle,
            } => service
                .one_shot(address, size, max_bytes_per_cycle)
                .map(|()| Reply::None),
            Command::CancelOneShot => service.cancel_one_shot().map(|()| Reply::None),
            Command::EnableAll => service.enable_all().map(|()| Reply::None),
            Command::DisableAll => service.disable_all().map(|()| Reply::None),
            Command::EnableResource(resource) => {
                service.enable_resource(resource).map(|()| Reply::None)
            }
            Command::DisableResource(resource) => {
                service.disable_resource(resource).map(|()| Reply::None)
            }
            Command::ReportBaseline(target) => service.report_baseline(&target).map(Reply::Baseline),
            Command::Recompute(target) => service.recompute(&target).map(|()| Reply::None),
            Command::SetEntryState { target, state } => {
                service.set_entry_state(&target, state).map(|()| Reply::None)
            }
            Command::GetEntryId { resource, address } => service
                .get_entry_id(resource, address)
                .map(Reply::EntryIds),
        }
    }

    // =========================================================================
    // MALFORMED MESSAGES
    // =========================================================================

    fn reject_malformed(&mut self, err: CsError) -> CsResult<Reply> {
        let (id, message) = match &err {
            CsError::InvalidMessageId { id } => (
                EventId::InvalidMessageId,
                format!("Invalid command pipe message ID: 0x{:08X}", id),
            ),
            CsError::InvalidCommandCode { code } => (
                EventId::InvalidCommandCode,
                format!(
                    "Invalid ground command code: ID = 0x{:08X}, CC = {}",
                    message_ids::CMD,
                    code
                ),
            ),
            CsError::InvalidLength {
                code,
                actual,
                expected,
            } => (
                EventId::InvalidLength,
                format!(
                    "Invalid msg length: ID = 0x{:08X}, CC = {}, Len = {}, Expected = {}",
                    message_ids::CMD,
                    code,
                    actual,
                    expected
                ),
            ),
            other => (EventId::InvalidCommandCode, other.to_string()),
        };
        self.service.emit(CsEvent::error(id, message));
        self.service.finish(Err(err))
    }
}
