//! # IPC Module
//!
//! Command pipe handling for the checksum engine.
//!
//! ## Modules
//!
//! - `command`: command codes and typed decoding of their arguments
//! - `handler`: `ChecksumHandler`, the message dispatcher

pub mod command;
pub mod handler;

pub use command::{codes, Command, CommandArgs};
pub use handler::{message_ids, ChecksumHandler, InboundMessage, Reply};
