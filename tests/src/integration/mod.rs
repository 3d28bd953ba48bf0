//! # Integration Flows
//!
//! Each flow drives a fully wired engine through [`cs_checksum::ChecksumHandler`]
//! with in-memory adapters standing in for the platform.

pub mod fixtures;

mod child_tasks;
mod monitoring;
mod persistence;
mod tables;
