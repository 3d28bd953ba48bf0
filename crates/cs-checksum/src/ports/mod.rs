//! Ports module for the checksum engine

pub mod inbound;
pub mod outbound;

pub use inbound::ChecksumApi;
pub use outbound::{
    AddressStatus, CdsRegistration, ChecksumProvider, ChildJob, CriticalDataStore, EventSink,
    ExecutiveServices, HousekeepingPublisher, MemoryReadError, MemoryReader, RangeValidator,
    TableInfo, TableService, TableSource, TaskSpawner,
};
