//! Housekeeping publishers.

use crate::domain::HousekeepingPacket;
use crate::ports::outbound::HousekeepingPublisher;
use parking_lot::Mutex;
use tracing::{info, warn};

/// Logs each packet as one JSON line through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHousekeepingPublisher;

impl JsonHousekeepingPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl HousekeepingPublisher for JsonHousekeepingPublisher {
    fn publish(&self, packet: &HousekeepingPacket) {
        match serde_json::to_string(packet) {
            Ok(json) => info!(target: "cs::housekeeping", packet = %json, "Housekeeping"),
            Err(err) => warn!(error = %err, "Housekeeping packet not serialized"),
        }
    }
}

/// Keeps every published packet.
#[derive(Debug, Default)]
pub struct RecordingHousekeepingPublisher {
    packets: Mutex<Vec<HousekeepingPacket>>,
}

impl RecordingHousekeepingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> Vec<HousekeepingPacket> {
        self.packets.lock().clone()
    }

    pub fn last(&self) -> Option<HousekeepingPacket> {
        self.packets.lock().last().cloned()
    }
}

impl HousekeepingPublisher for RecordingHousekeepingPublisher {
    fn publish(&self, packet: &HousekeepingPacket) {
        self.packets.lock().push(packet.clone());
    }
}
