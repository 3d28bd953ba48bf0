//! Housekeeping requests.

use super::ChecksumService;
use crate::domain::HousekeepingPacket;
use tracing::trace;

impl ChecksumService {
    /// Publish the status packet, then look for definition table reloads.
    pub(crate) fn publish_housekeeping(&mut self) -> HousekeepingPacket {
        let packet = self.state.housekeeping();
        trace!(pass = packet.pass_counter, "Publishing housekeeping");
        self.deps.housekeeping.publish(&packet);
        self.handle_table_updates();
        packet
    }
}
