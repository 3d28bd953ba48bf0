//! Per-resource enable states, error counters and the persisted snapshot.
//!
//! The snapshot is a flat sequence of one state byte per resource in
//! persisted order (Eeprom, Memory, Apps, Tables, OS, cFE Core). It carries
//! no version field; a layout change requires a power-on reset.

use super::types::{ResourceState, ResourceType};
use crate::error::CdsError;
use serde::{Deserialize, Serialize};

/// Enable state of each resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStates {
    states: [ResourceState; 6],
}

impl Default for ResourceStates {
    fn default() -> Self {
        Self {
            states: [ResourceState::Enabled; 6],
        }
    }
}

impl ResourceStates {
    pub fn get(&self, resource: ResourceType) -> ResourceState {
        self.states[resource.persisted_index()]
    }

    pub fn set(&mut self, resource: ResourceType, state: ResourceState) {
        self.states[resource.persisted_index()] = state;
    }

    pub fn with(mut self, resource: ResourceType, state: ResourceState) -> Self {
        self.set(resource, state);
        self
    }

    pub fn snapshot(&self) -> CdsSnapshot {
        CdsSnapshot(self.states.map(ResourceState::raw))
    }

    /// States decoded from a snapshot.
    pub fn from_snapshot(snapshot: &CdsSnapshot) -> Result<Self, CdsError> {
        let mut states = [ResourceState::Enabled; 6];
        for (position, byte) in snapshot.0.iter().enumerate() {
            states[position] = ResourceState::from_raw(*byte).ok_or(CdsError::Corrupt {
                position,
                byte: *byte,
            })?;
        }
        Ok(Self { states })
    }
}

/// Raw persisted bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CdsSnapshot(pub [u8; CdsSnapshot::SIZE]);

impl CdsSnapshot {
    pub const SIZE: usize = 6;

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CdsError> {
        let array: [u8; Self::SIZE] = bytes.try_into().map_err(|_| CdsError::Truncated {
            actual: bytes.len(),
            expected: Self::SIZE,
        })?;
        Ok(Self(array))
    }
}

/// Miscompare counters per resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCounters {
    counts: [u32; 6],
}

impl ErrorCounters {
    pub fn get(&self, resource: ResourceType) -> u32 {
        self.counts[resource.persisted_index()]
    }

    pub fn increment(&mut self, resource: ResourceType) {
        let count = &mut self.counts[resource.persisted_index()];
        *count = count.wrapping_add(1);
    }

    pub fn reset(&mut self) {
        self.counts = [0; 6];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_layout_follows_persisted_order() {
        let states = ResourceStates::default()
            .with(ResourceType::Memory, ResourceState::Disabled)
            .with(ResourceType::CfeCore, ResourceState::Disabled);

        assert_eq!(states.snapshot().as_bytes(), &[1, 2, 1, 1, 1, 2]);
    }

    #[test]
    fn test_from_snapshot_rejects_unknown_byte() {
        let snapshot = CdsSnapshot([1, 1, 0, 1, 1, 1]);
        assert_eq!(
            ResourceStates::from_snapshot(&snapshot),
            Err(CdsError::Corrupt {
                position: 2,
                byte: 0
            })
        );
    }

    #[test]
    fn test_from_bytes_length() {
        assert!(CdsSnapshot::from_bytes(&[1; 6]).is_ok());
        assert_eq!(
            CdsSnapshot::from_bytes(&[1; 4]),
            Err(CdsError::Truncated {
                actual: 4,
                expected: 6
            })
        );
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_states() {
        let states = ResourceStates::default().with(ResourceType::Tables, ResourceState::Disabled);
        let restored = ResourceStates::from_snapshot(&states.snapshot()).unwrap();
        assert_eq!(restored, states);
    }

    #[test]
    fn test_error_counters() {
        let mut counters = ErrorCounters::default();
        counters.increment(ResourceType::Os);
        counters.increment(ResourceType::Os);
        assert_eq!(counters.get(ResourceType::Os), 2);
        assert_eq!(counters.get(ResourceType::Apps), 0);
        counters.reset();
        assert_eq!(counters.get(ResourceType::Os), 0);
    }
}
