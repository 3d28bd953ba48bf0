//! Address-space adapters.

use crate::domain::MemoryWindow;
use crate::ports::outbound::{MemoryReadError, MemoryReader, RangeValidator};
use parking_lot::RwLock;

/// Status returned for a range outside every known region.
pub const INVALID_RANGE_STATUS: i32 = -2;

// =============================================================================
// SIMULATED MEMORY
// =============================================================================

/// Contiguous simulated address space starting at `base`.
///
/// Serves as both the memory reader and the range validator: a range is
/// valid exactly when it lies inside the simulated region.
pub struct SimulatedMemory {
    base: usize,
    bytes: RwLock<Vec<u8>>,
}

impl SimulatedMemory {
    /// Region of `len` zero bytes.
    pub fn new(base: usize, len: usize) -> Self {
        Self::with_contents(base, vec![0; len])
    }

    pub fn with_contents(base: usize, bytes: Vec<u8>) -> Self {
        Self {
            base,
            bytes: RwLock::new(bytes),
        }
    }

    /// Region filled with a deterministic byte pattern.
    pub fn patterned(base: usize, len: usize) -> Self {
        let bytes = (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 8)) as u8).collect();
        Self::with_contents(base, bytes)
    }

    pub fn window(&self) -> MemoryWindow {
        MemoryWindow::new(self.base, self.bytes.read().len())
    }

    /// Overwrite bytes at `address`. Returns false if the write would
    /// leave the region.
    pub fn write(&self, address: usize, data: &[u8]) -> bool {
        let mut bytes = self.bytes.write();
        match self.offset_of(address, data.len(), bytes.len()) {
            Some(offset) => {
                bytes[offset..offset + data.len()].copy_from_slice(data);
                true
            }
            None => false,
        }
    }

    /// Flip every bit of the byte at `address`.
    pub fn corrupt(&self, address: usize) -> bool {
        let mut bytes = self.bytes.write();
        match self.offset_of(address, 1, bytes.len()) {
            Some(offset) => {
                bytes[offset] = !bytes[offset];
                true
            }
            None => false,
        }
    }

    fn offset_of(&self, address: usize, len: usize, size: usize) -> Option<usize> {
        let offset = address.checked_sub(self.base)?;
        let end = offset.checked_add(len)?;
        (end <= size).then_some(offset)
    }
}

impl MemoryReader for SimulatedMemory {
    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), MemoryReadError> {
        let bytes = self.bytes.read();
        let offset = self
            .offset_of(address, buf.len(), bytes.len())
            .ok_or(MemoryReadError {
                address,
                len: buf.len(),
            })?;
        buf.copy_from_slice(&bytes[offset..offset + buf.len()]);
        Ok(())
    }
}

impl RangeValidator for SimulatedMemory {
    fn check_range(&self, address: usize, len: usize) -> Result<(), i32> {
        let size = self.bytes.read().len();
        match self.offset_of(address, len, size) {
            Some(_) => Ok(()),
            None => Err(INVALID_RANGE_STATUS),
        }
    }
}

// =============================================================================
// RAW MEMORY
// =============================================================================

/// Reads the process address space directly, restricted to a fixed list
/// of regions.
pub struct RawMemoryReader {
    regions: Vec<MemoryWindow>,
}

impl RawMemoryReader {
    /// # Safety
    ///
    /// Every byte of every region must stay mapped and readable for the
    /// lifetime of the reader.
    pub unsafe fn new(regions: Vec<MemoryWindow>) -> Self {
        Self { regions }
    }

    fn covered(&self, address: usize, len: usize) -> bool {
        let wanted = MemoryWindow::new(address, len);
        self.regions.iter().any(|region| region.covers(&wanted))
    }
}

impl MemoryReader for RawMemoryReader {
    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), MemoryReadError> {
        if !self.covered(address, buf.len()) {
            return Err(MemoryReadError {
                address,
                len: buf.len(),
            });
        }
        // SAFETY: the range lies inside a region the constructor's caller
        // guaranteed to be readable.
        unsafe {
            std::ptr::copy_nonoverlapping(address as *const u8, buf.as_mut_ptr(), buf.len());
        }
        Ok(())
    }
}

impl RangeValidator for RawMemoryReader {
    fn check_range(&self, address: usize, len: usize) -> Result<(), i32> {
        if self.covered(address, len) {
            Ok(())
        } else {
            Err(INVALID_RANGE_STATUS)
        }
    }
}
