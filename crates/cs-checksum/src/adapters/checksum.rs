use crate::ports::outbound::ChecksumProvider;

/// CRC-32 (IEEE) checksum provider.
///
/// The running value is the finalized CRC of everything folded so far, so
/// resuming from it gives the same result as one pass over the whole range.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32ChecksumProvider;

impl Crc32ChecksumProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ChecksumProvider for Crc32ChecksumProvider {
    fn calculate(&self, data: &[u8], seed: u32) -> u32 {
        let mut hasher = crc32fast::Hasher::new_with_initial(seed);
        hasher.update(data);
        hasher.finalize()
    }
}
