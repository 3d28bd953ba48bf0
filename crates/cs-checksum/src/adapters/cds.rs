use crate::domain::CdsHandle;
use crate::ports::outbound::{CdsRegistration, CriticalDataStore};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Status returned for an unknown CDS handle.
pub const CDS_INVALID_HANDLE: i32 = -3;

#[derive(Debug, Default)]
struct Inner {
    blocks: HashMap<String, Vec<u8>>,
    handles: HashMap<u32, String>,
    register_failure: Option<i32>,
    restore_failure: Option<i32>,
    save_failure: Option<i32>,
    restores: usize,
    saves: usize,
}

/// Critical data store held in memory.
///
/// Blocks outlive handles, so a store built with
/// [`InMemoryCds::with_block`] behaves as one that survived a reset.
#[derive(Debug, Default)]
pub struct InMemoryCds {
    inner: Mutex<Inner>,
}

impl InMemoryCds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a block from before this boot.
    pub fn with_block(name: &str, data: Vec<u8>) -> Self {
        let store = Self::new();
        store.inner.lock().blocks.insert(name.to_string(), data);
        store
    }

    pub fn fail_register(&self, code: i32) {
        self.inner.lock().register_failure = Some(code);
    }

    pub fn fail_restore(&self, code: i32) {
        self.inner.lock().restore_failure = Some(code);
    }

    pub fn fail_save(&self, code: i32) {
        self.inner.lock().save_failure = Some(code);
    }

    /// Current contents of a block.
    pub fn block(&self, name: &str) -> Option<Vec<u8>> {
        self.inner.lock().blocks.get(name).cloned()
    }

    /// Number of restore calls made so far.
    pub fn restore_count(&self) -> usize {
        self.inner.lock().restores
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }
}

impl CriticalDataStore for InMemoryCds {
    fn register(&self, name: &str, size: usize) -> Result<CdsRegistration, i32> {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.register_failure {
            return Err(code);
        }

        let already_existed = match inner.blocks.get(name) {
            Some(block) if block.len() == size => true,
            _ => {
                inner.blocks.insert(name.to_string(), vec![0; size]);
                false
            }
        };
        let id = inner.handles.len() as u32 + 1;
        inner.handles.insert(id, name.to_string());
        Ok(CdsRegistration {
            handle: CdsHandle(id),
            already_existed,
        })
    }

    fn restore(&self, handle: CdsHandle, buf: &mut [u8]) -> Result<(), i32> {
        let mut inner = self.inner.lock();
        inner.restores += 1;
        if let Some(code) = inner.restore_failure {
            return Err(code);
        }
        let name = inner.handles.get(&handle.0).ok_or(CDS_INVALID_HANDLE)?;
        let block = inner.blocks.get(name).ok_or(CDS_INVALID_HANDLE)?;
        if block.len() != buf.len() {
            return Err(CDS_INVALID_HANDLE);
        }
        buf.copy_from_slice(block);
        Ok(())
    }

    fn save(&self, handle: CdsHandle, data: &[u8]) -> Result<(), i32> {
        let mut inner = self.inner.lock();
        inner.saves += 1;
        if let Some(code) = inner.save_failure {
            return Err(code);
        }
        let name = inner
            .handles
            .get(&handle.0)
            .cloned()
            .ok_or(CDS_INVALID_HANDLE)?;
        inner.blocks.insert(name, data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block_is_not_preexisting() {
        let cds = InMemoryCds::new();
        let reg = cds.register("CS_CDS", 6).unwrap();
        assert!(!reg.already_existed);

        cds.save(reg.handle, &[1, 1, 2, 2, 1, 1]).unwrap();
        let mut buf = [0u8; 6];
        cds.restore(reg.handle, &mut buf).unwrap();
        assert_eq!(buf, [1, 1, 2, 2, 1, 1]);
        assert_eq!(cds.save_count(), 1);
        assert_eq!(cds.restore_count(), 1);
    }

    #[test]
    fn test_surviving_block_is_reported() {
        let cds = InMemoryCds::with_block("CS_CDS", vec![2; 6]);
        let reg = cds.register("CS_CDS", 6).unwrap();
        assert!(reg.already_existed);
        assert_eq!(cds.block("CS_CDS"), Some(vec![2; 6]));
    }

    #[test]
    fn test_injected_failures() {
        let cds = InMemoryCds::new();
        let reg = cds.register("CS_CDS", 6).unwrap();
        cds.fail_save(-5);
        cds.fail_restore(-6);
        assert_eq!(cds.save(reg.handle, &[0; 6]), Err(-5));
        assert_eq!(cds.restore(reg.handle, &mut [0; 6]), Err(-6));

        cds.fail_register(-1);
        assert_eq!(cds.register("CS_CDS", 6).map(|r| r.handle), Err(-1));
    }
}
