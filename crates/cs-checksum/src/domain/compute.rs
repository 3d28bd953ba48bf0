//! Incremental checksum primitive.
//!
//! One call folds at most `budget` bytes of an entry's range into its
//! partial accumulator. Both the background scheduler and the child tasks
//! drive entries through [`step`], so a range checksummed over many cycles
//! and one checksummed in a single run produce the same value.
//!
//! ```text
//! Idle (offset 0) ──chunk──→ Accumulating (offset > 0) ──last chunk──→ Computed
//!       ↑                                                               │
//!       └──────────── offset and accumulator reset for the next pass ───┘
//! ```

use super::entry::ResultEntry;
use crate::ports::outbound::{ChecksumProvider, MemoryReadError, MemoryReader, TableService};
use crate::domain::types::TableHandle;
use crate::error::TableServiceError;
use thiserror::Error;

/// Failure reading the bytes behind an entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error(transparent)]
    Memory(#[from] MemoryReadError),

    #[error(transparent)]
    Table(#[from] TableServiceError),

    #[error("Range offset overflows the address space")]
    Overflow,
}

/// Where an entry's bytes come from. `offset` is relative to the start of
/// the entry's range.
pub trait ByteSource {
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<(), SourceError>;
}

/// Raw address space, through the memory reader collaborator.
pub struct MemorySource<'a> {
    reader: &'a dyn MemoryReader,
    base: usize,
}

impl<'a> MemorySource<'a> {
    pub fn new(reader: &'a dyn MemoryReader, base: usize) -> Self {
        Self { reader, base }
    }
}

impl ByteSource for MemorySource<'_> {
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<(), SourceError> {
        let address = self.base.checked_add(offset).ok_or(SourceError::Overflow)?;
        self.reader.read(address, buf)?;
        Ok(())
    }
}

/// Table contents, through the table service.
pub struct TableBytes<'a> {
    tables: &'a dyn TableService,
    handle: TableHandle,
}

impl<'a> TableBytes<'a> {
    pub fn new(tables: &'a dyn TableService, handle: TableHandle) -> Self {
        Self { tables, handle }
    }
}

impl ByteSource for TableBytes<'_> {
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<(), SourceError> {
        self.tables.read(self.handle, offset, buf)?;
        Ok(())
    }
}

/// Outcome of one compute step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Bytes remain in the range
    InProgress,
    /// The range was finished; `value` is the freshly computed checksum.
    /// `miscompare` is set when it differs from an existing baseline.
    Completed { value: u32, miscompare: bool },
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }
}

/// A folded chunk not yet applied to the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub value: u32,
    pub len: usize,
    /// This chunk reaches the end of the range
    pub last: bool,
}

/// Fold the next chunk of the entry's range without mutating the entry.
pub fn fold_chunk<S, C>(
    entry: &ResultEntry,
    source: &S,
    checksum: &C,
    budget: usize,
) -> Result<Chunk, SourceError>
where
    S: ByteSource + ?Sized,
    C: ChecksumProvider + ?Sized,
{
    let remaining = entry.remaining();
    let len = remaining.min(budget);
    let mut buf = vec![0u8; len];
    source.read_at(entry.byte_offset, &mut buf)?;

    Ok(Chunk {
        value: checksum.calculate(&buf, entry.temp_checksum_value),
        len,
        last: len == remaining,
    })
}

/// Apply a folded chunk to the entry.
///
/// On the last chunk the first completed pass captures the baseline and
/// later passes compare against it; either way the entry rewinds for the
/// next pass.
pub fn apply_chunk(entry: &mut ResultEntry, chunk: Chunk) -> StepOutcome {
    if !chunk.last {
        entry.byte_offset += chunk.len;
        entry.temp_checksum_value = chunk.value;
        return StepOutcome::InProgress;
    }

    let miscompare = if entry.computed_yet {
        chunk.value != entry.comparison_value
    } else {
        entry.computed_yet = true;
        entry.comparison_value = chunk.value;
        false
    };
    entry.zero_temp_values();

    StepOutcome::Completed {
        value: chunk.value,
        miscompare,
    }
}

/// Fold at most `budget` bytes of the entry's range.
pub fn step<S, C>(
    entry: &mut ResultEntry,
    source: &S,
    checksum: &C,
    budget: usize,
) -> Result<StepOutcome, SourceError>
where
    S: ByteSource + ?Sized,
    C: ChecksumProvider + ?Sized,
{
    let chunk = fold_chunk(entry, source, checksum, budget)?;
    Ok(apply_chunk(entry, chunk))
}
