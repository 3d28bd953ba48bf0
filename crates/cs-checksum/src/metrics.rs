//! Operation counters for the checksum engine
//!
//! ## Usage
//!
//! ```ignore
//! use cs_checksum::metrics::Metrics;
//!
//! let metrics = Metrics::new();
//! metrics.record_cycle();
//! metrics.record_bytes(4096);
//! assert_eq!(metrics.snapshot().cycles_run, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe engine counters.
#[derive(Default)]
pub struct Metrics {
    /// Background cycles that found checksumming enabled
    pub cycles_run: AtomicU64,
    /// Bytes folded by the background scheduler
    pub bytes_checksummed: AtomicU64,
    /// Completed passes that disagreed with their baseline
    pub miscompares: AtomicU64,
    pub commands_accepted: AtomicU64,
    pub commands_rejected: AtomicU64,
    pub child_tasks_spawned: AtomicU64,
    /// Completions dropped because their lease was cancelled or replaced
    pub stale_completions: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, bytes: usize) {
        self.bytes_checksummed
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_miscompare(&self) {
        self.miscompares.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command(&self, accepted: bool) {
        if accepted {
            self.commands_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.commands_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_spawn(&self) {
        self.child_tasks_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_completion(&self) {
        self.stale_completions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_run: self.cycles_run.load(Ordering::Relaxed),
            bytes_checksummed: self.bytes_checksummed.load(Ordering::Relaxed),
            miscompares: self.miscompares.load(Ordering::Relaxed),
            commands_accepted: self.commands_accepted.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            child_tasks_spawned: self.child_tasks_spawned.load(Ordering::Relaxed),
            stale_completions: self.stale_completions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles_run: u64,
    pub bytes_checksummed: u64,
    pub miscompares: u64,
    pub commands_accepted: u64,
    pub commands_rejected: u64,
    pub child_tasks_spawned: u64,
    pub stale_completions: u64,
}
