//! Single child-task slot shared by recompute and one-shot requests.
//!
//! ```text
//!            begin_*()            mark_running()          complete()
//!   Idle ──────────────→ Requested ─────────────→ Running ─────────→ Idle
//!                            │                       │
//!                            └── abandon() ──→ Idle  └── cancel ──→ Idle
//! ```
//!
//! Every request takes a fresh generation number. A completion is applied
//! only while the slot still holds the ticket of the same generation, so a
//! result from a cancelled task that arrives after a new request started is
//! recognized as stale and dropped.

use super::entry::ResultEntry;
use super::types::{EntryRef, MemoryWindow, ResourceState, TaskId};
use crate::error::{CsError, CsResult};

/// Definition-table entry disabled for the duration of a recompute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeldDefinition {
    pub index: usize,
    /// Raw state to write back on completion
    pub previous_state: u16,
}

/// Lease on one results entry for an on-demand recompute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecomputeTicket {
    pub generation: u64,
    pub target: EntryRef,
    /// Index in the results table; zero for the code-segment entries
    pub index: usize,
    /// Results-entry state to restore on completion
    pub previous_state: ResourceState,
    pub definition: Option<HeldDefinition>,
    pub task: Option<TaskId>,
}

/// Lease for an ad-hoc one-shot checksum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OneShotTicket {
    pub generation: u64,
    pub window: MemoryWindow,
    pub task: Option<TaskId>,
}

/// What the child-task slot is currently used for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ChildActivity {
    #[default]
    Idle,
    Recompute(RecomputeTicket),
    OneShot(OneShotTicket),
}

/// Lifecycle phase derived from the slot contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildPhase {
    Idle,
    /// Lease taken, task not yet spawned
    Requested,
    Running,
}

/// Result a child task sends back to the main task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChildOutcome {
    /// The entry was driven to completion; it carries the new baseline
    Recomputed { entry: ResultEntry },
    /// The entry's target could not be read
    RecomputeFailed { entry: ResultEntry },
    OneShot { checksum: u32 },
    /// The one-shot range became unreadable mid-run
    OneShotFailed { reason: String },
}

/// Message from a child task, tagged with its lease generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildCompletion {
    pub generation: u64,
    pub outcome: ChildOutcome,
}

/// Owner of the single child-task lease.
#[derive(Debug, Default)]
pub struct ChildTaskSlot {
    activity: ChildActivity,
    next_generation: u64,
}

impl ChildTaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(&self) -> &ChildActivity {
        &self.activity
    }

    pub fn is_idle(&self) -> bool {
        self.activity == ChildActivity::Idle
    }

    pub fn recompute_in_progress(&self) -> bool {
        matches!(self.activity, ChildActivity::Recompute(_))
    }

    pub fn one_shot_in_progress(&self) -> bool {
        matches!(self.activity, ChildActivity::OneShot(_))
    }

    pub fn recompute(&self) -> Option<&RecomputeTicket> {
        match &self.activity {
            ChildActivity::Recompute(ticket) => Some(ticket),
            _ => None,
        }
    }

    pub fn phase(&self) -> ChildPhase {
        let task = match &self.activity {
            ChildActivity::Idle => return ChildPhase::Idle,
            ChildActivity::Recompute(ticket) => ticket.task,
            ChildActivity::OneShot(ticket) => ticket.task,
        };
        match task {
            Some(_) => ChildPhase::Running,
            None => ChildPhase::Requested,
        }
    }

    fn take_generation(&mut self) -> CsResult<u64> {
        if !self.is_idle() {
            return Err(CsError::AlreadyInProgress);
        }
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        Ok(generation)
    }

    /// Lease the slot for a recompute and return its generation.
    pub fn begin_recompute(
        &mut self,
        target: EntryRef,
        index: usize,
        previous_state: ResourceState,
        definition: Option<HeldDefinition>,
    ) -> CsResult<u64> {
        let generation = self.take_generation()?;
        self.activity = ChildActivity::Recompute(RecomputeTicket {
            generation,
            target,
            index,
            previous_state,
            definition,
            task: None,
        });
        Ok(generation)
    }

    /// Lease the slot for a one-shot and return its generation.
    pub fn begin_one_shot(&mut self, window: MemoryWindow) -> CsResult<u64> {
        let generation = self.take_generation()?;
        self.activity = ChildActivity::OneShot(OneShotTicket {
            generation,
            window,
            task: None,
        });
        Ok(generation)
    }

    /// Record the spawned task for the current lease.
    pub fn mark_running(&mut self, generation: u64, id: TaskId) {
        match &mut self.activity {
            ChildActivity::Recompute(ticket) if ticket.generation == generation => {
                ticket.task = Some(id)
            }
            ChildActivity::OneShot(ticket) if ticket.generation == generation => {
                ticket.task = Some(id)
            }
            _ => {}
        }
    }

    /// Release the lease if it still has `generation`, returning it.
    pub fn complete(&mut self, generation: u64) -> Option<ChildActivity> {
        let current = match &self.activity {
            ChildActivity::Idle => return None,
            ChildActivity::Recompute(ticket) => ticket.generation,
            ChildActivity::OneShot(ticket) => ticket.generation,
        };
        (current == generation).then(|| std::mem::take(&mut self.activity))
    }

    /// Task of the active one-shot.
    pub fn one_shot_task(&self) -> CsResult<Option<TaskId>> {
        match &self.activity {
            ChildActivity::OneShot(ticket) => Ok(ticket.task),
            _ => Err(CsError::NoOneShotActive),
        }
    }

    /// Free the slot unconditionally.
    pub fn clear(&mut self) {
        self.activity = ChildActivity::Idle;
    }
}
