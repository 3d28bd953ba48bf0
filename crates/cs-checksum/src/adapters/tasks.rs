//! Child-task spawners.
//!
//! - [`TokioTaskSpawner`] runs jobs on the tokio blocking pool.
//! - [`InlineTaskSpawner`] runs a job to completion inside `spawn`.
//! - [`DeferredTaskSpawner`] holds jobs until the caller runs them, with
//!   optional spawn and delete failures.

use crate::domain::TaskId;
use crate::ports::outbound::{ChildJob, TaskSpawner};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Status returned when deleting an unknown task.
pub const TASK_INVALID_ID: i32 = -4;

// =============================================================================
// TOKIO
// =============================================================================

/// Spawns child tasks on the blocking pool of a tokio runtime.
///
/// Deleting a task aborts it if it has not started yet. A job already
/// running finishes on its own; the engine discards its result.
pub struct TokioTaskSpawner {
    runtime: Handle,
    tasks: Mutex<HashMap<u32, JoinHandle<()>>>,
    next_id: Mutex<u32>,
}

impl TokioTaskSpawner {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Spawner bound to the runtime of the calling task.
    ///
    /// Returns `None` outside a tokio runtime.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Number of tasks spawned and not yet reaped.
    pub fn live_tasks(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|_, task| !task.is_finished());
        tasks.len()
    }
}

impl TaskSpawner for TokioTaskSpawner {
    fn spawn(&self, name: &str, job: ChildJob) -> Result<TaskId, i32> {
        let id = {
            let mut next = self.next_id.lock();
            *next = next.wrapping_add(1);
            *next
        };
        let task = self.runtime.spawn_blocking(job);
        let mut tasks = self.tasks.lock();
        tasks.retain(|_, task| !task.is_finished());
        tasks.insert(id, task);
        debug!(task = name, id, "Child task spawned");
        Ok(TaskId(id))
    }

    fn delete(&self, id: TaskId) -> Result<(), i32> {
        match self.tasks.lock().remove(&id.0) {
            Some(task) => {
                task.abort();
                Ok(())
            }
            None => Err(TASK_INVALID_ID),
        }
    }
}

// =============================================================================
// INLINE
// =============================================================================

/// Runs each job synchronously before `spawn` returns.
#[derive(Debug, Default)]
pub struct InlineTaskSpawner {
    spawned: Mutex<u32>,
}

impl InlineTaskSpawner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskSpawner for InlineTaskSpawner {
    fn spawn(&self, _name: &str, job: ChildJob) -> Result<TaskId, i32> {
        let id = {
            let mut spawned = self.spawned.lock();
            *spawned += 1;
            *spawned
        };
        job();
        Ok(TaskId(id))
    }

    fn delete(&self, _id: TaskId) -> Result<(), i32> {
        Ok(())
    }
}

// =============================================================================
// DEFERRED
// =============================================================================

#[derive(Default)]
struct DeferredInner {
    queue: VecDeque<(TaskId, String, ChildJob)>,
    next_id: u32,
    spawn_failure: Option<i32>,
    delete_failure: Option<i32>,
    deleted: Vec<TaskId>,
}

/// Queues jobs so a test decides when, and whether, they run.
#[derive(Default)]
pub struct DeferredTaskSpawner {
    inner: Mutex<DeferredInner>,
}

impl DeferredTaskSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `spawn` fail with `code`.
    pub fn fail_spawn(&self, code: i32) {
        self.inner.lock().spawn_failure = Some(code);
    }

    /// Make every following `delete` fail with `code`.
    pub fn fail_delete(&self, code: i32) {
        self.inner.lock().delete_failure = Some(code);
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Names of the queued jobs, oldest first.
    pub fn pending_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .queue
            .iter()
            .map(|(_, name, _)| name.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<TaskId> {
        self.inner.lock().deleted.clone()
    }

    /// Run the oldest queued job. Returns false if none was queued.
    pub fn run_next(&self) -> bool {
        // Run outside the lock; a job may spawn again.
        let next = self.inner.lock().queue.pop_front();
        match next {
            Some((_, _, job)) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run every queued job, returning how many ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Remove a queued job without running it and hand it back, so a test
    /// can finish it after the engine has moved on.
    pub fn take(&self, id: TaskId) -> Option<ChildJob> {
        let mut inner = self.inner.lock();
        let position = inner.queue.iter().position(|(queued, _, _)| *queued == id)?;
        inner.queue.remove(position).map(|(_, _, job)| job)
    }

    /// Id of the oldest queued job.
    pub fn front(&self) -> Option<TaskId> {
        self.inner.lock().queue.front().map(|(id, _, _)| *id)
    }
}

impl TaskSpawner for DeferredTaskSpawner {
    fn spawn(&self, name: &str, job: ChildJob) -> Result<TaskId, i32> {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.spawn_failure {
            return Err(code);
        }
        inner.next_id += 1;
        let id = TaskId(inner.next_id);
        inner.queue.push_back((id, name.to_string(), job));
        Ok(id)
    }

    fn delete(&self, id: TaskId) -> Result<(), i32> {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.delete_failure {
            return Err(code);
        }
        inner.queue.retain(|(queued, _, _)| *queued != id);
        inner.deleted.push(id);
        Ok(())
    }
}
