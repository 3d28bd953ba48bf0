//! # Checksum Service
//!
//! The main service implementing the checksum engine API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `ChecksumApi` for the operator command surface
//! 2. Runs the budgeted background scan on every wakeup
//! 3. Leases the single child-task slot to recompute and one-shot requests
//! 4. Uses dependency injection for all external collaborators
//!
//! The service is owned by one task. Child tasks never touch [`CoreState`];
//! they work on an owned copy of their entry and report back over the
//! completion channel, which the owning task drains with
//! [`ChecksumService::apply_completion`].

mod background;
mod cds;
mod commands;
mod compute;
mod housekeeping;
mod init;
mod recompute;
mod tables;

pub(crate) use compute::{ComputeContext, ComputeStatus};

use crate::domain::{ChecksumConfig, ChildCompletion, CsEvent};
use crate::error::CsResult;
use crate::metrics::Metrics;
use crate::ports::outbound::{
    ChecksumProvider, CriticalDataStore, EventSink, ExecutiveServices, HousekeepingPublisher,
    MemoryReader, RangeValidator, TableService, TaskSpawner,
};
use crate::state::CoreState;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Engine version reported by the no-op command and the startup event.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dependencies for ChecksumService
pub struct ChecksumDependencies {
    pub checksum: Arc<dyn ChecksumProvider>,
    pub memory: Arc<dyn MemoryReader>,
    pub ranges: Arc<dyn RangeValidator>,
    pub tables: Arc<dyn TableService>,
    pub executive: Arc<dyn ExecutiveServices>,
    pub spawner: Arc<dyn TaskSpawner>,
    pub cds: Arc<dyn CriticalDataStore>,
    pub events: Arc<dyn EventSink>,
    pub housekeeping: Arc<dyn HousekeepingPublisher>,
}

/// The Checksum Service.
pub struct ChecksumService {
    pub(crate) config: ChecksumConfig,
    pub(crate) deps: ChecksumDependencies,
    pub(crate) state: CoreState,
    /// Collaborators shared with child tasks
    pub(crate) compute: ComputeContext,
    pub(crate) metrics: Arc<Metrics>,
    completion_tx: UnboundedSender<ChildCompletion>,
    completion_rx: Option<UnboundedReceiver<ChildCompletion>>,
}

impl ChecksumService {
    /// Create a service in its pre-initialization state.
    ///
    /// Call [`ChecksumService::initialize`] before processing messages.
    pub fn new(deps: ChecksumDependencies, config: ChecksumConfig) -> CsResult<Self> {
        config.validate()?;
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let compute = ComputeContext::new(&deps);

        Ok(Self {
            state: CoreState::new(&config),
            config,
            deps,
            compute,
            metrics: Arc::new(Metrics::new()),
            completion_tx,
            completion_rx: Some(completion_rx),
        })
    }

    pub fn config(&self) -> &ChecksumConfig {
        &self.config
    }

    /// Read access to the engine state.
    pub fn state(&self) -> &CoreState {
        &self.state
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Hand the child-completion receiver to the runtime loop.
    ///
    /// Returns `None` once taken; [`ChecksumService::poll_completions`]
    /// then has nothing left to drain.
    pub fn take_completion_receiver(&mut self) -> Option<UnboundedReceiver<ChildCompletion>> {
        self.completion_rx.take()
    }

    /// Apply every completion already queued, returning how many were seen.
    pub fn poll_completions(&mut self) -> usize {
        let pending: Vec<ChildCompletion> = match self.completion_rx.as_mut() {
            Some(rx) => std::iter::from_fn(|| rx.try_recv().ok()).collect(),
            None => Vec::new(),
        };
        let count = pending.len();
        for completion in pending {
            self.apply_completion(completion);
        }
        count
    }

    pub(crate) fn completion_sender(&self) -> UnboundedSender<ChildCompletion> {
        self.completion_tx.clone()
    }

    pub(crate) fn emit(&self, event: CsEvent) {
        self.deps.events.send(event);
    }

    /// Count a command outcome and pass it through.
    pub(crate) fn finish<T>(&mut self, result: CsResult<T>) -> CsResult<T> {
        match &result {
            Ok(_) => self.state.accept_command(),
            Err(err) => {
                debug!(error = %err, "Command rejected");
                self.state.reject_command();
            }
        }
        self.metrics.record_command(result.is_ok());
        result
    }
}
