//! Child-task requests: baseline recompute and one-shot checksums.
//!
//! Both share the single slot in [`crate::domain::ChildTaskSlot`]. The
//! main task prepares the entry, hands an owned copy to the child and
//! applies the returned outcome in [`ChecksumService::apply_completion`].

use super::ChecksumService;
use crate::domain::{
    ChildActivity, ChildCompletion, ChildOutcome, CsEvent, EntryRef, EventId, HeldDefinition,
    MemoryWindow, OneShotTicket, RecomputeTicket, ResourceState, ResourceType, ResultEntry,
    TableResource,
};
use crate::error::{status_bits, CsError, CsResult};
use crate::state::LastOneShot;
use tracing::{debug, info, warn};

const RECOMPUTE_TASK_NAME: &str = "CS_RecmpTask";
const ONE_SHOT_TASK_NAME: &str = "CS_OneShotTask";

/// "baseline of Eeprom Entry ID 3", "cFE core", "baseline of app X".
fn recompute_subject(target: &EntryRef) -> String {
    match target {
        EntryRef::CfeCore => "cFE core".to_string(),
        EntryRef::Os => "OS code segment".to_string(),
        EntryRef::Eeprom(id) | EntryRef::Memory(id) => {
            format!("baseline of {} Entry ID {}", target.resource(), id)
        }
        EntryRef::Table(name) => format!("baseline of table {}", name),
        EntryRef::App(name) => format!("baseline of app {}", name),
    }
}

/// Subject of the recompute finished and failed events.
fn completion_subject(target: &EntryRef, index: usize) -> String {
    match target {
        EntryRef::Table(name) => format!("Table {}", name),
        EntryRef::App(name) => format!("App {}", name),
        _ => format!("{} entry {}", target.resource(), index),
    }
}

impl ChecksumService {
    // =========================================================================
    // RECOMPUTE
    // =========================================================================

    pub(crate) fn request_recompute(&mut self, target: &EntryRef) -> CsResult<()> {
        let resource = target.resource();
        if !self.state.child.is_idle() {
            self.emit(
                CsEvent::error(
                    EventId::RecomputeBusy,
                    format!(
                        "Recompute {} failed: child task in use",
                        recompute_subject(target)
                    ),
                )
                .for_resource(resource),
            );
            return Err(CsError::AlreadyInProgress);
        }

        let index = match self.resolve_entry(target) {
            Ok(index) => index,
            Err(err) => {
                let message = match (target, &err) {
                    (_, CsError::InvalidEntry { entry, state, .. }) => format!(
                        "{} recompute baseline of entry failed, Entry ID invalid: {}, State: {}, Max ID: {}",
                        resource,
                        entry,
                        state,
                        self.max_entry_id(resource)
                    ),
                    (EntryRef::Table(name), _) => {
                        format!("Tables recompute baseline failed, table {} not found", name)
                    }
                    (EntryRef::App(name), _) => {
                        format!("App recompute baseline failed, app {} not found", name)
                    }
                    _ => format!("Recompute {} failed: {}", recompute_subject(target), err),
                };
                self.emit(CsEvent::error(EventId::RecomputeInvalid, message).for_resource(resource));
                return Err(err);
            }
        };

        // Take the entry out of the background scan for the duration.
        let Some(entry) = self.state.entry_mut(resource, index) else {
            return Err(CsError::NotFound {
                what: target.to_string(),
            });
        };
        let accepted = entry.clone();
        let previous_state = entry.state;
        entry.state = ResourceState::Disabled;
        entry.restart();
        let snapshot = entry.clone();

        let definition = resource
            .table()
            .and_then(|table| self.hold_definition(table, target, index));

        let generation = self.state.child.begin_recompute(
            target.clone(),
            index,
            previous_state,
            definition,
        )?;

        let context = self.compute.clone();
        let tx = self.completion_sender();
        let budget = self.config.max_bytes_per_cycle;
        let delay = self.config.child_task_delay();
        let job = Box::new(move || {
            let outcome = context.recompute(resource, snapshot, budget, delay);
            let _ = tx.send(ChildCompletion {
                generation,
                outcome,
            });
        });

        match self.deps.spawner.spawn(RECOMPUTE_TASK_NAME, job) {
            Ok(task) => {
                self.state.child.mark_running(generation, task);
                self.metrics.record_spawn();
                info!(entry = %target, generation, "Recompute started");
                self.emit(
                    CsEvent::debug(
                        EventId::RecomputeStarted,
                        format!("Recompute {} started", recompute_subject(target)),
                    )
                    .for_resource(resource),
                );
                Ok(())
            }
            Err(code) => {
                // Put the entry back as it was, baseline and progress included.
                if let Some(ChildActivity::Recompute(ticket)) = self.state.child.complete(generation)
                {
                    if let Some(entry) = self.state.entry_mut(resource, index) {
                        *entry = accepted;
                    }
                    self.release_definition(&ticket);
                }
                self.emit(
                    CsEvent::error(
                        EventId::RecomputeSpawnFailed,
                        format!(
                            "Recompute {} failed, child task creation returned: 0x{:08X}",
                            recompute_subject(target),
                            status_bits(code)
                        ),
                    )
                    .for_resource(resource),
                );
                Err(CsError::SpawnFailed {
                    code: status_bits(code),
                })
            }
        }
    }

    /// Disable the definition entry matching a recompute target and write
    /// the definition back, remembering the state to restore.
    fn hold_definition(
        &mut self,
        table: TableResource,
        target: &EntryRef,
        index: usize,
    ) -> Option<HeldDefinition> {
        let handle = self.state.own_tables.definition(table)?;
        let mut entries = self.deps.tables.definition(handle).ok()?;
        let def_index = match target {
            EntryRef::Table(name) | EntryRef::App(name) => entries
                .iter()
                .position(|def| !def.is_empty() && def.name == *name)?,
            _ => index,
        };

        let def = entries.get_mut(def_index)?;
        if def.is_empty() {
            return None;
        }
        let previous_state = def.state;
        def.state = ResourceState::Disabled.entry_state().raw();

        if let Err(err) = self.deps.tables.write_definition(handle, &entries) {
            warn!(resource = %table, error = %err, "Definition entry not held for recompute");
            return None;
        }
        self.state.reset_well_known(table);

        Some(HeldDefinition {
            index: def_index,
            previous_state,
        })
    }

    fn release_definition(&mut self, ticket: &RecomputeTicket) {
        let (Some(held), Some(table)) = (ticket.definition, ticket.target.resource().table()) else {
            return;
        };
        let Some(handle) = self.state.own_tables.definition(table) else {
            return;
        };

        let written = self.deps.tables.definition(handle).and_then(|mut entries| {
            if let Some(def) = entries.get_mut(held.index) {
                def.state = held.previous_state;
            }
            self.deps.tables.write_definition(handle, &entries)
        });
        if let Err(err) = written {
            warn!(resource = %table, error = %err, "Definition entry state not restored");
        }
        self.state.reset_well_known(table);
    }

    // =========================================================================
    // ONE-SHOT
    // =========================================================================

    pub(crate) fn request_one_shot(
        &mut self,
        address: usize,
        size: usize,
        max_bytes_per_cycle: usize,
    ) -> CsResult<()> {
        if let Err(code) = self.deps.ranges.check_range(address, size) {
            self.emit(CsEvent::error(
                EventId::OneShotRangeInvalid,
                format!(
                    "OneShot checksum failed, range validation returned: 0x{:08X}",
                    status_bits(code)
                ),
            ));
            return Err(CsError::InvalidRange {
                address,
                len: size,
                code: status_bits(code),
            });
        }

        if !self.state.child.is_idle() {
            self.emit(CsEvent::error(
                EventId::OneShotBusy,
                "OneShot checksum failed: child task in use",
            ));
            return Err(CsError::AlreadyInProgress);
        }

        let budget = if max_bytes_per_cycle == 0 {
            self.config.max_bytes_per_cycle
        } else {
            max_bytes_per_cycle
        };
        self.state.last_one_shot = LastOneShot {
            address,
            size,
            max_bytes_per_cycle: budget,
            checksum: 0,
        };

        let window = MemoryWindow::new(address, size);
        let generation = self.state.child.begin_one_shot(window)?;

        let context = self.compute.clone();
        let tx = self.completion_sender();
        let delay = self.config.child_task_delay();
        let job = Box::new(move || {
            let outcome = context.one_shot(window, budget, delay);
            let _ = tx.send(ChildCompletion {
                generation,
                outcome,
            });
        });

        match self.deps.spawner.spawn(ONE_SHOT_TASK_NAME, job) {
            Ok(task) => {
                self.state.child.mark_running(generation, task);
                self.metrics.record_spawn();
                self.emit(CsEvent::debug(
                    EventId::OneShotStarted,
                    format!(
                        "OneShot checksum started on address: 0x{:08X}, size: {}",
                        address, size
                    ),
                ));
                Ok(())
            }
            Err(code) => {
                self.state.child.clear();
                self.emit(CsEvent::error(
                    EventId::OneShotSpawnFailed,
                    format!(
                        "OneShot checksum failed, child task creation returned: 0x{:08X}",
                        status_bits(code)
                    ),
                ));
                Err(CsError::SpawnFailed {
                    code: status_bits(code),
                })
            }
        }
    }

    pub(crate) fn request_cancel_one_shot(&mut self) -> CsResult<()> {
        let task = match self.state.child.one_shot_task() {
            Ok(task) => task,
            Err(err) => {
                self.emit(CsEvent::error(
                    EventId::OneShotCancelNoTask,
                    "Cancel OneShot checksum failed. No OneShot active",
                ));
                return Err(err);
            }
        };

        if let Some(task) = task {
            if let Err(code) = self.deps.spawner.delete(task) {
                self.emit(CsEvent::error(
                    EventId::OneShotCancelFailed,
                    format!(
                        "Cancel OneShot checksum failed, child task deletion returned: 0x{:08X}",
                        status_bits(code)
                    ),
                ));
                return Err(CsError::CancelFailed {
                    code: status_bits(code),
                });
            }
        }

        // A late result from the deleted task no longer matches the slot.
        self.state.child.clear();
        self.emit(CsEvent::info(
            EventId::OneShotCancelled,
            "OneShot checksum calculation has been cancelled",
        ));
        Ok(())
    }

    // =========================================================================
    // COMPLETIONS
    // =========================================================================

    /// Apply a child-task result on the owning task.
    ///
    /// Results whose generation no longer holds the slot are dropped.
    pub fn apply_completion(&mut self, completion: ChildCompletion) {
        let Some(activity) = self.state.child.complete(completion.generation) else {
            debug!(generation = completion.generation, "Stale child completion dropped");
            self.metrics.record_stale_completion();
            return;
        };

        match (activity, completion.outcome) {
            (ChildActivity::Recompute(ticket), ChildOutcome::Recomputed { entry }) => {
                self.finish_recompute(ticket, entry, true);
            }
            (ChildActivity::Recompute(ticket), ChildOutcome::RecomputeFailed { entry }) => {
                self.finish_recompute(ticket, entry, false);
            }
            (ChildActivity::OneShot(ticket), ChildOutcome::OneShot { checksum }) => {
                self.finish_one_shot(&ticket, checksum);
            }
            (ChildActivity::OneShot(ticket), ChildOutcome::OneShotFailed { reason }) => {
                self.emit(CsEvent::error(
                    EventId::OneShotFinished,
                    format!(
                        "OneShot checksum on Address: 0x{:08X}, size {} failed: {}",
                        ticket.window.base, ticket.window.len, reason
                    ),
                ));
            }
            (activity, outcome) => {
                warn!(?activity, ?outcome, "Child outcome does not match its lease");
                self.metrics.record_stale_completion();
            }
        }
    }

    fn finish_recompute(
        &mut self,
        ticket: RecomputeTicket,
        mut entry: ResultEntry,
        succeeded: bool,
    ) {
        let resource = ticket.target.resource();
        entry.state = ticket.previous_state;
        if !succeeded {
            entry.restart();
        }
        let baseline = entry.comparison_value;
        if let Some(slot) = self.state.entry_mut(resource, ticket.index) {
            *slot = entry;
        }
        self.release_definition(&ticket);

        let subject = completion_subject(&ticket.target, ticket.index);
        if succeeded {
            match resource {
                ResourceType::CfeCore => self.state.cfe_core_baseline = baseline,
                ResourceType::Os => self.state.os_baseline = baseline,
                _ => {}
            }
            info!(entry = %ticket.target, baseline, "Recompute finished");
            self.emit(
                CsEvent::info(
                    EventId::RecomputeFinished,
                    format!(
                        "{} recompute finished. New baseline is 0x{:08X}",
                        subject, baseline
                    ),
                )
                .for_resource(resource),
            );
        } else {
            let reason = match resource {
                ResourceType::Tables | ResourceType::Apps => "Could not get address",
                _ => "Could not read memory",
            };
            self.emit(
                CsEvent::error(
                    EventId::RecomputeFailed,
                    format!("{} recompute failed. {}", subject, reason),
                )
                .for_resource(resource),
            );
        }
    }

    fn finish_one_shot(&mut self, ticket: &OneShotTicket, checksum: u32) {
        self.state.last_one_shot.checksum = checksum;
        self.emit(CsEvent::info(
            EventId::OneShotFinished,
            format!(
                "OneShot checksum on Address: 0x{:08X}, size {} completed. Checksum =  0x{:08X}",
                ticket.window.base, ticket.window.len, checksum
            ),
        ));
    }
}
