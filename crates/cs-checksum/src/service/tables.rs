//! Definition table lifecycle: startup load, validation, compilation and
//! reload handling.

use super::ChecksumService;
use crate::domain::{
    compile, default_definition, validate, CsEvent, DefinitionEntry, EventId, Ownership,
    ResourceState, TableResource, ValidationReport,
};
use crate::error::{status_bits, TableServiceError};
use crate::ports::outbound::{AddressStatus, TableSource};
use tracing::{debug, error, info, warn};

impl ChecksumService {
    /// Run the validator over a definition and report every violation
    /// followed by the summary.
    pub(crate) fn validate_definition(
        &self,
        table: TableResource,
        entries: &[DefinitionEntry],
    ) -> ValidationReport {
        let report = validate(table, entries, self.deps.ranges.as_ref());
        for violation in &report.violations {
            self.emit(violation.to_event(table));
        }
        self.emit(report.summary_event());
        report
    }

    /// Rebuild the results table of `table` from `entries`.
    pub(crate) fn compile_definition(&mut self, table: TableResource, entries: &[DefinitionEntry]) {
        let own_tables = self.state.own_tables;
        let ownership = Ownership {
            app_name: &self.config.app_name,
            limits: self.config.name_limits,
            own_tables: &own_tables,
        };
        let report = compile(table, entries, self.state.results_mut(table), &ownership);

        if let Some(well_known) = report.well_known {
            self.state.well_known = well_known;
        }
        if report.active_entries == 0 {
            self.emit(
                CsEvent::info(
                    EventId::NoValidEntries,
                    format!("CS {} Table: No valid entries in the table", table),
                )
                .for_resource(table.resource()),
            );
        }
        debug!(resource = %table, active = report.active_entries, "Definition compiled");
    }

    // =========================================================================
    // STARTUP
    // =========================================================================

    /// Register, load and compile one table pair.
    ///
    /// A missing, unloadable or invalid file falls back to the all-empty
    /// default image and disables the resource. If even the default cannot
    /// be loaded the resource is disabled and left uncompiled.
    pub(crate) fn init_table(&mut self, table: TableResource) {
        if let Err(err) = self.try_init_table(table) {
            error!(resource = %table, error = %err, "Definition table initialization failed");
            self.state
                .resource_states
                .set(table.resource(), ResourceState::Disabled);
            self.emit(
                CsEvent::error(
                    EventId::TableInit,
                    format!(
                        "CS received error 0x{:08X} initializing Definition table for {}",
                        status_bits(err.code()),
                        table
                    ),
                )
                .for_resource(table.resource()),
            );
        }
    }

    fn try_init_table(&mut self, table: TableResource) -> Result<(), TableServiceError> {
        let capacity = self.config.capacities.get(table);

        let results = self.deps.tables.register(table.results_table_name(), capacity)?;
        self.state.own_tables.set_results(table, Some(results));
        let definition = self
            .deps
            .tables
            .register(table.definition_table_name(), capacity)?;
        self.state.own_tables.set_definition(table, Some(definition));

        let path = self.config.definition_files.get(table).clone();
        let mut loaded = false;
        if path.exists() {
            match self.deps.tables.load(definition, TableSource::File(path.clone())) {
                Ok(()) => {
                    let entries = self.deps.tables.definition(definition)?;
                    loaded = self.validate_definition(table, &entries).is_valid();
                }
                Err(err) => {
                    warn!(resource = %table, path = %path.display(), error = %err, "Definition file not loaded");
                }
            }
        }

        if !loaded {
            info!(resource = %table, "Loading default definition table");
            self.deps
                .tables
                .load(definition, TableSource::Default(default_definition(capacity)))?;
            self.state
                .resource_states
                .set(table.resource(), ResourceState::Disabled);
        }

        // Acquire the address now so the load is not reported as an update
        // at the first housekeeping request.
        self.deps.tables.get_address(definition)?;
        let entries = self.deps.tables.definition(definition)?;
        self.compile_definition(table, &entries);
        Ok(())
    }

    // =========================================================================
    // RELOADS
    // =========================================================================

    /// Check every table pair for a reload, skipping a resource whose entry
    /// is being recomputed.
    pub(crate) fn handle_table_updates(&mut self) {
        for table in TableResource::ALL {
            let held = self
                .state
                .child
                .recompute()
                .map(|ticket| ticket.target.resource() == table.resource())
                .unwrap_or(false);
            if held {
                debug!(resource = %table, "Table update deferred by recompute");
                continue;
            }

            if let Err(err) = self.handle_table_update(table) {
                error!(resource = %table, error = %err, "Table update failed");
                self.emit(
                    CsEvent::error(
                        EventId::TableUpdate,
                        format!(
                            "CS had problems updating table, status 0x{:08X} for table {}",
                            status_bits(err.code()),
                            table
                        ),
                    )
                    .for_resource(table.resource()),
                );
                self.state
                    .resource_states
                    .set(table.resource(), ResourceState::Disabled);
                self.save_to_cds();
            }
        }
    }

    fn handle_table_update(&mut self, table: TableResource) -> Result<(), TableServiceError> {
        let (Some(definition), Some(results)) = (
            self.state.own_tables.definition(table),
            self.state.own_tables.results(table),
        ) else {
            return Ok(());
        };

        let _ = self.deps.tables.release_address(definition);
        let _ = self.deps.tables.release_address(results);
        self.deps.tables.manage(results)?;
        self.deps.tables.manage(definition)?;

        if self.deps.tables.get_address(definition)? == AddressStatus::Current {
            return Ok(());
        }

        let entries = self.deps.tables.definition(definition)?;
        let report = self.validate_definition(table, &entries);
        if !report.is_valid() {
            warn!(resource = %table, bad = report.bad, "Reloaded definition rejected");
            self.state
                .resource_states
                .set(table.resource(), ResourceState::Disabled);
            self.emit(
                CsEvent::error(
                    EventId::TableUpdate,
                    format!(
                        "CS {} Table update rejected: {} bad entries, checksumming disabled",
                        table, report.bad
                    ),
                )
                .for_resource(table.resource()),
            );
            self.save_to_cds();
            return Ok(());
        }

        if table == TableResource::Tables {
            self.unregister_shared_tables();
        }
        self.compile_definition(table, &entries);
        self.state.reset_well_known(table);
        info!(resource = %table, "Definition table reloaded");
        Ok(())
    }

    /// Drop every handle the Tables results hold on tables of other apps.
    fn unregister_shared_tables(&mut self) {
        let handles: Vec<_> = self
            .state
            .tables
            .iter()
            .filter(|(_, entry)| !entry.is_cs_owner)
            .filter_map(|(_, entry)| entry.table_handle)
            .collect();
        for handle in handles {
            if let Err(err) = self.deps.tables.unregister(handle) {
                debug!(?handle, error = %err, "Shared table not unregistered");
            }
        }
    }
}
