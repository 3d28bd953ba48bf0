//! Definition-to-results compilation.
//!
//! Rebuilds a results table from a validated definition table. Every
//! compiled entry starts with no progress and no baseline. For the Tables
//! table, entries naming one of this app's own tables are bound directly to
//! that table's handle and remembered in [`WellKnownSlots`].

use super::entry::{DefinitionEntry, ResultEntry, ResultsTable};
use super::name::{parse_qualified_name, NameLimits};
use super::types::{ResourceState, TableHandle, TableResource};

/// Indices into the Tables results table of the entries that checksum this
/// app's own definition tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WellKnownSlots {
    pub eeprom: Option<usize>,
    pub memory: Option<usize>,
    pub tables: Option<usize>,
    pub apps: Option<usize>,
}

impl WellKnownSlots {
    pub fn get(&self, resource: TableResource) -> Option<usize> {
        match resource {
            TableResource::Eeprom => self.eeprom,
            TableResource::Memory => self.memory,
            TableResource::Tables => self.tables,
            TableResource::Apps => self.apps,
        }
    }

    fn set(&mut self, resource: TableResource, index: usize) {
        let slot = match resource {
            TableResource::Eeprom => &mut self.eeprom,
            TableResource::Memory => &mut self.memory,
            TableResource::Tables => &mut self.tables,
            TableResource::Apps => &mut self.apps,
        };
        *slot = Some(index);
    }
}

/// Handles of the definition and results tables this app registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OwnTables {
    definition: [Option<TableHandle>; 4],
    results: [Option<TableHandle>; 4],
}

impl OwnTables {
    fn index(resource: TableResource) -> usize {
        match resource {
            TableResource::Eeprom => 0,
            TableResource::Memory => 1,
            TableResource::Apps => 2,
            TableResource::Tables => 3,
        }
    }

    pub fn definition(&self, resource: TableResource) -> Option<TableHandle> {
        self.definition[Self::index(resource)]
    }

    pub fn results(&self, resource: TableResource) -> Option<TableHandle> {
        self.results[Self::index(resource)]
    }

    pub fn set_definition(&mut self, resource: TableResource, handle: Option<TableHandle>) {
        self.definition[Self::index(resource)] = handle;
    }

    pub fn set_results(&mut self, resource: TableResource, handle: Option<TableHandle>) {
        self.results[Self::index(resource)] = handle;
    }

    /// Whether `handle` belongs to one of this app's tables.
    pub fn owns(&self, handle: TableHandle) -> bool {
        self.definition
            .iter()
            .chain(self.results.iter())
            .any(|h| *h == Some(handle))
    }
}

/// What ownership resolution needs to know about the running app.
#[derive(Clone, Copy, Debug)]
pub struct Ownership<'a> {
    pub app_name: &'a str,
    pub limits: NameLimits,
    pub own_tables: &'a OwnTables,
}

/// Ownership fields resolved for one Tables entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolvedOwner {
    pub handle: Option<TableHandle>,
    pub is_cs_owner: bool,
    /// Set when the entry checksums one of this app's definition tables
    pub definition_of: Option<TableResource>,
}

/// Resolve whether `name` refers to one of this app's well-known tables.
///
/// Unrecognized names, including ones whose components overflow the
/// platform limits, resolve to the default: no handle and not owned.
pub fn resolve_owner(name: &str, ownership: &Ownership<'_>) -> ResolvedOwner {
    let Ok((app, table)) = parse_qualified_name(name, &ownership.limits) else {
        return ResolvedOwner::default();
    };
    if app.as_str() != ownership.app_name {
        return ResolvedOwner::default();
    }

    for resource in TableResource::ALL {
        if table.as_str() == resource.definition_table_name() {
            return ResolvedOwner {
                handle: ownership.own_tables.definition(resource),
                is_cs_owner: true,
                definition_of: Some(resource),
            };
        }
        if table.as_str() == resource.results_table_name() {
            return ResolvedOwner {
                handle: ownership.own_tables.results(resource),
                is_cs_owner: true,
                definition_of: None,
            };
        }
    }

    ResolvedOwner::default()
}

/// Result of compiling one table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Number of non-empty entries now in the results table
    pub active_entries: usize,
    /// Fresh well-known slots, only produced for the Tables table
    pub well_known: Option<WellKnownSlots>,
}

/// Rebuild `results` from `definition`.
pub fn compile(
    resource: TableResource,
    definition: &[DefinitionEntry],
    results: &mut ResultsTable,
    ownership: &Ownership<'_>,
) -> CompileReport {
    results.clear();
    let mut well_known = WellKnownSlots::default();
    let mut active_entries = 0;

    for (index, def) in definition.iter().enumerate().take(results.capacity()) {
        let Some(state) = def
            .entry_state()
            .and_then(ResourceState::from_entry_state)
        else {
            continue;
        };

        let entry = match resource {
            TableResource::Eeprom | TableResource::Memory => ResultEntry::new(state, def.window()),
            TableResource::Apps => ResultEntry::named(state, def.name.clone()),
            TableResource::Tables => {
                let owner = resolve_owner(&def.name, ownership);
                if let Some(own) = owner.definition_of {
                    well_known.set(own, index);
                }
                ResultEntry {
                    table_handle: owner.handle,
                    is_cs_owner: owner.is_cs_owner,
                    ..ResultEntry::named(state, def.name.clone())
                }
            }
        };

        results.set(index, Some(entry));
        active_entries += 1;
    }

    CompileReport {
        active_entries,
        well_known: (resource == TableResource::Tables).then_some(well_known),
    }
}

/// Default definition image: every slot Empty.
pub fn default_definition(capacity: usize) -> Vec<DefinitionEntry> {
    vec![DefinitionEntry::empty(); capacity]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::EntryState;

    fn own_tables() -> OwnTables {
        let mut own = OwnTables::default();
        for (i, resource) in TableResource::ALL.iter().enumerate() {
            own.set_definition(*resource, Some(TableHandle(i as u32 + 1)));
            own.set_results(*resource, Some(TableHandle(i as u32 + 11)));
        }
        own
    }

    fn ownership(own: &OwnTables) -> Ownership<'_> {
        Ownership {
            app_name: "CS",
            limits: NameLimits::default(),
            own_tables: own,
        }
    }

    #[test]
    fn test_compile_resets_every_entry() {
        let own = own_tables();
        let mut results = ResultsTable::with_capacity(4);
        let mut stale = ResultEntry::new(ResourceState::Enabled, Default::default());
        stale.computed_yet = true;
        stale.comparison_value = 5;
        stale.byte_offset = 3;
        results.set(0, Some(stale));

        let definition = vec![
            DefinitionEntry::range(EntryState::Enabled, 0x1000, 8),
            DefinitionEntry::empty(),
            DefinitionEntry::range(EntryState::Disabled, 0x2000, 4),
            DefinitionEntry::empty(),
        ];
        let report = compile(
            TableResource::Eeprom,
            &definition,
            &mut results,
            &ownership(&own),
        );

        assert_eq!(report.active_entries, 2);
        assert!(report.well_known.is_none());
        for (_, entry) in results.iter() {
            assert_eq!(entry.byte_offset, 0);
            assert!(!entry.computed_yet);
            assert_eq!(entry.comparison_value, 0);
        }
        assert_eq!(results.get(2).map(|e| e.state), Some(ResourceState::Disabled));
        assert!(results.get(1).is_none());
    }

    #[test]
    fn test_compile_tables_resolves_own_tables() {
        let own = own_tables();
        let mut results = ResultsTable::with_capacity(4);
        let definition = vec![
            DefinitionEntry::named(EntryState::Enabled, "CS.DefMemoryTbl"),
            DefinitionEntry::named(EntryState::Enabled, "CS.ResAppTbl"),
            DefinitionEntry::named(EntryState::Enabled, "SC.RTS_TBL_001"),
            DefinitionEntry::named(EntryState::Enabled, "XX.DefMemoryTbl"),
        ];

        let report = compile(
            TableResource::Tables,
            &definition,
            &mut results,
            &ownership(&own),
        );

        let slots = report.well_known.unwrap();
        assert_eq!(slots.memory, Some(0));
        assert_eq!(slots.eeprom, None);

        let def_mem = results.get(0).unwrap();
        assert_eq!(def_mem.table_handle, own.definition(TableResource::Memory));
        assert!(def_mem.is_cs_owner);

        let res_app = results.get(1).unwrap();
        assert_eq!(res_app.table_handle, own.results(TableResource::Apps));
        assert!(res_app.is_cs_owner);

        for index in [2, 3] {
            let foreign = results.get(index).unwrap();
            assert_eq!(foreign.table_handle, None);
            assert!(!foreign.is_cs_owner);
        }
    }

    #[test]
    fn test_overlong_name_is_unrecognized() {
        let own = own_tables();
        let name = format!("{}.DefEepromTbl", "C".repeat(25));
        let resolved = resolve_owner(&name, &ownership(&own));
        assert_eq!(resolved, ResolvedOwner::default());
    }

    #[test]
    fn test_own_tables_owns() {
        let own = own_tables();
        assert!(own.owns(TableHandle(1)));
        assert!(own.owns(TableHandle(14)));
        assert!(!own.owns(TableHandle(99)));
    }

    #[test]
    fn test_default_definition_is_empty() {
        let def = default_definition(5);
        assert_eq!(def.len(), 5);
        assert!(def.iter().all(DefinitionEntry::is_empty));
    }
}
