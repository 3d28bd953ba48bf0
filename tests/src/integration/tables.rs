//! # Definition Table Flows
//!
//! Operators change what is monitored by loading new definition tables.
//! The engine picks loads up on the next housekeeping request.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use cs_checksum::adapters::Crc32ChecksumProvider;
    use cs_checksum::{
        codes, ChecksumProvider, CommandArgs, DefinitionEntry, EntryState, EventId,
        InboundMessage, MemoryWindow, Reply, ResetKind, ResourceState, ResourceType,
        TableResource,
    };

    #[test]
    fn test_eeprom_reload_recompiles_results() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);
        run_pass(&mut engine);

        assert!(platform.tables.stage_load(
            TableResource::Eeprom.definition_table_name(),
            vec![DefinitionEntry::range(
                EntryState::Enabled,
                EEPROM_B.base,
                EEPROM_B.len
            )],
        ));
        engine.handle(InboundMessage::SendHousekeeping).unwrap();

        {
            let state = engine.service().state();
            assert_eq!(state.eeprom.active_count(), 1);
            let entry = state.eeprom.get(0).unwrap();
            assert_eq!(entry.window(), EEPROM_B);
            assert!(!entry.computed_yet);
        }
        assert_eq!(platform.events.with_id(EventId::ValidateSummary).len(), 5);

        run_pass(&mut engine);
        let reply = command(&mut engine, codes::REPORT_BASELINE_EEPROM, CommandArgs::EntryId(0));
        assert_eq!(reply, Ok(Reply::Baseline(platform.crc_of(EEPROM_B))));
    }

    #[test]
    fn test_invalid_reload_keeps_old_results_and_disables() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);

        assert!(platform.tables.stage_load(
            TableResource::Memory.definition_table_name(),
            vec![DefinitionEntry::range(EntryState::Enabled, 0x9_0000, 0x10)],
        ));
        engine.handle(InboundMessage::SendHousekeeping).unwrap();

        assert!(!enabled(&engine, ResourceType::Memory));
        let state = engine.service().state();
        assert_eq!(state.memory.active_count(), 1);
        assert_eq!(state.memory.get(0).unwrap().window(), RAM);
        assert!(platform.events.contains(EventId::ValidateRange));
    }

    #[test]
    fn test_duplicate_app_names_rejected() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);

        assert!(platform.tables.stage_load(
            TableResource::Apps.definition_table_name(),
            vec![
                DefinitionEntry::named(EntryState::Enabled, "HS"),
                DefinitionEntry::named(EntryState::Disabled, "HS"),
            ],
        ));
        engine.handle(InboundMessage::SendHousekeeping).unwrap();

        assert!(!enabled(&engine, ResourceType::Apps));
        assert!(platform.events.contains(EventId::ValidateDuplicate));
    }

    #[test]
    fn test_foreign_table_reload_takes_new_baseline() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);
        run_pass(&mut engine);

        assert!(platform
            .tables
            .update_foreign_table(FOREIGN_TABLE, vec![0x11; 0x40]));
        run_pass(&mut engine);

        let reply = command(
            &mut engine,
            codes::REPORT_BASELINE_TABLE,
            CommandArgs::Name(FOREIGN_TABLE.into()),
        );
        assert_eq!(
            reply,
            Ok(Reply::Baseline(
                Crc32ChecksumProvider::new().checksum(&[0x11; 0x40])
            ))
        );
        assert_eq!(
            engine.service().state().error_counters.get(ResourceType::Tables),
            0
        );
    }

    #[test]
    fn test_entry_disable_restarts_own_table_baseline() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);
        run_pass(&mut engine);

        let own = engine
            .service()
            .state()
            .tables
            .find_by_name("CS.DefMemoryTbl")
            .unwrap();
        let before = engine.service().state().tables.get(own).unwrap().comparison_value;

        command(&mut engine, codes::DISABLE_ENTRY_MEMORY, CommandArgs::EntryId(0)).unwrap();
        {
            let state = engine.service().state();
            assert_eq!(state.memory.get(0).unwrap().state, ResourceState::Disabled);
            assert!(!state.tables.get(own).unwrap().computed_yet);
        }

        run_pass(&mut engine);
        let entry = engine.service().state().tables.get(own).unwrap();
        assert!(entry.computed_yet);
        assert_ne!(entry.comparison_value, before);
        assert_eq!(counters(&engine), (1, 0));
    }

    #[test]
    fn test_missing_table_reported_without_error_count() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);
        platform.tables.remove_table(FOREIGN_TABLE);
        run_pass(&mut engine);

        assert!(platform.events.contains(EventId::ComputeNotFound));
        assert_eq!(
            engine.service().state().error_counters.get(ResourceType::Tables),
            0
        );
        // The scheduler moved past the missing table and finished the pass.
        assert!(engine.service().state().apps.get(0).unwrap().computed_yet);
    }

    #[test]
    fn test_get_entry_id_sees_reloaded_ranges() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);

        let moved = MemoryWindow::new(0x3000, 0x80);
        assert!(platform.tables.stage_load(
            TableResource::Memory.definition_table_name(),
            vec![
                DefinitionEntry::empty(),
                DefinitionEntry::empty(),
                DefinitionEntry::range(EntryState::Enabled, moved.base, moved.len),
            ],
        ));
        engine.handle(InboundMessage::SendHousekeeping).unwrap();

        let reply = command(
            &mut engine,
            codes::GET_ENTRY_ID_MEMORY,
            CommandArgs::Address(0x3010),
        );
        assert_eq!(reply, Ok(Reply::EntryIds(vec![2])));
    }
}
