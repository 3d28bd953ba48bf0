//! # Background Monitoring Flows
//!
//! Wakeups drive the budgeted scheduler over every resource; corruption
//! of a monitored range must surface on the following pass.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use cs_checksum::adapters::Crc32ChecksumProvider;
    use cs_checksum::{
        codes, ChecksumProvider, CommandArgs, EventId, InboundMessage, Reply, ResetKind,
        ResourceType,
    };

    fn baseline(reply: Reply) -> u32 {
        match reply {
            Reply::Baseline(value) => value,
            other => panic!("expected a baseline, got {:?}", other),
        }
    }

    // =========================================================================
    // BASELINES
    // =========================================================================

    #[test]
    fn test_first_pass_captures_every_baseline() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);
        run_pass(&mut engine);

        let eeprom_a = baseline(
            command(&mut engine, codes::REPORT_BASELINE_EEPROM, CommandArgs::EntryId(0)).unwrap(),
        );
        let eeprom_b = baseline(
            command(&mut engine, codes::REPORT_BASELINE_EEPROM, CommandArgs::EntryId(1)).unwrap(),
        );
        assert_eq!(eeprom_a, platform.crc_of(EEPROM_A));
        assert_eq!(eeprom_b, platform.crc_of(EEPROM_B));

        let ram = baseline(
            command(&mut engine, codes::REPORT_BASELINE_MEMORY, CommandArgs::EntryId(0)).unwrap(),
        );
        assert_eq!(ram, platform.crc_of(RAM));

        let cfe = baseline(
            command(&mut engine, codes::REPORT_BASELINE_CFE_CORE, CommandArgs::None).unwrap(),
        );
        assert_eq!(cfe, platform.crc_of(CFE));

        let os = baseline(command(&mut engine, codes::REPORT_BASELINE_OS, CommandArgs::None).unwrap());
        assert_eq!(os, platform.crc_of(KERNEL));

        let app = baseline(
            command(
                &mut engine,
                codes::REPORT_BASELINE_APP,
                CommandArgs::Name("HS".into()),
            )
            .unwrap(),
        );
        assert_eq!(app, platform.crc_of(APP_HS));

        let table = baseline(
            command(
                &mut engine,
                codes::REPORT_BASELINE_TABLE,
                CommandArgs::Name(FOREIGN_TABLE.into()),
            )
            .unwrap(),
        );
        assert_eq!(table, Crc32ChecksumProvider::new().checksum(&[0x5A; 0x40]));

        // Reports never count as commands.
        assert_eq!(counters(&engine), (0, 0));

        match engine.handle(InboundMessage::SendHousekeeping).unwrap() {
            Reply::Housekeeping(packet) => {
                assert_eq!(packet.eeprom_baseline, eeprom_a.wrapping_add(eeprom_b));
                assert_eq!(packet.cfe_core_baseline, cfe);
                assert_eq!(packet.os_baseline, os);
                assert_eq!(packet.pass_counter, 1);
            }
            other => panic!("expected housekeeping, got {:?}", other),
        }
    }

    #[test]
    fn test_report_before_first_pass_is_not_computed() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);

        let result = command(&mut engine, codes::REPORT_BASELINE_MEMORY, CommandArgs::EntryId(0));
        assert!(result.is_err());
        assert!(platform.events.contains(EventId::NoBaseline));
    }

    // =========================================================================
    // CORRUPTION
    // =========================================================================

    #[test]
    fn test_corruption_detected_on_next_pass() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);
        run_pass(&mut engine);

        assert!(platform.memory.corrupt(RAM.base + 5));
        run_pass(&mut engine);

        match engine.handle(InboundMessage::SendHousekeeping).unwrap() {
            Reply::Housekeeping(packet) => {
                assert_eq!(packet.memory_error_counter, 1);
                assert_eq!(packet.eeprom_error_counter, 0);
            }
            other => panic!("expected housekeeping, got {:?}", other),
        }
        let miscompare = platform.events.with_id(EventId::Miscompare);
        assert_eq!(miscompare.len(), 1);
        assert!(miscompare[0].message.contains("Memory Table"));
        // Detection only: the resource keeps running.
        assert!(enabled(&engine, ResourceType::Memory));
    }

    #[test]
    fn test_disabled_resource_ignores_corruption_until_enabled() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);
        run_pass(&mut engine);

        command(&mut engine, codes::DISABLE_EEPROM, CommandArgs::None).unwrap();
        assert!(platform.memory.corrupt(EEPROM_B.base));
        run_pass(&mut engine);
        assert_eq!(
            engine.service().state().error_counters.get(ResourceType::Eeprom),
            0
        );

        command(&mut engine, codes::ENABLE_EEPROM, CommandArgs::None).unwrap();
        run_pass(&mut engine);
        assert_eq!(
            engine.service().state().error_counters.get(ResourceType::Eeprom),
            1
        );
        assert_eq!(counters(&engine), (2, 0));
    }

    #[test]
    fn test_disable_all_freezes_scanning() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);
        command(&mut engine, codes::DISABLE_ALL, CommandArgs::None).unwrap();

        for _ in 0..50 {
            engine.handle(InboundMessage::BackgroundCycle).unwrap();
        }
        let state = engine.service().state();
        assert_eq!(state.cursor.pass_counter, 0);
        assert!(!state.cfe_segment.computed_yet);
        assert_eq!(engine.service().metrics().snapshot().cycles_run, 0);

        command(&mut engine, codes::ENABLE_ALL, CommandArgs::None).unwrap();
        run_pass(&mut engine);
        assert!(engine.service().state().cfe_segment.computed_yet);
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    #[test]
    fn test_get_entry_id_reports_every_overlapping_entry() {
        let platform = Platform::new();
        let mut engine = platform.boot(ResetKind::PowerOn);

        // The boundary address belongs to both adjacent ranges.
        let reply = command(
            &mut engine,
            codes::GET_ENTRY_ID_EEPROM,
            CommandArgs::Address(EEPROM_B.base),
        );
        assert_eq!(reply, Ok(Reply::EntryIds(vec![0, 1])));
        assert_eq!(platform.events.with_id(EventId::GetEntryId).len(), 2);

        let reply = command(
            &mut engine,
            codes::GET_ENTRY_ID_MEMORY,
            CommandArgs::Address(0x3F00),
        );
        assert_eq!(reply, Ok(Reply::EntryIds(Vec::new())));
        assert!(platform.events.contains(EventId::GetEntryIdNotFound));
        assert_eq!(counters(&engine), (2, 0));
    }
}
