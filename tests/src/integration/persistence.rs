//! # Persistence Flows
//!
//! Resource enable states survive a processor reset through the critical
//! data store, and never survive a power-on reset.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use cs_checksum::{
        codes, CommandArgs, DefinitionEntry, EntryState, EventId, ResetKind, ResourceType,
        TableResource,
    };
    use std::sync::Arc;

    fn disable_memory_and_apps(platform: &Platform) {
        let mut engine = platform.boot(ResetKind::PowerOn);
        command(&mut engine, codes::DISABLE_MEMORY, CommandArgs::None).unwrap();
        command(&mut engine, codes::DISABLE_APPS, CommandArgs::None).unwrap();
        assert!(platform.cds.save_count() >= 2);
    }

    #[test]
    fn test_processor_reset_restores_states() {
        let first = Platform::new();
        disable_memory_and_apps(&first);

        let second = Platform::with_cds(Arc::clone(&first.cds));
        let engine = second.boot(ResetKind::Processor);

        assert!(!enabled(&engine, ResourceType::Memory));
        assert!(!enabled(&engine, ResourceType::Apps));
        assert!(enabled(&engine, ResourceType::Eeprom));
        assert!(enabled(&engine, ResourceType::Tables));
        assert!(enabled(&engine, ResourceType::CfeCore));
        assert_eq!(second.cds.restore_count(), 1);
    }

    #[test]
    fn test_power_on_reset_ignores_saved_states() {
        let first = Platform::new();
        disable_memory_and_apps(&first);

        let second = Platform::with_cds(Arc::clone(&first.cds));
        let engine = second.boot(ResetKind::PowerOn);

        for resource in ResourceType::ALL {
            assert!(enabled(&engine, resource), "{} disabled", resource);
        }
        assert_eq!(second.cds.restore_count(), 0);
    }

    #[test]
    fn test_unreadable_store_falls_back_to_defaults() {
        let first = Platform::new();
        disable_memory_and_apps(&first);
        first.cds.fail_restore(-1);

        let second = Platform::with_cds(Arc::clone(&first.cds));
        let engine = second.boot(ResetKind::Processor);

        assert!(enabled(&engine, ResourceType::Memory));
        assert!(second.events.contains(EventId::CdsError));
        assert!(engine.service().state().cds_handle.is_none());
    }

    #[test]
    fn test_bad_definition_file_disables_only_its_resource() {
        let platform = Platform::new();
        platform.write_definition(
            TableResource::Eeprom,
            &[DefinitionEntry::range(EntryState::Enabled, 0x8_0000, 0x40)],
        );
        let mut engine = platform.boot(ResetKind::PowerOn);

        assert!(!enabled(&engine, ResourceType::Eeprom));
        assert_eq!(engine.service().state().eeprom.active_count(), 0);
        assert!(enabled(&engine, ResourceType::Memory));

        // The engine keeps serving commands.
        command(&mut engine, codes::NOOP, CommandArgs::None).unwrap();
        run_pass(&mut engine);
        assert!(engine.service().state().memory.get(0).unwrap().computed_yet);
    }
}
