//! # Child Task Flows
//!
//! Recompute and one-shot requests lease the single child-task slot.
//! Results come back over the completion channel and are applied by the
//! main task only.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use cs_checksum::adapters::{DeferredTaskSpawner, TokioTaskSpawner};
    use cs_checksum::{
        codes, run, ChecksumApi, CommandArgs, CsError, EventId, InboundMessage, ResetKind,
        ResourceState, ResourceType,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    async fn wait_for(platform: &Platform, id: EventId) -> bool {
        timeout(Duration::from_secs(5), async {
            while !platform.events.contains(id) {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .is_ok()
    }

    // =========================================================================
    // ON THE TOKIO RUNTIME
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_recompute_through_main_task() {
        let platform = Platform::new();
        let spawner = Arc::new(TokioTaskSpawner::current().unwrap());
        let engine = platform.boot_with(ResetKind::PowerOn, spawner);
        let (pipe, inbound) = mpsc::channel(16);
        let main = tokio::spawn(run(engine, inbound));

        pipe.send(InboundMessage::Command {
            code: codes::RECOMPUTE_BASELINE_EEPROM,
            args: CommandArgs::EntryId(1),
        })
        .await
        .unwrap();

        assert!(wait_for(&platform, EventId::RecomputeFinished).await);
        drop(pipe);
        let engine = main.await.unwrap();

        let state = engine.service().state();
        let entry = state.eeprom.get(1).unwrap();
        assert!(entry.computed_yet);
        assert_eq!(entry.comparison_value, platform.crc_of(EEPROM_B));
        assert_eq!(entry.state, ResourceState::Enabled);
        assert!(state.child.is_idle());
        assert!(platform.events.contains(EventId::RecomputeStarted));
        assert_eq!(counters(&engine), (1, 0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_shot_then_cancel_is_rejected() {
        let platform = Platform::new();
        let spawner = Arc::new(TokioTaskSpawner::current().unwrap());
        let engine = platform.boot_with(ResetKind::PowerOn, spawner);
        let (pipe, inbound) = mpsc::channel(16);
        let main = tokio::spawn(run(engine, inbound));

        pipe.send(InboundMessage::Command {
            code: codes::ONE_SHOT,
            args: CommandArgs::OneShot {
                address: RAM.base,
                size: RAM.len,
                max_bytes_per_cycle: 0,
            },
        })
        .await
        .unwrap();
        assert!(wait_for(&platform, EventId::OneShotFinished).await);

        pipe.send(InboundMessage::Command {
            code: codes::CANCEL_ONE_SHOT,
            args: CommandArgs::None,
        })
        .await
        .unwrap();
        drop(pipe);
        let engine = main.await.unwrap();

        let last = engine.service().state().last_one_shot;
        assert_eq!(last.checksum, platform.crc_of(RAM));
        assert_eq!(last.address, RAM.base);
        assert_eq!(last.size, RAM.len);
        assert_eq!(last.max_bytes_per_cycle, engine.service().config().max_bytes_per_cycle);
        assert!(platform.events.contains(EventId::OneShotCancelNoTask));
        assert_eq!(counters(&engine), (1, 1));
    }

    // =========================================================================
    // UNDER TEST CONTROL
    // =========================================================================

    #[test]
    fn test_slot_is_shared_by_recompute_and_one_shot() {
        let platform = Platform::new();
        let spawner = Arc::new(DeferredTaskSpawner::new());
        let mut engine = platform.boot_with(ResetKind::PowerOn, spawner.clone());

        command(
            &mut engine,
            codes::RECOMPUTE_BASELINE_APP,
            CommandArgs::Name("HS".into()),
        )
        .unwrap();
        let busy = command(
            &mut engine,
            codes::ONE_SHOT,
            CommandArgs::OneShot {
                address: RAM.base,
                size: 0x10,
                max_bytes_per_cycle: 0,
            },
        );
        assert_eq!(busy, Err(CsError::AlreadyInProgress));
        assert!(platform.events.contains(EventId::OneShotBusy));

        // While recomputing, the entry is out of the background rotation.
        assert_eq!(
            engine.service().state().apps.get(0).unwrap().state,
            ResourceState::Disabled
        );

        assert_eq!(spawner.run_all(), 1);
        assert_eq!(settle(&mut engine), 1);
        let entry = engine.service().state().apps.get(0).unwrap();
        assert_eq!(entry.state, ResourceState::Enabled);
        assert_eq!(entry.comparison_value, platform.crc_of(APP_HS));
        assert_eq!(counters(&engine), (1, 1));
    }

    #[test]
    fn test_cancelled_one_shot_result_is_discarded() {
        let platform = Platform::new();
        let spawner = Arc::new(DeferredTaskSpawner::new());
        let mut engine = platform.boot_with(ResetKind::PowerOn, spawner.clone());

        command(
            &mut engine,
            codes::ONE_SHOT,
            CommandArgs::OneShot {
                address: CFE.base,
                size: CFE.len,
                max_bytes_per_cycle: 0x40,
            },
        )
        .unwrap();
        let job = spawner.take(spawner.front().unwrap()).unwrap();
        command(&mut engine, codes::CANCEL_ONE_SHOT, CommandArgs::None).unwrap();
        assert!(platform.events.contains(EventId::OneShotCancelled));

        // A new request may take the slot straight away.
        command(
            &mut engine,
            codes::RECOMPUTE_BASELINE_CFE_CORE,
            CommandArgs::None,
        )
        .unwrap();

        job();
        spawner.run_all();
        assert_eq!(settle(&mut engine), 2);

        let state = engine.service().state();
        assert_eq!(state.last_one_shot.checksum, 0);
        assert_eq!(state.cfe_core_baseline, platform.crc_of(CFE));
        assert_eq!(engine.service().metrics().snapshot().stale_completions, 1);
        assert_eq!(counters(&engine), (3, 0));
    }

    #[test]
    fn test_failed_spawn_leaves_entry_untouched() {
        let platform = Platform::new();
        let spawner = Arc::new(DeferredTaskSpawner::new());
        spawner.fail_spawn(-1);
        let mut engine = platform.boot_with(ResetKind::PowerOn, spawner);

        let result = command(&mut engine, codes::RECOMPUTE_BASELINE_MEMORY, CommandArgs::EntryId(0));
        assert_eq!(result, Err(CsError::SpawnFailed { code: 0xFFFF_FFFF }));
        assert!(engine.service().state().child.is_idle());
        assert_eq!(
            engine.service().resource_state(ResourceType::Memory),
            ResourceState::Enabled
        );
        assert_eq!(
            engine.service().state().memory.get(0).unwrap().state,
            ResourceState::Enabled
        );
        assert_eq!(counters(&engine), (0, 1));
    }
}
