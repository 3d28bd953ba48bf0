//! # CS Application
//!
//! Hosts the checksum engine on a simulated platform.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (from env)
//! 2. Load the engine configuration (from env)
//! 3. Build the adapters and initialize the engine
//! 4. Start the main task and the wakeup/housekeeping schedule
//! 5. Run until Ctrl+C, then close the command pipe
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CS_WAKEUP_INTERVAL_MS` | `1000` | Period of the background cycle |
//! | `CS_HK_INTERVAL_MS` | `1000` | Period of housekeeping requests |
//! | `CS_RESET_KIND` | `power-on` | Simulated reset kind |
//! | `CS_DEFINITION_DIR` | unset | Directory holding the definition table files |

mod platform;

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use cs_checksum::{
    run, ChecksumConfig, ChecksumHandler, ChecksumService, DefinitionFiles, InboundMessage,
};
use cs_telemetry::{init_telemetry, TelemetryConfig};
use tokio::runtime::Handle;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Depth of the command pipe.
const PIPE_DEPTH: usize = 64;

/// Periods of the two scheduled messages.
#[derive(Debug, Clone, Copy)]
struct Schedule {
    wakeup: Duration,
    housekeeping: Duration,
}

impl Schedule {
    fn from_env() -> Result<Self> {
        Ok(Self {
            wakeup: env_millis("CS_WAKEUP_INTERVAL_MS", 1000)?,
            housekeeping: env_millis("CS_HK_INTERVAL_MS", 1000)?,
        })
    }
}

fn env_millis(key: &str, default: u64) -> Result<Duration> {
    let millis = match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a number of milliseconds"))?,
        Err(_) => default,
    };
    anyhow::ensure!(millis > 0, "{key} must be greater than 0");
    Ok(Duration::from_millis(millis))
}

fn load_config() -> Result<ChecksumConfig> {
    let mut config = ChecksumConfig::from_env().context("Invalid checksum configuration")?;
    if let Ok(dir) = env::var("CS_DEFINITION_DIR") {
        config = config.with_definition_files(DefinitionFiles::in_dir(dir));
    }
    Ok(config)
}

/// Feed the wakeup and housekeeping messages into the command pipe.
async fn drive_schedule(pipe: Sender<InboundMessage>, schedule: Schedule) {
    let mut wakeup = interval(schedule.wakeup);
    let mut housekeeping = interval(schedule.housekeeping);
    wakeup.set_missed_tick_behavior(MissedTickBehavior::Skip);
    housekeeping.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let message = tokio::select! {
            _ = wakeup.tick() => InboundMessage::BackgroundCycle,
            _ = housekeeping.tick() => InboundMessage::SendHousekeeping,
        };
        if pipe.send(message).await.is_err() {
            warn!("Command pipe closed, schedule stopped");
            break;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = load_config()?;
    let schedule = Schedule::from_env()?;
    let reset = platform::reset_kind_from_env()?;

    info!("===========================================");
    info!("  CS Checksum Engine v{}", cs_checksum::VERSION);
    info!("===========================================");

    let deps = platform::build_dependencies(&config, reset, Handle::current());
    let mut service = ChecksumService::new(deps, config).context("Failed to create engine")?;
    service.initialize();
    let metrics = service.metrics();

    let (pipe, inbound) = tokio::sync::mpsc::channel(PIPE_DEPTH);
    let engine = tokio::spawn(run(ChecksumHandler::new(service), inbound));
    let scheduler = tokio::spawn(drive_schedule(pipe, schedule));

    info!(
        wakeup_ms = schedule.wakeup.as_millis() as u64,
        housekeeping_ms = schedule.housekeeping.as_millis() as u64,
        "Engine running. Press Ctrl+C to stop."
    );
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    scheduler.abort();
    // The aborted schedule drops the last sender, which ends the main task.
    let _ = scheduler.await;
    let handler = engine.await.context("Main task failed")?;

    let snapshot = metrics.snapshot();
    info!(
        cycles = snapshot.cycles_run,
        bytes = snapshot.bytes_checksummed,
        miscompares = snapshot.miscompares,
        commands = handler.service().state().command_counter,
        "Engine stopped"
    );
    Ok(())
}
