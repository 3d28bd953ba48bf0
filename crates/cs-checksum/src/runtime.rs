//! The main cooperative task.
//!
//! One task owns the [`ChecksumHandler`]. It multiplexes the command pipe
//! with child-task completions, so completions are applied on this task
//! only and never race a command.

use crate::domain::{ChildCompletion, CsEvent, EventId};
use crate::ipc::{ChecksumHandler, InboundMessage};
use cs_telemetry::subsystem_span;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver};
use tracing::{info, Instrument};

/// Run the engine until the inbound channel closes.
///
/// Returns the handler so the caller can inspect the final state.
pub async fn run(handler: ChecksumHandler, inbound: Receiver<InboundMessage>) -> ChecksumHandler {
    run_loop(handler, inbound)
        .instrument(subsystem_span!("cs_main", subsystem = "cs"))
        .await
}

async fn run_loop(
    mut handler: ChecksumHandler,
    mut inbound: Receiver<InboundMessage>,
) -> ChecksumHandler {
    let mut completions = handler.service_mut().take_completion_receiver();
    info!("Checksum main task started");

    loop {
        tokio::select! {
            biased;

            Some(completion) = next_completion(&mut completions) => {
                handler.service_mut().apply_completion(completion);
            }
            message = inbound.recv() => match message {
                Some(message) => {
                    // Already reported and counted by the handler.
                    let _ = handler.handle(message);
                }
                None => break,
            },
        }
    }

    handler
        .service()
        .emit(CsEvent::info(EventId::Exit, "CS App terminating"));
    info!("Checksum main task stopped");
    handler
}

async fn next_completion(
    completions: &mut Option<UnboundedReceiver<ChildCompletion>>,
) -> Option<ChildCompletion> {
    match completions {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
