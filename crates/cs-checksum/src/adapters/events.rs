//! Event sinks.

use crate::domain::{CsEvent, EventId, Severity};
use crate::ports::outbound::EventSink;
use cs_telemetry::log_event;
use parking_lot::Mutex;

/// Forwards every event to `tracing` at the level of its severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingEventSink {
    fn send(&self, event: CsEvent) {
        let event_id = event.id.code();
        let resource = event.resource.map(|r| r.label()).unwrap_or("-");
        match event.severity {
            Severity::Debug => {
                log_event!(debug, "cs", event.message, event_id = event_id, resource = resource)
            }
            Severity::Info => {
                log_event!(info, "cs", event.message, event_id = event_id, resource = resource)
            }
            Severity::Error => {
                log_event!(error, "cs", event.message, event_id = event_id, resource = resource)
            }
        }
    }
}

/// Keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<CsEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CsEvent> {
        self.events.lock().clone()
    }

    pub fn with_id(&self, id: EventId) -> Vec<CsEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.id == id)
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.events.lock().iter().any(|event| event.id == id)
    }

    pub fn last(&self) -> Option<CsEvent> {
        self.events.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingEventSink {
    fn send(&self, event: CsEvent) {
        self.events.lock().push(event);
    }
}
