//! Diagnostic sinks.
//!
//! The store never talks to a logger directly. It hands `LogEvent`s to an
//! injected `DiagnosticSink`, which may forward them to `tracing`, keep them
//! for inspection, or drop them. Recording never fails and never panics.

use std::sync::Mutex;

use super::events::{Level, LogEvent};

/// Observational collaborator receiving structured diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: LogEvent);
}

/// Forwards events to the global `tracing` subscriber.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    run_id: Option<String>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp every forwarded event with this run ID.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

impl DiagnosticSink for TracingSink {
    fn record(&self, event: LogEvent) {
        let fields = serde_json::Value::Object(event.fields.into_iter().collect());
        let run_id = event.run_id.as_deref().or(self.run_id.as_deref()).unwrap_or("");
        match event.level {
            Level::Trace => tracing::trace!(
                event = %event.event,
                stage = %event.stage,
                run_id = run_id,
                fields = %fields,
                "{}",
                event.message
            ),
            Level::Debug => tracing::debug!(
                event = %event.event,
                stage = %event.stage,
                run_id = run_id,
                fields = %fields,
                "{}",
                event.message
            ),
            Level::Info => tracing::info!(
                event = %event.event,
                stage = %event.stage,
                run_id = run_id,
                fields = %fields,
                "{}",
                event.message
            ),
            Level::Warn => tracing::warn!(
                event = %event.event,
                stage = %event.stage,
                run_id = run_id,
                fields = %fields,
                "{}",
                event.message
            ),
            Level::Error => tracing::error!(
                event = %event.event,
                stage = %event.stage,
                run_id = run_id,
                fields = %fields,
                "{}",
                event.message
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, oldest first.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of recorded events with the given name.
    pub fn count(&self, event_name: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|e| e.event == event_name)
            .count()
    }

    /// Most recent event with the given name.
    pub fn last(&self, event_name: &str) -> Option<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .rev()
            .find(|e| e.event == event_name)
            .cloned()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: LogEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: LogEvent) {}
}
