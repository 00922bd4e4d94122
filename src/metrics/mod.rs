use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;

/// Counters accumulated by booking sessions.
#[derive(Debug, Default, Clone)]
pub struct BookingMetrics {
    toggles: u64,
    ignored_toggles: u64,
    clears: u64,
    finalized_batches: u64,
    finalized_units: u64,
    stale_rejections: u64,
    refreshes: u64,
}

impl BookingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_toggle(&mut self, applied: bool) {
        if applied {
            self.toggles = self.toggles.saturating_add(1);
        } else {
            self.ignored_toggles = self.ignored_toggles.saturating_add(1);
        }
    }

    pub fn record_clear(&mut self) {
        self.clears = self.clears.saturating_add(1);
    }

    pub fn record_finalize(&mut self, units: usize) {
        self.finalized_batches = self.finalized_batches.saturating_add(1);
        self.finalized_units = self.finalized_units.saturating_add(units as u64);
    }

    pub fn record_stale(&mut self) {
        self.stale_rejections = self.stale_rejections.saturating_add(1);
    }

    pub fn record_refresh(&mut self) {
        self.refreshes = self.refreshes.saturating_add(1);
    }

    /// Copy the counters into a serializable snapshot.
    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            toggles: self.toggles,
            ignored_toggles: self.ignored_toggles,
            clears: self.clears,
            finalized_batches: self.finalized_batches,
            finalized_units: self.finalized_units,
            stale_rejections: self.stale_rejections,
            refreshes: self.refreshes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub toggles: u64,
    pub ignored_toggles: u64,
    pub clears: u64,
    pub finalized_batches: u64,
    pub finalized_units: u64,
    pub stale_rejections: u64,
    pub refreshes: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => LogFields::new(),
        }
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        let mut event = LogEvent::new(LogLevel::Info, target, "booking_metrics");
        event.fields = self.as_fields();
        event
    }
}
