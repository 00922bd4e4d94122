//! Booking lifecycle audit hooks.
//!
//! Sessions report each state transition as a [`BookingAuditEvent`] so hosts
//! can keep a trail of who selected and booked what, without the engine
//! knowing where the trail is stored.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Checkpoints emitted by [`crate::BookingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAuditStage {
    /// A session opened over a plot grid.
    SessionOpened,
    /// A unit's selection flipped.
    UnitToggled,
    /// A toggle hit an unavailable unit and was ignored.
    ToggleIgnored,
    /// A single unit was removed from the selection.
    UnitDeselected,
    /// The whole selection was dropped.
    SelectionCleared,
    /// The selection was booked.
    Finalized,
    /// Finalize failed because part of the selection went stale.
    FinalizeRejected,
    /// The session grid was rebuilt from authoritative state.
    Refreshed,
}

/// A single audit record with free-form details.
#[derive(Debug, Clone)]
pub struct BookingAuditEvent {
    pub timestamp: SystemTime,
    pub stage: BookingAuditStage,
    pub details: Vec<(String, Value)>,
}

impl BookingAuditEvent {
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Builder for [`BookingAuditEvent`].
pub struct BookingAuditEventBuilder {
    event: BookingAuditEvent,
}

impl BookingAuditEventBuilder {
    pub fn new(stage: BookingAuditStage) -> Self {
        Self {
            event: BookingAuditEvent {
                timestamp: SystemTime::now(),
                stage,
                details: Vec::new(),
            },
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event.details.push((key.into(), value.into()));
        self
    }

    pub fn finish(self) -> BookingAuditEvent {
        self.event
    }
}

/// Receives audit events from booking sessions.
pub trait BookingAudit: Send + Sync {
    fn record(&self, event: BookingAuditEvent);
}

/// Audit sink that discards everything.
#[derive(Debug, Default)]
pub struct NullBookingAudit;

impl BookingAudit for NullBookingAudit {
    fn record(&self, _event: BookingAuditEvent) {}
}

/// Buffers audit events in memory.
#[derive(Debug, Default)]
pub struct BufferedBookingAudit {
    events: Mutex<Vec<BookingAuditEvent>>,
}

impl BufferedBookingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<BookingAuditStage> {
        self.events
            .lock()
            .map(|events| events.iter().map(|e| e.stage).collect())
            .unwrap_or_default()
    }

    pub fn take(&self) -> Vec<BookingAuditEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl BookingAudit for BufferedBookingAudit {
    fn record(&self, event: BookingAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
