//! Buyer booking sessions over a single plot grid.
//!
//! A [`BookingSession`] owns the buyer's current grid snapshot and routes
//! every change through [`crate::selection`]. After each change it notifies
//! registered [`SelectionListener`]s (checkout widgets, summary panels) and
//! records logging, metrics and audit entries according to its
//! [`SessionConfig`].

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use crate::audit::{BookingAudit, BookingAuditEventBuilder, BookingAuditStage, NullBookingAudit};
use crate::error::{GridError, Result};
use crate::grid::{Coord, Grid, UnitId};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::{BookingMetrics, MetricSnapshot};
use crate::selection::{self, Rebased, SelectionSummary};

/// Configuration knobs for a booking session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Optional structured logger.
    pub logger: Option<Logger>,
    /// Level used for routine selection events. Conflicts always log at `Warn`.
    pub log_level: LogLevel,
    pub log_target: String,
    /// Metrics accumulator shared with the host.
    pub metrics: Option<Arc<Mutex<BookingMetrics>>>,
    pub metrics_target: String,
    pub audit: Arc<dyn BookingAudit>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            logger: None,
            log_level: LogLevel::Debug,
            log_target: "sqft::session".to_string(),
            metrics: None,
            metrics_target: "sqft::session.metrics".to_string(),
            audit: Arc::new(NullBookingAudit),
        }
    }
}

impl SessionConfig {
    /// Attach a fresh metrics accumulator unless one is already set.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(BookingMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<BookingMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Confirmation handed to checkout after a successful booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub plot_id: String,
    pub unit_ids: Vec<UnitId>,
    pub labels: Vec<String>,
    pub unit_count: usize,
    pub price_per_unit: u64,
    pub total_cost: u64,
}

/// Result of rebuilding a session from authoritative state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Availability differed from what the session had.
    pub changed: bool,
    /// Selected units that are no longer available.
    pub dropped: Vec<UnitId>,
    pub summary: SelectionSummary,
}

/// Receives selection events from a session.
pub trait SelectionListener: Send {
    fn name(&self) -> &str {
        "selection_listener"
    }

    fn on_summary(&mut self, _summary: &SelectionSummary) {}

    fn on_finalized(&mut self, _receipt: &BookingReceipt) {}

    /// Called with the units a buyer lost to another booking.
    fn on_conflict(&mut self, _lost: &[UnitId]) {}
}

/// One buyer's in-progress selection on one plot.
pub struct BookingSession {
    plot_id: String,
    grid: Grid,
    config: SessionConfig,
    listeners: Vec<Box<dyn SelectionListener>>,
}

impl BookingSession {
    pub fn new(plot_id: impl Into<String>, grid: Grid) -> Self {
        Self::with_config(plot_id, grid, SessionConfig::default())
    }

    pub fn with_config(plot_id: impl Into<String>, grid: Grid, config: SessionConfig) -> Self {
        let session = Self {
            plot_id: plot_id.into(),
            grid,
            config,
            listeners: Vec::new(),
        };
        session.audit(
            BookingAuditEventBuilder::new(BookingAuditStage::SessionOpened)
                .detail("height", session.grid.height())
                .detail("width", session.grid.width()),
        );
        session.log(
            session.config.log_level,
            "session_opened",
            [json_kv("units", session.grid.len())],
        );
        session
    }

    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    pub fn register_listener<L>(&mut self, listener: L)
    where
        L: SelectionListener + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn plot_id(&self) -> &str {
        &self.plot_id
    }

    /// Current snapshot. Cloning it is cheap and the clone never changes.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn summary(&self) -> SelectionSummary {
        selection::summarize(&self.grid)
    }

    /// Flip one unit and notify listeners. Unavailable units are ignored.
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<SelectionSummary> {
        let applied = self.grid.unit(row, col)?.is_available();
        let (grid, summary) = selection::toggle(&self.grid, row, col)?;
        self.grid = grid;

        let unit = self.grid.unit(row, col)?;
        let unit_id = unit.id().to_string();
        let selected = unit.is_selected();
        self.with_metrics(|metrics| metrics.record_toggle(applied));
        if applied {
            self.audit(
                BookingAuditEventBuilder::new(BookingAuditStage::UnitToggled)
                    .detail("unit", unit_id.clone())
                    .detail("selected", selected),
            );
            self.log(
                self.config.log_level,
                "unit_toggled",
                [
                    json_kv("unit", unit_id),
                    json_kv("selected", selected),
                    json_kv("selected_count", summary.selected_count),
                    json_kv("total_cost", summary.total_cost),
                ],
            );
        } else {
            self.audit(
                BookingAuditEventBuilder::new(BookingAuditStage::ToggleIgnored)
                    .detail("unit", unit_id.clone()),
            );
            self.log(
                self.config.log_level,
                "toggle_ignored",
                [json_kv("unit", unit_id)],
            );
        }

        self.notify_summary(&summary);
        Ok(summary)
    }

    /// Toggle using coordinates from a UI layer that may be negative.
    pub fn toggle_signed(&mut self, row: i64, col: i64) -> Result<SelectionSummary> {
        let Coord { row, col } = self.grid.resolve(row, col)?;
        self.toggle(row, col)
    }

    /// Remove one unit from the selection by id.
    pub fn deselect(&mut self, id: &UnitId) -> Result<SelectionSummary> {
        self.grid = selection::deselect(&self.grid, id)?;
        let summary = self.summary();
        self.audit(
            BookingAuditEventBuilder::new(BookingAuditStage::UnitDeselected)
                .detail("unit", id.to_string()),
        );
        self.log(
            self.config.log_level,
            "unit_deselected",
            [
                json_kv("unit", id.to_string()),
                json_kv("selected_count", summary.selected_count),
            ],
        );
        self.notify_summary(&summary);
        Ok(summary)
    }

    /// Drop the whole selection.
    pub fn clear(&mut self) -> SelectionSummary {
        self.grid = selection::clear(&self.grid);
        self.with_metrics(BookingMetrics::record_clear);
        self.audit(BookingAuditEventBuilder::new(BookingAuditStage::SelectionCleared));
        self.log(self.config.log_level, "selection_cleared", []);
        let summary = self.summary();
        self.notify_summary(&summary);
        summary
    }

    /// Move the session to another plot, dropping the current selection.
    pub fn switch_plot(&mut self, plot_id: impl Into<String>, grid: Grid) -> SelectionSummary {
        self.plot_id = plot_id.into();
        self.grid = selection::clear(&grid);
        self.audit(
            BookingAuditEventBuilder::new(BookingAuditStage::SessionOpened)
                .detail("height", self.grid.height())
                .detail("width", self.grid.width()),
        );
        self.log(
            self.config.log_level,
            "plot_switched",
            [json_kv("units", self.grid.len())],
        );
        let summary = self.summary();
        self.notify_summary(&summary);
        summary
    }

    /// Book the whole current selection against this session's grid.
    pub fn finalize(&mut self) -> Result<BookingReceipt> {
        let ids = self.summary().selected_unit_ids;
        self.finalize_ids(&ids)
    }

    /// Book exactly `ids`; all of them or none.
    pub fn finalize_ids(&mut self, ids: &[UnitId]) -> Result<BookingReceipt> {
        match selection::finalize(&self.grid, ids) {
            Ok(booked) => Ok(self.complete_booking(booked, ids)),
            Err(err) => {
                self.reject_finalize(&err);
                Err(err)
            }
        }
    }

    /// Apply bookings made elsewhere; returns the selected units that were lost.
    pub fn mark_unavailable(&mut self, coords: &[Coord]) -> Result<Vec<UnitId>> {
        let lost = coords
            .iter()
            .map(|coord| self.grid.unit_at(*coord))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|unit| unit.is_selected())
            .map(|unit| unit.id().clone())
            .collect::<Vec<_>>();

        self.grid = selection::mark_unavailable(&self.grid, coords)?;
        if !lost.is_empty() {
            self.notify_conflict(&lost);
            let summary = self.summary();
            self.notify_summary(&summary);
        }
        Ok(lost)
    }

    /// Rebuild the session on top of an authoritative grid, keeping what can
    /// be kept of the selection.
    pub fn refresh(&mut self, authoritative: &Grid) -> Result<RefreshOutcome> {
        let changed = self.grid.fingerprint() != authoritative.fingerprint();
        let Rebased { grid, dropped } = selection::rebase(&self.grid, authoritative)?;
        self.grid = grid;

        self.with_metrics(BookingMetrics::record_refresh);
        self.audit(
            BookingAuditEventBuilder::new(BookingAuditStage::Refreshed)
                .detail("changed", changed)
                .detail("dropped", ids_value(&dropped)),
        );
        let level = if dropped.is_empty() {
            self.config.log_level
        } else {
            LogLevel::Warn
        };
        self.log(
            level,
            "session_refreshed",
            [
                json_kv("changed", changed),
                json_kv("dropped", ids_value(&dropped)),
            ],
        );

        if !dropped.is_empty() {
            self.notify_conflict(&dropped);
        }
        let summary = self.summary();
        self.notify_summary(&summary);
        Ok(RefreshOutcome {
            changed,
            dropped,
            summary,
        })
    }

    /// Log the current metrics snapshot, if metrics are enabled.
    pub fn emit_metrics(&self) -> Option<MetricSnapshot> {
        let snapshot = self
            .config
            .metrics
            .as_ref()
            .and_then(|handle| handle.lock().ok().map(|metrics| metrics.snapshot()))?;
        if let Some(logger) = &self.config.logger {
            let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
        }
        Some(snapshot)
    }

    pub(crate) fn complete_booking(&mut self, booked: Grid, ids: &[UnitId]) -> BookingReceipt {
        let price_per_unit = booked.price_per_unit();
        let mut unit_ids: Vec<UnitId> = ids.to_vec();
        unit_ids.sort_by_key(|id| {
            booked
                .unit_by_id(id)
                .map(|unit| unit.coord())
                .unwrap_or(Coord::new(usize::MAX, usize::MAX))
        });
        unit_ids.dedup();
        let labels = unit_ids
            .iter()
            .filter_map(|id| booked.unit_by_id(id).ok())
            .map(|unit| unit.label().to_string())
            .collect();
        let unit_count = unit_ids.len();
        let receipt = BookingReceipt {
            plot_id: self.plot_id.clone(),
            unit_ids,
            labels,
            unit_count,
            price_per_unit,
            total_cost: unit_count as u64 * price_per_unit,
        };

        self.grid = selection::clear(&booked);
        self.with_metrics(|metrics| metrics.record_finalize(unit_count));
        self.audit(
            BookingAuditEventBuilder::new(BookingAuditStage::Finalized)
                .detail("units", ids_value(&receipt.unit_ids))
                .detail("total_cost", receipt.total_cost),
        );
        self.log(
            LogLevel::Info,
            "selection_finalized",
            [
                json_kv("units", ids_value(&receipt.unit_ids)),
                json_kv("total_cost", receipt.total_cost),
            ],
        );

        for listener in self.listeners.iter_mut() {
            listener.on_finalized(&receipt);
        }
        let summary = self.summary();
        self.notify_summary(&summary);
        receipt
    }

    fn reject_finalize(&mut self, err: &GridError) {
        if let GridError::StaleSelection { ids } = err {
            self.record_rejection(ids);
            self.notify_conflict(ids);
        }
    }

    /// Count and log a stale finalize without notifying listeners, for
    /// callers that already reported the conflict through a refresh.
    pub(crate) fn record_rejection(&mut self, ids: &[UnitId]) {
        self.with_metrics(BookingMetrics::record_stale);
        self.audit(
            BookingAuditEventBuilder::new(BookingAuditStage::FinalizeRejected)
                .detail("stale", ids_value(ids)),
        );
        self.log(
            LogLevel::Warn,
            "finalize_rejected",
            [json_kv("stale", ids_value(ids))],
        );
    }

    fn notify_summary(&mut self, summary: &SelectionSummary) {
        for listener in self.listeners.iter_mut() {
            listener.on_summary(summary);
        }
    }

    fn notify_conflict(&mut self, lost: &[UnitId]) {
        for listener in self.listeners.iter_mut() {
            listener.on_conflict(lost);
        }
    }

    fn log(
        &self,
        level: LogLevel,
        message: &str,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) {
        let Some(logger) = &self.config.logger else {
            return;
        };
        let mut event = event_with_fields(level, &self.config.log_target, message, fields);
        event
            .fields
            .insert("plot".to_string(), Value::from(self.plot_id.as_str()));
        let _ = logger.log_event(event);
    }

    fn with_metrics(&self, record: impl FnOnce(&mut BookingMetrics)) {
        if let Some(handle) = &self.config.metrics {
            if let Ok(mut metrics) = handle.lock() {
                record(&mut metrics);
            }
        }
    }

    fn audit(&self, builder: BookingAuditEventBuilder) {
        let event = builder.detail("plot", self.plot_id.as_str()).finish();
        self.config.audit.record(event);
    }
}

fn ids_value(ids: &[UnitId]) -> Value {
    Value::Array(ids.iter().map(|id| Value::from(id.as_str())).collect())
}
