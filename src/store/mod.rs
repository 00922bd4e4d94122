//! Authoritative in-memory plot state owned by the hosting application.
//!
//! The store holds one grid per plot with no buyer selections on it. Sessions
//! are opened from it and checked out against it, so a session that lost a
//! race to another buyer learns about it at checkout instead of booking a
//! unit twice.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{GridError, Result};
use crate::grid::{Coord, Grid, UnitId};
use crate::labels::LabelingScheme;
use crate::plot::PlotSpec;
use crate::selection::{self, Rebased};
use crate::session::{BookingReceipt, BookingSession, RefreshOutcome, SessionConfig};

struct PlotRecord {
    spec: PlotSpec,
    grid: Grid,
}

/// Authoritative grids for every plot on offer, keyed by plot id.
#[derive(Default)]
pub struct PlotStore {
    plots: BTreeMap<String, PlotRecord>,
    scheme: LabelingScheme,
}

impl PlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scheme(scheme: LabelingScheme) -> Self {
        Self {
            plots: BTreeMap::new(),
            scheme,
        }
    }

    /// Load every plot of a JSON catalog (see [`crate::plot`]).
    pub fn from_catalog_json(raw: &str) -> Result<Self> {
        let mut store = Self::new();
        for spec in PlotSpec::catalog_from_json(raw)? {
            store.insert(spec)?;
        }
        Ok(store)
    }

    /// Register a plot and build its grid. Plot ids must be unique.
    pub fn insert(&mut self, spec: PlotSpec) -> Result<()> {
        if self.plots.contains_key(&spec.id) {
            return Err(GridError::DuplicatePlot(spec.id));
        }
        let grid = spec.build_grid_with(&self.scheme)?;
        self.plots.insert(spec.id.clone(), PlotRecord { spec, grid });
        Ok(())
    }

    pub fn plot_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.plots.keys().map(String::as_str)
    }

    pub fn spec(&self, plot_id: &str) -> Result<&PlotSpec> {
        self.record(plot_id).map(|record| &record.spec)
    }

    pub fn grid(&self, plot_id: &str) -> Result<&Grid> {
        self.record(plot_id).map(|record| &record.grid)
    }

    pub fn labels(&self) -> &LabelingScheme {
        &self.scheme
    }

    /// Start a buyer session on a copy of the plot's current grid.
    pub fn open_session(&self, plot_id: &str) -> Result<BookingSession> {
        self.open_session_with(plot_id, SessionConfig::default())
    }

    pub fn open_session_with(&self, plot_id: &str, config: SessionConfig) -> Result<BookingSession> {
        let grid = self.grid(plot_id)?.clone();
        Ok(BookingSession::with_config(plot_id, grid, config))
    }

    /// Record units booked through another channel. Repeated coordinates
    /// count once.
    ///
    /// If any coordinate is already booked or unavailable, nothing changes and
    /// the call fails with [`GridError::StaleSelection`] naming those units,
    /// the same error a buyer gets for losing a race.
    pub fn mark_booked(&mut self, plot_id: &str, coords: &[Coord]) -> Result<()> {
        let record = self.record_mut(plot_id)?;
        let coords: BTreeSet<Coord> = coords.iter().copied().collect();

        let mut staged = record.grid.clone();
        let mut ids = Vec::with_capacity(coords.len());
        for coord in coords {
            staged = selection::toggle_at(&staged, coord)?.0;
            ids.push(UnitId::at(coord.row, coord.col));
        }
        record.grid = selection::finalize(&staged, &ids)?;
        Ok(())
    }

    /// Book the session's selection against authoritative state.
    ///
    /// Units taken since the session last synced make the whole checkout fail
    /// with [`GridError::StaleSelection`]; the session is refreshed first so
    /// the buyer sees the current grid.
    pub fn checkout(&mut self, session: &mut BookingSession) -> Result<BookingReceipt> {
        let plot_id = session.plot_id().to_string();
        let authoritative = self.grid(&plot_id)?.clone();
        let ids = session.summary().selected_unit_ids;
        if ids.is_empty() {
            return Err(GridError::EmptySelection);
        }

        let Rebased { grid: staged, dropped } = selection::rebase(session.grid(), &authoritative)?;
        if !dropped.is_empty() {
            // The refresh already tells listeners which units were lost.
            session.refresh(&authoritative)?;
            session.record_rejection(&dropped);
            return Err(GridError::StaleSelection { ids: dropped });
        }

        let booked = selection::finalize(&staged, &ids)?;
        self.record_mut(&plot_id)?.grid = booked.clone();
        Ok(session.complete_booking(booked, &ids))
    }

    /// Rebase a session onto this store's grid for its plot.
    pub fn refresh(&self, session: &mut BookingSession) -> Result<RefreshOutcome> {
        let authoritative = self.grid(session.plot_id())?;
        session.refresh(authoritative)
    }

    fn record(&self, plot_id: &str) -> Result<&PlotRecord> {
        self.plots
            .get(plot_id)
            .ok_or_else(|| GridError::PlotNotFound(plot_id.to_string()))
    }

    fn record_mut(&mut self, plot_id: &str) -> Result<&mut PlotRecord> {
        self.plots
            .get_mut(plot_id)
            .ok_or_else(|| GridError::PlotNotFound(plot_id.to_string()))
    }
}
