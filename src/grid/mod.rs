//! Grid model orchestrator.
//!
//! Callers import unit and grid types from here; construction and storage
//! details live in the private `core` module.

mod core;

pub use core::{Coord, Grid, GridCounts, Unit, UnitId, UnitStatus};
