//! Labeling scheme orchestrator.
//!
//! Display layers and the grid model import label types from here while the
//! mapping rules live in the private `core` module.

mod core;

pub use core::{Facing, LabelingScheme, UnitLabel, UnitMetadata};
