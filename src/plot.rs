//! Plot metadata used to build booking grids.
//!
//! A catalog is a JSON array of plots:
//!
//! ```json
//! [{
//!   "id": "bms-plot-alpha",
//!   "name": "Alpha Square",
//!   "location": "Central Business District, Gurgaon",
//!   "units_wide": 10,
//!   "units_tall": 10,
//!   "price_per_unit": 25000,
//!   "emi_options": ["3 months @ 5% interest"],
//!   "pre_booked": [{ "row": 0, "col": 0 }]
//! }]
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::{Coord, Grid};
use crate::labels::LabelingScheme;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub units_wide: usize,
    pub units_tall: usize,
    pub price_per_unit: u64,
    #[serde(default)]
    pub emi_options: Vec<String>,
    #[serde(default)]
    pub pre_booked: Vec<Coord>,
}

impl PlotSpec {
    pub fn new(id: impl Into<String>, units_tall: usize, units_wide: usize, price_per_unit: u64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            location: String::new(),
            units_wide,
            units_tall,
            price_per_unit,
            emi_options: Vec::new(),
            pre_booked: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>, location: impl Into<String>) -> Self {
        self.name = name.into();
        self.location = location.into();
        self
    }

    pub fn with_emi_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emi_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pre_booked(mut self, coords: impl IntoIterator<Item = Coord>) -> Self {
        self.pre_booked.extend(coords);
        self
    }

    pub fn total_units(&self) -> usize {
        self.units_wide.saturating_mul(self.units_tall)
    }

    pub fn build_grid(&self) -> Result<Grid> {
        self.build_grid_with(&LabelingScheme::default())
    }

    pub fn build_grid_with(&self, scheme: &LabelingScheme) -> Result<Grid> {
        Grid::with_labels(
            self.units_tall,
            self.units_wide,
            self.price_per_unit,
            self.emi_options.clone(),
            &self.pre_booked,
            scheme,
        )
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parse a JSON array of plot specs.
    pub fn catalog_from_json(raw: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(raw)?)
    }
}
