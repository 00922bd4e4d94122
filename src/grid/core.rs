//! Rectangular grid of individually priced land units.
//!
//! A [`Grid`] is an immutable snapshot: operations in [`crate::selection`]
//! take a grid by reference and hand back a new one. Unit storage is shared
//! behind an `Arc` and cloned on the first write, so earlier snapshots held by
//! display code never observe later mutations.
//!
//! # Example
//! ```
//! use sqft_grid::grid::{Coord, Grid, UnitStatus};
//!
//! let grid = Grid::new(5, 5, 25_000, vec!["6 months @ 7% interest".into()], &[Coord::new(0, 0)])?;
//! assert_eq!(grid.unit(0, 0)?.status(), UnitStatus::Booked);
//! assert_eq!(grid.unit(2, 3)?.label(), "C4");
//! # Ok::<(), sqft_grid::GridError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::labels::LabelingScheme;

/// Zero-based `(row, col)` position inside a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

/// Stable unit identity, unique within one grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub fn at(row: usize, col: usize) -> Self {
        Self(format!("R{row}C{col}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Visual state of a unit as seen by display code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Available,
    Selected,
    Booked,
    Unavailable,
}

/// One sellable cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    id: UnitId,
    row: usize,
    col: usize,
    label: String,
    is_available: bool,
    is_selected: bool,
    is_booked: bool,
}

impl Unit {
    fn new(coord: Coord, label: String, pre_booked: bool) -> Self {
        Self {
            id: UnitId::at(coord.row, coord.col),
            row: coord.row,
            col: coord.col,
            label,
            is_available: !pre_booked,
            is_selected: false,
            is_booked: pre_booked,
        }
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub fn is_booked(&self) -> bool {
        self.is_booked
    }

    /// Collapsed view of the availability, selection and booking flags.
    pub fn status(&self) -> UnitStatus {
        if self.is_booked {
            UnitStatus::Booked
        } else if self.is_selected {
            UnitStatus::Selected
        } else if self.is_available {
            UnitStatus::Available
        } else {
            UnitStatus::Unavailable
        }
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected && self.is_available;
    }

    pub(crate) fn book(&mut self) {
        self.is_booked = true;
        self.is_available = false;
        self.is_selected = false;
    }

    pub(crate) fn withdraw(&mut self) {
        self.is_available = false;
        self.is_selected = false;
    }
}

/// Tally of units per [`UnitStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GridCounts {
    pub available: usize,
    pub selected: usize,
    pub booked: usize,
    pub unavailable: usize,
}

/// `height x width` snapshot of units plus plot-level pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    height: usize,
    width: usize,
    price_per_unit: u64,
    emi_options: Arc<[String]>,
    units: Arc<Vec<Unit>>,
    index: Arc<HashMap<UnitId, usize>>,
}

impl Grid {
    /// Build a grid labelled with the default [`LabelingScheme`].
    pub fn new(
        height: usize,
        width: usize,
        price_per_unit: u64,
        emi_options: Vec<String>,
        pre_booked: &[Coord],
    ) -> Result<Self> {
        Self::with_labels(
            height,
            width,
            price_per_unit,
            emi_options,
            pre_booked,
            &LabelingScheme::default(),
        )
    }

    pub fn with_labels(
        height: usize,
        width: usize,
        price_per_unit: u64,
        emi_options: Vec<String>,
        pre_booked: &[Coord],
        scheme: &LabelingScheme,
    ) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(GridError::InvalidDimensions { height, width });
        }
        let total = height
            .checked_mul(width)
            .ok_or(GridError::InvalidDimensions { height, width })?;
        (total as u64)
            .checked_mul(price_per_unit)
            .ok_or(GridError::CostOverflow {
                units: total,
                price_per_unit,
            })?;

        let mut booked = vec![false; total];
        for coord in pre_booked {
            if coord.row >= height || coord.col >= width {
                return Err(GridError::InvalidCoordinate {
                    row: coord.row,
                    col: coord.col,
                    height,
                    width,
                });
            }
            booked[coord.row * width + coord.col] = true;
        }

        let mut units = Vec::with_capacity(total);
        let mut index = HashMap::with_capacity(total);
        for row in 0..height {
            for col in 0..width {
                let offset = row * width + col;
                let unit = Unit::new(Coord::new(row, col), scheme.label(row, col), booked[offset]);
                index.insert(unit.id.clone(), offset);
                units.push(unit);
            }
        }

        Ok(Self {
            height,
            width,
            price_per_unit,
            emi_options: emi_options.into(),
            units: Arc::new(units),
            index: Arc::new(index),
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn price_per_unit(&self) -> u64 {
        self.price_per_unit
    }

    pub fn emi_options(&self) -> &[String] {
        &self.emi_options
    }

    pub fn unit(&self, row: usize, col: usize) -> Result<&Unit> {
        let offset = self.offset(row, col)?;
        Ok(&self.units[offset])
    }

    pub fn unit_at(&self, coord: Coord) -> Result<&Unit> {
        self.unit(coord.row, coord.col)
    }

    pub fn unit_by_id(&self, id: &UnitId) -> Result<&Unit> {
        let offset = self.offset_of(id)?;
        Ok(&self.units[offset])
    }

    /// Validate signed coordinates coming from a UI layer.
    pub fn resolve(&self, row: i64, col: i64) -> Result<Coord> {
        let in_range = |value: i64, limit: usize| {
            usize::try_from(value).ok().filter(|value| *value < limit)
        };
        match (in_range(row, self.height), in_range(col, self.width)) {
            (Some(row), Some(col)) => Ok(Coord::new(row, col)),
            _ => Err(GridError::out_of_bounds(row, col, self.height, self.width)),
        }
    }

    /// Units in row-major order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Unit]> + '_ {
        self.units.chunks(self.width)
    }

    pub fn selected_units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(|unit| unit.is_selected)
    }

    pub fn counts(&self) -> GridCounts {
        self.units
            .iter()
            .fold(GridCounts::default(), |mut counts, unit| {
                match unit.status() {
                    UnitStatus::Available => counts.available += 1,
                    UnitStatus::Selected => counts.selected += 1,
                    UnitStatus::Booked => counts.booked += 1,
                    UnitStatus::Unavailable => counts.unavailable += 1,
                }
                counts
            })
    }

    /// Digest of availability and booking state. Selection is excluded so two
    /// sessions over the same plot agree whenever the authoritative state does.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.height as u64).to_le_bytes());
        hasher.update(&(self.width as u64).to_le_bytes());
        hasher.update(&self.price_per_unit.to_le_bytes());
        for unit in self.units.iter() {
            hasher.update(&[unit.is_available as u8, unit.is_booked as u8]);
        }
        hasher.finalize()
    }

    pub(crate) fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.height || col >= self.width {
            return Err(GridError::out_of_bounds(
                signed(row),
                signed(col),
                self.height,
                self.width,
            ));
        }
        Ok(row * self.width + col)
    }

    pub(crate) fn offset_of(&self, id: &UnitId) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GridError::UnknownUnit(id.clone()))
    }

    pub(crate) fn unit_at_offset(&self, offset: usize) -> &Unit {
        &self.units[offset]
    }

    pub(crate) fn unit_mut(&mut self, offset: usize) -> &mut Unit {
        &mut Arc::make_mut(&mut self.units)[offset]
    }

    pub(crate) fn units_mut(&mut self) -> &mut [Unit] {
        Arc::make_mut(&mut self.units).as_mut_slice()
    }

    pub(crate) fn shares_units_with(&self, other: &Grid) -> bool {
        Arc::ptr_eq(&self.units, &other.units)
    }
}

fn signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emi() -> Vec<String> {
        vec![
            "3 months @ 5% interest".to_string(),
            "6 months @ 7% interest".to_string(),
        ]
    }

    #[test]
    fn construction_marks_pre_booked_units() {
        let grid = Grid::new(3, 4, 100, emi(), &[Coord::new(0, 0), Coord::new(2, 3)]).unwrap();
        assert_eq!(grid.dimensions(), (3, 4));
        assert_eq!(grid.len(), 12);

        let corner = grid.unit(2, 3).unwrap();
        assert!(corner.is_booked());
        assert!(!corner.is_available());
        assert!(!corner.is_selected());

        let free = grid.unit(1, 1).unwrap();
        assert!(free.is_available());
        assert!(!free.is_booked());
        assert_eq!(free.status(), UnitStatus::Available);

        let counts = grid.counts();
        assert_eq!(counts.available, 10);
        assert_eq!(counts.booked, 2);
    }

    #[test]
    fn every_coordinate_has_exactly_one_unit() {
        let grid = Grid::new(4, 6, 1, Vec::new(), &[]).unwrap();
        for row in 0..4 {
            for col in 0..6 {
                let unit = grid.unit(row, col).unwrap();
                assert_eq!(unit.coord(), Coord::new(row, col));
                assert_eq!(unit.id(), &UnitId::at(row, col));
            }
        }
        let rows: Vec<_> = grid.rows().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.len() == 6));
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert!(matches!(
            Grid::new(0, 5, 10, Vec::new(), &[]),
            Err(GridError::InvalidDimensions { height: 0, width: 5 })
        ));
        assert!(matches!(
            Grid::new(5, 0, 10, Vec::new(), &[]),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn out_of_bounds_pre_booking_is_a_construction_error() {
        let err = Grid::new(5, 5, 10, Vec::new(), &[Coord::new(5, 0)]).unwrap_err();
        assert!(matches!(
            err,
            GridError::InvalidCoordinate { row: 5, col: 0, .. }
        ));
    }

    #[test]
    fn duplicate_pre_bookings_are_harmless() {
        let grid = Grid::new(2, 2, 10, Vec::new(), &[Coord::new(1, 1), Coord::new(1, 1)]).unwrap();
        assert_eq!(grid.counts().booked, 1);
    }

    #[test]
    fn overflowing_price_is_rejected() {
        let err = Grid::new(2, 2, u64::MAX / 2, Vec::new(), &[]).unwrap_err();
        assert!(matches!(err, GridError::CostOverflow { units: 4, .. }));
    }

    #[test]
    fn lookups_reject_out_of_range_coordinates() {
        let grid = Grid::new(5, 5, 10, Vec::new(), &[]).unwrap();
        assert!(matches!(grid.unit(5, 0), Err(GridError::OutOfBounds { row: 5, .. })));
        assert!(matches!(grid.unit(0, 5), Err(GridError::OutOfBounds { col: 5, .. })));
        assert!(matches!(grid.resolve(-1, 0), Err(GridError::OutOfBounds { row: -1, .. })));
        assert!(matches!(grid.resolve(0, -3), Err(GridError::OutOfBounds { col: -3, .. })));
        assert_eq!(grid.resolve(4, 4).unwrap(), Coord::new(4, 4));
    }

    #[test]
    fn units_resolve_by_id() {
        let grid = Grid::new(3, 3, 10, Vec::new(), &[]).unwrap();
        let unit = grid.unit_by_id(&UnitId::from("R2C1")).unwrap();
        assert_eq!(unit.coord(), Coord::new(2, 1));
        assert!(matches!(
            grid.unit_by_id(&UnitId::from("R9C9")),
            Err(GridError::UnknownUnit(_))
        ));
    }

    #[test]
    fn custom_scheme_labels_units() {
        let scheme = LabelingScheme::new(["North", "South"], ["-1", "-2"]);
        let grid = Grid::with_labels(2, 2, 1, Vec::new(), &[], &scheme).unwrap();
        assert_eq!(grid.unit(1, 0).unwrap().label(), "South-1");
    }

    #[test]
    fn fingerprint_ignores_selection() {
        let grid = Grid::new(3, 3, 10, emi(), &[Coord::new(1, 1)]).unwrap();
        let mut selected = grid.clone();
        selected.unit_mut(0).set_selected(true);
        assert_eq!(grid.fingerprint(), selected.fingerprint());

        let mut withdrawn = grid.clone();
        withdrawn.unit_mut(0).withdraw();
        assert_ne!(grid.fingerprint(), withdrawn.fingerprint());
    }

    #[test]
    fn writes_do_not_leak_into_clones() {
        let grid = Grid::new(2, 2, 10, Vec::new(), &[]).unwrap();
        let mut copy = grid.clone();
        assert!(copy.shares_units_with(&grid));
        copy.unit_mut(3).set_selected(true);
        assert!(!copy.shares_units_with(&grid));
        assert!(!grid.unit(1, 1).unwrap().is_selected());
        assert!(copy.unit(1, 1).unwrap().is_selected());
    }

    #[test]
    fn grids_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Grid>();
    }

    #[test]
    fn emi_options_keep_their_order() {
        let grid = Grid::new(1, 1, 10, emi(), &[]).unwrap();
        assert_eq!(grid.emi_options()[0], "3 months @ 5% interest");
        assert_eq!(grid.emi_options().len(), 2);
    }
}
