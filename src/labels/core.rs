//! Deterministic unit labels and synthetic survey metadata.
//!
//! Rows map onto a preset sequence (`A`, `B`, ...) and columns onto 1-based
//! numbers. Coordinates past the presets fall back to `R<n>` / `C<n>` where
//! `n` is the 1-based index, so every in-range coordinate has a label and
//! every canonical label decodes back to exactly one coordinate.
//!
//! # Example
//! ```
//! use sqft_grid::labels::{Facing, LabelingScheme};
//!
//! let scheme = LabelingScheme::default();
//! assert_eq!(scheme.label(0, 2), "A3");
//! assert_eq!(scheme.label(27, 11), "R28C12");
//!
//! let meta = scheme.describe("B2")?;
//! assert_eq!(meta.facing, Facing::North);
//! assert_eq!(meta.area_sqft, 31 * 41);
//! # Ok::<(), sqft_grid::GridError>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::grid::Coord;

const BASE_DEPTH_FT: u64 = 30;
const BASE_FRONTAGE_FT: u64 = 40;
const DEFAULT_COL_PRESETS: usize = 10;

/// Compass direction a unit faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    East,
    West,
    North,
    South,
}

impl Facing {
    const CYCLE: [Facing; 4] = [Facing::East, Facing::West, Facing::North, Facing::South];

    fn for_offset(row: usize, col: usize) -> Self {
        let len = Self::CYCLE.len();
        Self::CYCLE[(row % len + col % len) % len]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::East => "East",
            Facing::West => "West",
            Facing::North => "North",
            Facing::South => "South",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cosmetic metadata attached to a unit label. Never affects pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub dimension: String,
    pub facing: Facing,
    pub area_sqft: u64,
}

/// Full display record for one coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLabel {
    pub row_label: String,
    pub col_label: String,
    pub dimension: String,
    pub facing: Facing,
    pub area_sqft: u64,
}

impl UnitLabel {
    /// Combined label, e.g. `C4`.
    pub fn text(&self) -> String {
        format!("{}{}", self.row_label, self.col_label)
    }
}

/// Mapping between coordinates and human-readable unit labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelingScheme {
    rows: Vec<String>,
    cols: Vec<String>,
}

impl Default for LabelingScheme {
    fn default() -> Self {
        let rows = ('A'..='Z').map(|c| c.to_string()).collect();
        let cols = (1..=DEFAULT_COL_PRESETS).map(|n| n.to_string()).collect();
        Self { rows, cols }
    }
}

impl LabelingScheme {
    /// Build a scheme from explicit presets. Preset labels must not collide
    /// with the `R<n>` / `C<n>` fallbacks or with each other, otherwise
    /// [`locate`](Self::locate) may resolve a label to the first match only.
    pub fn new<R, C>(rows: R, cols: C) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
            cols: cols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn row_label(&self, row: usize) -> String {
        self.rows
            .get(row)
            .cloned()
            .unwrap_or_else(|| format!("R{}", row + 1))
    }

    pub fn col_label(&self, col: usize) -> String {
        self.cols
            .get(col)
            .cloned()
            .unwrap_or_else(|| format!("C{}", col + 1))
    }

    /// Canonical label such as `C4`, or `R28C12` past the presets.
    pub fn label(&self, row: usize, col: usize) -> String {
        format!("{}{}", self.row_label(row), self.col_label(col))
    }

    /// Decode a label produced by [`label`](Self::label).
    ///
    /// Only canonical labels resolve: `AC5` is rejected because column 4 is
    /// spelled `5`, and `R027C1` because the fallback never pads.
    pub fn locate(&self, label: &str) -> Result<Coord> {
        label
            .char_indices()
            .skip(1)
            .map(|(idx, _)| label.split_at(idx))
            .find_map(|(row_part, col_part)| {
                let row = decode(row_part, &self.rows, 'R')?;
                let col = decode(col_part, &self.cols, 'C')?;
                Some(Coord::new(row, col))
            })
            .ok_or_else(|| GridError::UnknownLabel(label.to_string()))
    }

    /// Metadata for a canonical label; see [`locate`](Self::locate).
    pub fn describe(&self, label: &str) -> Result<UnitMetadata> {
        let coord = self.locate(label)?;
        Ok(self.describe_at(coord))
    }

    /// Survey metadata for any coordinate. Sizes saturate at `u64::MAX`
    /// instead of overflowing for coordinates far past any real plot.
    pub fn describe_at(&self, coord: Coord) -> UnitMetadata {
        let depth = extent(BASE_DEPTH_FT, coord.row);
        let frontage = extent(BASE_FRONTAGE_FT, coord.col);
        UnitMetadata {
            dimension: format!("{depth} x {frontage} ft"),
            facing: Facing::for_offset(coord.row, coord.col),
            area_sqft: depth.saturating_mul(frontage),
        }
    }

    pub fn unit_label(&self, coord: Coord) -> UnitLabel {
        let UnitMetadata {
            dimension,
            facing,
            area_sqft,
        } = self.describe_at(coord);
        UnitLabel {
            row_label: self.row_label(coord.row),
            col_label: self.col_label(coord.col),
            dimension,
            facing,
            area_sqft,
        }
    }
}

fn extent(base: u64, index: usize) -> u64 {
    u64::try_from(index).map_or(u64::MAX, |index| base.saturating_add(index))
}

fn decode(part: &str, presets: &[String], prefix: char) -> Option<usize> {
    if let Some(idx) = presets.iter().position(|preset| preset == part) {
        return Some(idx);
    }
    let digits = part.strip_prefix(prefix)?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let index = digits.parse::<usize>().ok()?.checked_sub(1)?;
    // Indices covered by a preset are only reachable through the preset.
    (index >= presets.len()).then_some(index)
}
