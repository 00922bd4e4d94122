use thiserror::Error;

use crate::grid::UnitId;

/// Unified result type for the SqFt grid crate.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors surfaced by grid construction, selection and checkout.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid must be at least 1x1, got {height}x{width}")]
    InvalidDimensions { height: usize, width: usize },
    #[error("pre-booked coordinate ({row}, {col}) lies outside a {height}x{width} grid")]
    InvalidCoordinate {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },
    #[error("coordinate ({row}, {col}) is out of bounds for a {height}x{width} grid")]
    OutOfBounds {
        row: i64,
        col: i64,
        height: usize,
        width: usize,
    },
    #[error("selection is stale for units {}", join_ids(.ids))]
    StaleSelection { ids: Vec<UnitId> },
    #[error("unit `{0}` does not exist in this grid")]
    UnknownUnit(UnitId),
    #[error("at least one unit must be selected")]
    EmptySelection,
    #[error("total price of a {units}-unit grid at {price_per_unit} per unit overflows")]
    CostOverflow { units: usize, price_per_unit: u64 },
    #[error("grid dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("label `{0}` does not name a unit")]
    UnknownLabel(String),
    #[error("plot `{0}` not found")]
    PlotNotFound(String),
    #[error("plot `{0}` is already registered")]
    DuplicatePlot(String),
    #[error("plot catalog error: {0}")]
    Catalog(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GridError {
    /// Only lost booking races reach the buyer; everything else is an integration bug.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, GridError::StaleSelection { .. })
    }

    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            GridError::StaleSelection { .. } => {
                Some("this unit was just booked by someone else, please reselect")
            }
            _ => None,
        }
    }

    pub(crate) fn out_of_bounds(row: i64, col: i64, height: usize, width: usize) -> Self {
        GridError::OutOfBounds {
            row,
            col,
            height,
            width,
        }
    }
}

fn join_ids(ids: &[UnitId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
