use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{GridError, Result};
use crate::grid::{Coord, Grid, UnitId};

/// Running cost of the active selection, recomputed from grid state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub selected_count: usize,
    pub total_cost: u64,
    /// Ordered by row, then column.
    pub selected_unit_ids: Vec<UnitId>,
}

impl SelectionSummary {
    pub fn is_empty(&self) -> bool {
        self.selected_count == 0
    }
}

/// Grid rebuilt from an authoritative snapshot plus the selections that could
/// not be carried over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rebased {
    pub grid: Grid,
    pub dropped: Vec<UnitId>,
}

/// Count, cost and row-major ids of the selected units.
pub fn summarize(grid: &Grid) -> SelectionSummary {
    let selected_unit_ids: Vec<UnitId> = grid.selected_units().map(|u| u.id().clone()).collect();
    let selected_count = selected_unit_ids.len();
    SelectionSummary {
        selected_count,
        // Construction guarantees len() * price fits in u64.
        total_cost: selected_count as u64 * grid.price_per_unit(),
        selected_unit_ids,
    }
}

/// Flip the selection of one unit. Unavailable units are left untouched and
/// the unchanged grid is returned.
pub fn toggle(grid: &Grid, row: usize, col: usize) -> Result<(Grid, SelectionSummary)> {
    let offset = grid.offset(row, col)?;
    let unit = grid.unit_at_offset(offset);
    if !unit.is_available() {
        return Ok((grid.clone(), summarize(grid)));
    }

    let selected = !unit.is_selected();
    let mut next = grid.clone();
    next.unit_mut(offset).set_selected(selected);
    let summary = summarize(&next);
    Ok((next, summary))
}

/// [`toggle`] addressed by [`Coord`].
pub fn toggle_at(grid: &Grid, coord: Coord) -> Result<(Grid, SelectionSummary)> {
    toggle(grid, coord.row, coord.col)
}

/// Drop every selection, keeping availability and bookings.
pub fn clear(grid: &Grid) -> Grid {
    let mut next = grid.clone();
    if grid.selected_units().next().is_some() {
        for unit in next.units_mut() {
            unit.set_selected(false);
        }
    }
    next
}

/// Remove a single unit from the selection. Units that are not selected are
/// left as they are.
pub fn deselect(grid: &Grid, id: &UnitId) -> Result<Grid> {
    let offset = grid.offset_of(id)?;
    let mut next = grid.clone();
    if grid.unit_at_offset(offset).is_selected() {
        next.unit_mut(offset).set_selected(false);
    }
    Ok(next)
}

/// Book every unit in `ids`.
///
/// All ids must be selected and available in `grid`; otherwise nothing is
/// booked and the stale ids are reported. Duplicates are collapsed.
pub fn finalize(grid: &Grid, ids: &[UnitId]) -> Result<Grid> {
    if ids.is_empty() {
        return Err(GridError::EmptySelection);
    }

    let offsets = ids
        .iter()
        .map(|id| grid.offset_of(id))
        .collect::<Result<BTreeSet<usize>>>()?;

    let stale: Vec<UnitId> = offsets
        .iter()
        .map(|&offset| grid.unit_at_offset(offset))
        .filter(|unit| !unit.is_selected() || !unit.is_available())
        .map(|unit| unit.id().clone())
        .collect();
    if !stale.is_empty() {
        return Err(GridError::StaleSelection { ids: stale });
    }

    let mut next = grid.clone();
    for offset in offsets {
        next.unit_mut(offset).book();
    }
    Ok(next)
}

/// Apply availability changes that happened outside this session: each unit
/// becomes unavailable and loses any selection. Fails without changes if a
/// coordinate is out of range.
pub fn mark_unavailable(grid: &Grid, coords: &[Coord]) -> Result<Grid> {
    let offsets = coords
        .iter()
        .map(|coord| grid.offset(coord.row, coord.col))
        .collect::<Result<Vec<usize>>>()?;

    let mut next = grid.clone();
    for offset in offsets {
        next.unit_mut(offset).withdraw();
    }
    Ok(next)
}

/// Rebuild `grid` on top of `authoritative`, keeping selections whose units
/// are still available there.
pub fn rebase(grid: &Grid, authoritative: &Grid) -> Result<Rebased> {
    if grid.dimensions() != authoritative.dimensions() {
        return Err(GridError::DimensionMismatch {
            expected: grid.dimensions(),
            actual: authoritative.dimensions(),
        });
    }

    let mut next = clear(authoritative);
    let mut dropped = Vec::new();
    for unit in grid.selected_units() {
        let offset = next.offset(unit.row(), unit.col())?;
        let target = next.unit_mut(offset);
        if target.is_available() {
            target.set_selected(true);
        } else {
            dropped.push(unit.id().clone());
        }
    }
    Ok(Rebased {
        grid: next,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::UnitStatus;

    const PRICE: u64 = 25_000;

    fn grid_5x5(pre_booked: &[Coord]) -> Grid {
        Grid::new(5, 5, PRICE, Vec::new(), pre_booked).unwrap()
    }

    fn select(grid: &Grid, coords: &[(usize, usize)]) -> Grid {
        coords.iter().fold(grid.clone(), |acc, &(row, col)| {
            toggle(&acc, row, col).unwrap().0
        })
    }

    #[test]
    fn two_toggles_sum_their_cost() {
        let grid = grid_5x5(&[]);
        let (grid, _) = toggle(&grid, 2, 3).unwrap();
        let (_, summary) = toggle(&grid, 0, 0).unwrap();
        assert_eq!(summary.selected_count, 2);
        assert_eq!(summary.total_cost, 50_000);
        assert_eq!(
            summary.selected_unit_ids,
            vec![UnitId::at(0, 0), UnitId::at(2, 3)]
        );
    }

    #[test]
    fn toggling_a_pre_booked_unit_is_a_no_op() {
        let grid = grid_5x5(&[Coord::new(0, 0)]);
        let (next, summary) = toggle(&grid, 0, 0).unwrap();
        assert_eq!(next, grid);
        assert_eq!(summary.selected_count, 0);
        assert_eq!(summary.total_cost, 0);
    }

    #[test]
    fn double_toggle_restores_the_pristine_grid() {
        let grid = grid_5x5(&[]);
        let (once, _) = toggle(&grid, 2, 3).unwrap();
        let (twice, summary) = toggle(&once, 2, 3).unwrap();
        assert_eq!(summary.selected_count, 0);
        assert_eq!(twice, grid);
    }

    #[test]
    fn toggle_is_reversible_for_every_available_unit() {
        let base = select(&grid_5x5(&[Coord::new(1, 1), Coord::new(4, 0)]), &[(0, 1), (3, 3)]);
        for row in 0..5 {
            for col in 0..5 {
                let (once, _) = toggle(&base, row, col).unwrap();
                let (twice, _) = toggle(&once, row, col).unwrap();
                assert_eq!(twice, base, "({row}, {col})");
            }
        }
    }

    #[test]
    fn toggle_touches_only_the_target_unit() {
        let grid = select(&grid_5x5(&[Coord::new(4, 4)]), &[(1, 1)]);
        let (next, _) = toggle(&grid, 2, 2).unwrap();
        for (before, after) in grid.units().zip(next.units()) {
            if before.coord() == Coord::new(2, 2) {
                assert_ne!(before, after);
            } else {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn toggle_never_aliases_the_input_snapshot() {
        let grid = grid_5x5(&[]);
        let (next, _) = toggle(&grid, 1, 1).unwrap();
        assert!(!grid.unit(1, 1).unwrap().is_selected());
        assert!(next.unit(1, 1).unwrap().is_selected());
        assert!(!next.shares_units_with(&grid));
    }

    #[test]
    fn toggle_rejects_out_of_range_coordinates() {
        let grid = grid_5x5(&[]);
        assert!(matches!(toggle(&grid, 5, 0), Err(GridError::OutOfBounds { .. })));
        assert!(matches!(toggle(&grid, 0, 5), Err(GridError::OutOfBounds { .. })));
        assert!(matches!(
            toggle(&grid, usize::MAX, usize::MAX),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn summary_is_idempotent_and_linear() {
        let grid = select(&grid_5x5(&[Coord::new(0, 0)]), &[(0, 1), (4, 4), (2, 2)]);
        let first = summarize(&grid);
        let second = summarize(&grid);
        assert_eq!(first, second);
        assert_eq!(first.total_cost, first.selected_count as u64 * PRICE);
        assert_eq!(
            first.selected_unit_ids,
            vec![UnitId::at(0, 1), UnitId::at(2, 2), UnitId::at(4, 4)]
        );
    }

    #[test]
    fn zero_price_grids_cost_nothing() {
        let grid = Grid::new(2, 2, 0, Vec::new(), &[]).unwrap();
        let (_, summary) = toggle(&grid, 1, 1).unwrap();
        assert_eq!(summary.selected_count, 1);
        assert_eq!(summary.total_cost, 0);
    }

    #[test]
    fn clear_keeps_bookings() {
        let grid = select(&grid_5x5(&[Coord::new(3, 3)]), &[(0, 0), (1, 2)]);
        let cleared = clear(&grid);
        assert!(summarize(&cleared).is_empty());
        assert_eq!(cleared.unit(3, 3).unwrap().status(), UnitStatus::Booked);
        assert_eq!(cleared.counts().available, 24);
        // the source snapshot still has its selection
        assert_eq!(summarize(&grid).selected_count, 2);
    }

    #[test]
    fn deselect_removes_one_unit() {
        let grid = select(&grid_5x5(&[]), &[(0, 0), (1, 2)]);
        let next = deselect(&grid, &UnitId::at(0, 0)).unwrap();
        assert_eq!(summarize(&next).selected_unit_ids, vec![UnitId::at(1, 2)]);

        let unchanged = deselect(&next, &UnitId::at(0, 0)).unwrap();
        assert_eq!(unchanged, next);
        assert!(matches!(
            deselect(&grid, &UnitId::from("R7C7")),
            Err(GridError::UnknownUnit(_))
        ));
    }

    #[test]
    fn finalize_books_the_batch() {
        let grid = select(&grid_5x5(&[]), &[(1, 1), (1, 2)]);
        let ids = summarize(&grid).selected_unit_ids;
        let booked = finalize(&grid, &ids).unwrap();

        for col in [1, 2] {
            let unit = booked.unit(1, col).unwrap();
            assert!(unit.is_booked());
            assert!(!unit.is_available());
            assert!(!unit.is_selected());
        }
        let (after, summary) = toggle(&booked, 1, 1).unwrap();
        assert_eq!(after, booked);
        assert!(summary.is_empty());
    }

    #[test]
    fn finalize_fails_when_a_unit_was_taken_elsewhere() {
        let grid = select(&grid_5x5(&[]), &[(1, 1)]);
        let taken = mark_unavailable(&grid, &[Coord::new(1, 1)]).unwrap();
        let unit = taken.unit(1, 1).unwrap();
        assert!(!unit.is_selected());
        assert!(!unit.is_booked());

        let err = finalize(&taken, &[UnitId::at(1, 1)]).unwrap_err();
        assert!(matches!(err, GridError::StaleSelection { ref ids } if ids == &[UnitId::at(1, 1)]));
        let unit = taken.unit(1, 1).unwrap();
        assert!(!unit.is_selected());
        assert!(!unit.is_booked());
    }

    #[test]
    fn finalize_is_all_or_nothing() {
        let grid = select(&grid_5x5(&[]), &[(0, 0), (0, 1), (0, 2)]);
        let taken = mark_unavailable(&grid, &[Coord::new(0, 1)]).unwrap();
        let ids = vec![UnitId::at(0, 0), UnitId::at(0, 1), UnitId::at(0, 2)];

        let err = finalize(&taken, &ids).unwrap_err();
        match err {
            GridError::StaleSelection { ids } => assert_eq!(ids, vec![UnitId::at(0, 1)]),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(taken.counts().booked, 0);
        assert!(taken.unit(0, 0).unwrap().is_selected());
        assert!(taken.unit(0, 2).unwrap().is_selected());
    }

    #[test]
    fn finalize_rejects_unselected_unknown_and_empty_batches() {
        let grid = select(&grid_5x5(&[]), &[(0, 0)]);
        assert!(matches!(
            finalize(&grid, &[UnitId::at(0, 0), UnitId::at(3, 3)]),
            Err(GridError::StaleSelection { .. })
        ));
        assert!(matches!(
            finalize(&grid, &[UnitId::from("plot-9")]),
            Err(GridError::UnknownUnit(_))
        ));
        assert!(matches!(finalize(&grid, &[]), Err(GridError::EmptySelection)));
    }

    #[test]
    fn finalize_collapses_duplicate_ids() {
        let grid = select(&grid_5x5(&[]), &[(2, 2)]);
        let booked = finalize(&grid, &[UnitId::at(2, 2), UnitId::at(2, 2)]).unwrap();
        assert_eq!(booked.counts().booked, 1);
    }

    #[test]
    fn mark_unavailable_is_atomic_on_bad_input() {
        let grid = grid_5x5(&[]);
        assert!(matches!(
            mark_unavailable(&grid, &[Coord::new(0, 0), Coord::new(9, 9)]),
            Err(GridError::OutOfBounds { .. })
        ));
        assert_eq!(grid.counts().available, 25);
    }

    #[test]
    fn rebase_keeps_selections_that_survive() {
        let session = select(&grid_5x5(&[]), &[(0, 0), (2, 2)]);
        let authoritative = grid_5x5(&[Coord::new(2, 2), Coord::new(4, 4)]);

        let Rebased { grid, dropped } = rebase(&session, &authoritative).unwrap();
        assert_eq!(dropped, vec![UnitId::at(2, 2)]);
        assert!(grid.unit(0, 0).unwrap().is_selected());
        assert_eq!(grid.unit(2, 2).unwrap().status(), UnitStatus::Booked);
        assert_eq!(grid.unit(4, 4).unwrap().status(), UnitStatus::Booked);
        assert_eq!(grid.fingerprint(), authoritative.fingerprint());
    }

    #[test]
    fn rebase_requires_matching_dimensions() {
        let session = grid_5x5(&[]);
        let other = Grid::new(4, 5, PRICE, Vec::new(), &[]).unwrap();
        assert!(matches!(
            rebase(&session, &other),
            Err(GridError::DimensionMismatch { .. })
        ));
    }
}
