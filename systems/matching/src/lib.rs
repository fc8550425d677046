#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure match detection over an immutable grid snapshot.
//!
//! [`scan`] walks every row left to right and every column top to bottom,
//! records maximal runs of three or more match-equal tiles, and derives the
//! cells where special tiles spawn: the middle of any run of four or more,
//! and the crossing cell of a horizontal and a vertical run. Spawn cells are
//! never part of the clear set.

use std::collections::{BTreeMap, BTreeSet};

use butter_blast_core::{CellCoord, Grid, Orientation, Run, Tile, GRID_COLUMNS, GRID_ROWS};

const MIN_RUN_LENGTH: usize = 3;
const SPAWN_RUN_LENGTH: usize = 4;
const INTERSECTION_UNION_THRESHOLD: usize = 4;

/// Runs, clear set and spawn points detected in a single grid snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scan {
    runs: Vec<Run>,
    clear: BTreeSet<CellCoord>,
    spawns: Vec<CellCoord>,
}

impl Scan {
    /// Runs in detection order: rows top to bottom, then columns left to right.
    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Number of detected runs.
    #[must_use]
    pub fn run_count(&self) -> u32 {
        u32::try_from(self.runs.len()).unwrap_or(u32::MAX)
    }

    /// Cells removed by the round, excluding spawn points.
    #[must_use]
    pub fn clear(&self) -> &BTreeSet<CellCoord> {
        &self.clear
    }

    /// Deduplicated spawn points in the order they were derived.
    #[must_use]
    pub fn spawns(&self) -> &[CellCoord] {
        &self.spawns
    }

    /// Every cell belonging to at least one run, spawn points included.
    #[must_use]
    pub fn members(&self) -> BTreeSet<CellCoord> {
        self.clear
            .iter()
            .chain(self.spawns.iter())
            .copied()
            .collect()
    }

    /// Reports whether the scan leaves nothing to clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clear.is_empty()
    }
}

/// Scans the grid for runs and derives the clear set and spawn points.
#[must_use]
pub fn scan(grid: &Grid) -> Scan {
    let mut runs = Vec::new();
    for row in 0..GRID_ROWS {
        collect_runs(
            grid,
            (0..GRID_COLUMNS).map(|column| CellCoord::new(row, column)),
            Orientation::Horizontal,
            &mut runs,
        );
    }
    for column in 0..GRID_COLUMNS {
        collect_runs(
            grid,
            (0..GRID_ROWS).map(|row| CellCoord::new(row, column)),
            Orientation::Vertical,
            &mut runs,
        );
    }

    let mut candidates: Vec<CellCoord> = runs
        .iter()
        .filter(|run| run.len() >= SPAWN_RUN_LENGTH)
        .map(|run| run.cells()[(run.len() - 1) / 2])
        .collect();
    candidates.extend(intersection_candidates(&runs));

    let mut spawns: Vec<CellCoord> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !spawns.contains(&candidate) {
            spawns.push(candidate);
        }
    }

    let clear = runs
        .iter()
        .flat_map(|run| run.cells().iter().copied())
        .filter(|cell| !spawns.contains(cell))
        .collect();

    Scan {
        runs,
        clear,
        spawns,
    }
}

fn collect_runs<I>(grid: &Grid, line: I, orientation: Orientation, out: &mut Vec<Run>)
where
    I: Iterator<Item = CellCoord>,
{
    let mut current: Vec<CellCoord> = Vec::new();
    let mut anchor: Option<Tile> = None;

    for cell in line {
        let tile = grid.tile(cell);
        let continues = match (anchor.as_ref(), tile.as_ref()) {
            (Some(anchor), Some(tile)) => anchor.matches(tile),
            _ => false,
        };

        if continues {
            current.push(cell);
        } else {
            close_run(&mut current, orientation, out);
            current.push(cell);
            anchor = tile;
        }
    }
    close_run(&mut current, orientation, out);
}

fn close_run(current: &mut Vec<CellCoord>, orientation: Orientation, out: &mut Vec<Run>) {
    if current.len() >= MIN_RUN_LENGTH {
        out.push(Run::new(orientation, std::mem::take(current)));
    } else {
        current.clear();
    }
}

fn intersection_candidates(runs: &[Run]) -> Vec<CellCoord> {
    let mut owners: BTreeMap<CellCoord, Vec<usize>> = BTreeMap::new();
    for (index, run) in runs.iter().enumerate() {
        for cell in run.cells() {
            owners.entry(*cell).or_default().push(index);
        }
    }

    owners
        .into_iter()
        .filter_map(|(cell, owning)| {
            let horizontal = owning
                .iter()
                .map(|index| &runs[*index])
                .find(|run| run.orientation() == Orientation::Horizontal)?;
            let vertical = owning
                .iter()
                .map(|index| &runs[*index])
                .find(|run| run.orientation() == Orientation::Vertical)?;
            let union: BTreeSet<CellCoord> = horizontal
                .cells()
                .iter()
                .chain(vertical.cells())
                .copied()
                .collect();
            (union.len() > INTERSECTION_UNION_THRESHOLD).then_some(cell)
        })
        .collect()
}
