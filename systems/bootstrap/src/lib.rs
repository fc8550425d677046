#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that turns a freshly filled board into a match-free one.
//!
//! After [`Event::LevelStarted`] the system repeatedly asks the world to
//! redraw every cell that still belongs to a run. Once the board is stable it
//! applies the level seeding: forced tiles are placed and pinned, the board is
//! re-converged around them, and finally obstacle flags are scattered.

use std::collections::BTreeSet;

use butter_blast_core::{CellCoord, Command, Event, Grid, Seeding};
use butter_blast_system_matching::scan;
use tracing::{debug, warn};

/// Redraw passes attempted per phase before the board is accepted as is.
pub const CONVERGENCE_ATTEMPTS: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Filling,
    Placing,
    Flagging,
}

/// Pure system that drives board initialisation for a level.
#[derive(Debug)]
pub struct Bootstrap {
    attempt_limit: u32,
    attempts: u32,
    phase: Phase,
    pinned: BTreeSet<CellCoord>,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrap {
    /// Creates a bootstrap system with the default retry cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_attempt_limit(CONVERGENCE_ATTEMPTS)
    }

    /// Creates a bootstrap system that gives up after `attempt_limit` redraw passes.
    #[must_use]
    pub fn with_attempt_limit(attempt_limit: u32) -> Self {
        Self {
            attempt_limit,
            attempts: 0,
            phase: Phase::Idle,
            pinned: BTreeSet::new(),
        }
    }

    /// Reports whether the current board finished initialising.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Consumes world events and the current grid to emit initialisation commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        seeding: &Seeding,
        out: &mut Vec<Command>,
    ) {
        if events
            .iter()
            .any(|event| matches!(event, Event::LevelStarted { .. }))
        {
            self.phase = Phase::Filling;
            self.attempts = 0;
            self.pinned.clear();
        } else if self.phase == Phase::Idle
            || !events.iter().any(|event| {
                matches!(
                    event,
                    Event::CellsRedrawn { .. }
                        | Event::TilesPlaced { .. }
                        | Event::ObstaclesFlagged { .. }
                )
            })
        {
            return;
        }

        self.step(grid, seeding, out);
    }

    fn step(&mut self, grid: &Grid, seeding: &Seeding, out: &mut Vec<Command>) {
        // Spawn points are redrawn with the clear set: a solid block of one
        // kind has live runs but an empty clear set.
        let unstable: Vec<CellCoord> = scan(grid)
            .members()
            .into_iter()
            .filter(|cell| !self.pinned.contains(cell))
            .collect();

        if !unstable.is_empty() {
            if self.attempts < self.attempt_limit {
                self.attempts += 1;
                out.push(Command::RedrawCells { cells: unstable });
                return;
            }
            warn!(
                attempts = self.attempts,
                remaining = unstable.len(),
                "board did not converge, keeping remaining runs"
            );
        }

        self.advance(seeding, out);
    }

    fn advance(&mut self, seeding: &Seeding, out: &mut Vec<Command>) {
        if self.phase == Phase::Filling && !seeding.forced.is_empty() {
            self.phase = Phase::Placing;
            self.attempts = 0;
            self.pinned = seeding.forced.iter().map(|placement| placement.cell).collect();
            out.push(Command::PlaceTiles {
                placements: seeding.forced.clone(),
            });
            return;
        }

        if matches!(self.phase, Phase::Filling | Phase::Placing) && seeding.obstacles > 0 {
            self.phase = Phase::Flagging;
            out.push(Command::FlagObstacles {
                count: seeding.obstacles,
            });
            return;
        }

        debug!(redraws = self.attempts, "board initialised");
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use butter_blast_core::{Placement, Tile, TileKind};

    fn diagonal_grid() -> Grid {
        Grid::filled_with(|cell| {
            Tile::ordinary(TileKind::ALL[((cell.row() + cell.column()) % 4) as usize])
        })
    }

    #[test]
    fn stable_board_without_seeding_settles_immediately() {
        let mut bootstrap = Bootstrap::new();
        let mut out = Vec::new();

        bootstrap.handle(
            &[Event::LevelStarted { moves: 5 }],
            &diagonal_grid(),
            &Seeding::default(),
            &mut out,
        );

        assert!(out.is_empty());
        assert!(bootstrap.is_settled());
    }

    #[test]
    fn redraws_every_run_member() {
        let mut grid = diagonal_grid();
        for column in 0..4 {
            let _ = grid.set(CellCoord::new(1, column), Some(Tile::ordinary(TileKind::Herb)));
        }
        let mut bootstrap = Bootstrap::new();
        let mut out = Vec::new();

        bootstrap.handle(
            &[Event::LevelStarted { moves: 5 }],
            &grid,
            &Seeding::default(),
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::RedrawCells {
                cells: (0..4).map(|column| CellCoord::new(1, column)).collect()
            }]
        );
        assert!(!bootstrap.is_settled());
    }

    #[test]
    fn solid_block_is_redrawn_although_nothing_clears() {
        let mut grid = diagonal_grid();
        let block: Vec<CellCoord> = (0..3)
            .flat_map(|row| (0..3).map(move |column| CellCoord::new(row, column)))
            .collect();
        for cell in &block {
            let _ = grid.set(*cell, Some(Tile::ordinary(TileKind::Butter)));
        }
        assert!(scan(&grid).clear().is_empty());

        let mut bootstrap = Bootstrap::new();
        let mut out = Vec::new();
        bootstrap.handle(
            &[Event::LevelStarted { moves: 5 }],
            &grid,
            &Seeding::default(),
            &mut out,
        );

        let [Command::RedrawCells { cells }] = out.as_slice() else {
            panic!("expected a single redraw, got {out:?}");
        };
        let mut cells = cells.clone();
        cells.sort();
        assert_eq!(cells, block);
        assert!(!bootstrap.is_settled());
    }

    #[test]
    fn ignores_events_once_settled() {
        let mut bootstrap = Bootstrap::new();
        let mut out = Vec::new();
        let grid = Grid::filled_with(|_| Tile::ordinary(TileKind::Potato));

        bootstrap.handle(
            &[Event::CellsRedrawn { cells: Vec::new() }],
            &grid,
            &Seeding::default(),
            &mut out,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn seeding_places_then_flags() {
        let seeding = Seeding {
            forced: vec![Placement {
                cell: CellCoord::new(0, 0),
                kind: TileKind::Butter,
            }],
            obstacles: 3,
        };
        let grid = diagonal_grid();
        let mut bootstrap = Bootstrap::new();
        let mut out = Vec::new();

        bootstrap.handle(&[Event::LevelStarted { moves: 5 }], &grid, &seeding, &mut out);
        assert_eq!(
            out,
            vec![Command::PlaceTiles {
                placements: seeding.forced.clone()
            }]
        );

        out.clear();
        bootstrap.handle(
            &[Event::TilesPlaced {
                cells: vec![CellCoord::new(0, 0)],
            }],
            &grid,
            &seeding,
            &mut out,
        );
        assert_eq!(out, vec![Command::FlagObstacles { count: 3 }]);

        out.clear();
        bootstrap.handle(
            &[Event::ObstaclesFlagged { cells: Vec::new() }],
            &grid,
            &seeding,
            &mut out,
        );
        assert!(out.is_empty());
        assert!(bootstrap.is_settled());
    }
}
