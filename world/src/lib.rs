#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state management for Butter Blast.

use std::fmt;

use butter_blast_core::{
    ActionError, CellCoord, Command, Event, Grid, LevelDescriptor, RoundResult, SessionStats,
    SpecialKind, Tile, TileKind,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::trace;

/// Source of uniformly distributed indices used to draw tiles and pick cells.
pub trait DrawSource: fmt::Debug {
    /// Returns an index in `0..upper`. Callers never pass zero.
    fn next_index(&mut self, upper: usize) -> usize;
}

/// Deterministic draw source backed by a ChaCha8 stream.
#[derive(Clone, Debug)]
pub struct SeededDraw {
    rng: ChaCha8Rng,
}

impl SeededDraw {
    /// Creates a draw source seeded with the provided value.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a draw source whose stream is unique to the level name.
    #[must_use]
    pub fn for_level(seed: u64, level_name: &str) -> Self {
        Self::new(derive_level_seed(seed, level_name))
    }
}

impl DrawSource for SeededDraw {
    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }
}

/// Draw source that replays a fixed sequence of indices, wrapping around.
///
/// Each scripted value is reduced modulo the requested bound.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDraw {
    indices: Vec<usize>,
    cursor: usize,
}

impl ScriptedDraw {
    /// Creates a scripted source replaying the provided indices.
    #[must_use]
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices, cursor: 0 }
    }

    /// Number of indices handed out so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl DrawSource for ScriptedDraw {
    fn next_index(&mut self, upper: usize) -> usize {
        if self.indices.is_empty() {
            return 0;
        }
        let value = self.indices[self.cursor % self.indices.len()];
        self.cursor += 1;
        value % upper
    }
}

/// Represents the authoritative Butter Blast board and session counters.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    stats: SessionStats,
    palette: Vec<TileKind>,
    specials_enabled: bool,
    draw: Box<dyn DrawSource>,
}

impl World {
    /// Creates an empty world drawing tiles from a seeded stream.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_draw(Box::new(SeededDraw::new(seed)))
    }

    /// Creates an empty world drawing tiles from the provided source.
    #[must_use]
    pub fn with_draw(draw: Box<dyn DrawSource>) -> Self {
        Self {
            grid: Grid::new(),
            stats: SessionStats::default(),
            palette: TileKind::ALL.to_vec(),
            specials_enabled: false,
            draw,
        }
    }

    fn load_level(&mut self, level: LevelDescriptor) {
        // Unvalidated levels with an empty palette draw from every kind.
        self.palette = if level.palette.is_empty() {
            TileKind::ALL.to_vec()
        } else {
            level.palette
        };
        self.specials_enabled = level.specials_enabled;
        self.stats = SessionStats::with_moves(level.moves);

        let draw = self.draw.as_mut();
        let palette = &self.palette;
        self.grid = Grid::filled_with(|_| draw_tile(draw, palette));
    }

    fn redraw(&mut self, cells: Vec<CellCoord>) -> Vec<CellCoord> {
        let mut redrawn = Vec::with_capacity(cells.len());
        for cell in cells {
            if !self.grid.contains(cell) {
                continue;
            }
            let tile = draw_tile(self.draw.as_mut(), &self.palette);
            let _ = self.grid.set(cell, Some(tile));
            redrawn.push(cell);
        }
        redrawn
    }

    fn flag_obstacles(&mut self, count: u32) -> Vec<CellCoord> {
        let mut candidates: Vec<CellCoord> = self
            .grid
            .cells()
            .filter_map(|(cell, tile)| match tile {
                Some(tile) if !tile.is_special() && !tile.is_obstacle() => Some(cell),
                _ => None,
            })
            .collect();

        let wanted = usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(candidates.len());
        for index in 0..wanted {
            let pick = index + self.draw.next_index(candidates.len() - index);
            candidates.swap(index, pick);
        }
        candidates.truncate(wanted);
        candidates.sort();

        for cell in &candidates {
            if let Some(tile) = self.grid.tile(*cell) {
                let _ = self.grid.set(*cell, Some(tile.with_obstacle()));
            }
        }
        candidates
    }

    fn clear_cell(&mut self, cell: CellCoord, round: &mut RoundResult) {
        match self.grid.tile(cell) {
            None => {}
            Some(tile) if tile.is_obstacle() => {
                let _ = self.grid.set(cell, Some(tile.without_obstacle()));
                self.stats.record_loosened();
                round.loosened.push(cell);
            }
            Some(tile) => {
                let _ = self.grid.take(cell);
                self.stats.record_cleared(tile.kind());
                round.cleared.push(cell);
            }
        }
    }

    fn spawn_special(&mut self, cell: CellCoord) {
        assert!(
            self.grid.contains(cell),
            "spawn point {cell} lies outside the board"
        );
        let _ = self.grid.set(
            cell,
            Some(Tile::special(TileKind::Butter, SpecialKind::AreaBlast)),
        );
    }

    fn collapse(&mut self) -> Vec<CellCoord> {
        let draw = self.draw.as_mut();
        let palette = &self.palette;
        self.grid.collapse(|| draw_tile(draw, palette))
    }

    fn validate_swap(&self, a: CellCoord, b: CellCoord) -> Result<(), ActionError> {
        if self.stats.moves() == 0 {
            return Err(ActionError::OutOfMoves);
        }
        if !self.grid.contains(a) || !self.grid.contains(b) {
            return Err(ActionError::OutOfBounds);
        }
        if !a.is_adjacent(b) {
            return Err(ActionError::NotAdjacent);
        }
        Ok(())
    }

    fn validate_activation(&self, cell: CellCoord) -> Result<(), ActionError> {
        if self.stats.moves() == 0 {
            return Err(ActionError::OutOfMoves);
        }
        if !self.grid.contains(cell) {
            return Err(ActionError::OutOfBounds);
        }
        match self.grid.tile(cell) {
            Some(tile) if tile.is_special() => Ok(()),
            _ => Err(ActionError::NotSpecial),
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { level } => {
            world.load_level(level);
            out_events.push(Event::LevelStarted {
                moves: world.stats.moves(),
            });
        }
        Command::ReplaceGrid { grid } => {
            world.grid = grid;
            out_events.push(Event::GridReplaced);
        }
        Command::RedrawCells { cells } => {
            let cells = world.redraw(cells);
            out_events.push(Event::CellsRedrawn { cells });
        }
        Command::PlaceTiles { placements } => {
            let mut cells = Vec::with_capacity(placements.len());
            for placement in placements {
                if world.grid.contains(placement.cell) {
                    let _ = world
                        .grid
                        .set(placement.cell, Some(Tile::ordinary(placement.kind)));
                    cells.push(placement.cell);
                }
            }
            out_events.push(Event::TilesPlaced { cells });
        }
        Command::FlagObstacles { count } => {
            let cells = world.flag_obstacles(count);
            out_events.push(Event::ObstaclesFlagged { cells });
        }
        Command::SwapTiles { a, b } => match world.validate_swap(a, b) {
            Ok(()) => {
                let _ = world.grid.swap(a, b);
                out_events.push(Event::TilesSwapped { a, b });
            }
            Err(reason) => {
                trace!(%a, %b, %reason, "swap rejected");
                out_events.push(Event::ActionRejected { reason });
            }
        },
        Command::RevertSwap { a, b } => {
            let _ = world.grid.swap(a, b);
            out_events.push(Event::SwapReverted { a, b });
        }
        Command::ActivateTile { cell } => match world.validate_activation(cell) {
            Ok(()) => out_events.push(Event::BlastTriggered { center: cell }),
            Err(reason) => {
                trace!(%cell, %reason, "activation rejected");
                out_events.push(Event::ActionRejected { reason });
            }
        },
        Command::ConsumeMove => {
            if world.stats.consume_move() {
                out_events.push(Event::MoveConsumed {
                    remaining: world.stats.moves(),
                });
            }
        }
        Command::ResolveRound {
            runs,
            clear,
            spawns,
        } => {
            world.stats.record_matches(runs);
            let mut round = RoundResult {
                runs,
                ..RoundResult::default()
            };
            for cell in clear {
                world.clear_cell(cell, &mut round);
            }
            for cell in spawns {
                world.spawn_special(cell);
                round.spawned.push(cell);
            }
            let refilled = world.collapse();
            trace!(refilled = refilled.len(), "round collapsed");
            out_events.push(Event::RoundResolved { round });
        }
        Command::ClearArea { center, cells } => {
            world.stats.record_blast();
            let mut round = RoundResult::default();
            for cell in cells {
                world.clear_cell(cell, &mut round);
            }
            let refilled = world.collapse();
            trace!(refilled = refilled.len(), "area collapsed");
            out_events.push(Event::AreaCleared { center, round });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use butter_blast_core::{Grid, SessionStats, TileKind};

    use super::World;

    /// Provides read-only access to the authoritative board.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Provides read-only access to the session counters.
    #[must_use]
    pub fn stats(world: &World) -> &SessionStats {
        &world.stats
    }

    /// Tile kinds drawn when filling and refilling the board.
    #[must_use]
    pub fn palette(world: &World) -> &[TileKind] {
        &world.palette
    }

    /// Reports whether the active level spawns special tiles.
    #[must_use]
    pub fn specials_enabled(world: &World) -> bool {
        world.specials_enabled
    }
}

fn draw_tile(draw: &mut dyn DrawSource, palette: &[TileKind]) -> Tile {
    let index = draw.next_index(palette.len());
    Tile::ordinary(palette[index])
}

fn derive_level_seed(seed: u64, level_name: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(level_name.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}
