#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Engine facade that wires the world and the systems into playable turns.
//!
//! A [`Session`] owns the authoritative world for one level. Every public
//! operation submits a single command and then pumps events through the
//! bootstrap, blast and cascade systems until none of them emits further
//! commands, so each call returns with the board fully resolved.

use std::collections::BTreeMap;

use butter_blast_core::{
    ActionError, CellCoord, Command, Event, Grid, LevelDescriptor, LevelError, LevelStatus,
    RoundResult, SessionStats, StatKey, Tile, TileKind,
};
use butter_blast_system_blast::Blast;
use butter_blast_system_bootstrap::Bootstrap;
use butter_blast_system_cascade::{Cascade, CascadeError};
use butter_blast_system_matching::scan;
use butter_blast_world::{self as world, query, DrawSource, SeededDraw, World};
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors surfaced by session operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The level descriptor failed validation.
    #[error("invalid level: {0}")]
    InvalidLevel(#[from] LevelError),
    /// The world refused the requested action.
    #[error("action rejected: {0}")]
    Rejected(ActionError),
    /// A cascade violated its invariants and was aborted.
    #[error(transparent)]
    Cascade(#[from] CascadeError),
    /// An earlier cascade fault left the board in an undefined state.
    #[error("session is faulted; reinitialise the board")]
    Faulted,
}

/// Result of a swap request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Whether the swap produced a match and was kept.
    pub matched: bool,
    /// Rounds resolved by the cascade, in order.
    pub rounds: Vec<RoundResult>,
}

/// Result of an area blast activation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlastOutcome {
    /// The blast clear followed by any cascade rounds it triggered.
    pub rounds: Vec<RoundResult>,
}

#[derive(Debug, Default)]
struct TurnReport {
    rounds: Vec<RoundResult>,
    rejected: Option<ActionError>,
    reverted: bool,
}

impl TurnReport {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::RoundResolved { round } => {
                    debug!(
                        runs = round.runs,
                        cleared = round.cleared.len(),
                        spawned = round.spawned.len(),
                        loosened = round.loosened.len(),
                        "round resolved"
                    );
                    self.rounds.push(round.clone());
                }
                Event::AreaCleared { center, round } => {
                    debug!(%center, cleared = round.cleared.len(), "area cleared");
                    self.rounds.push(round.clone());
                }
                Event::ActionRejected { reason } => {
                    debug!(%reason, "action rejected");
                    self.rejected = Some(*reason);
                }
                Event::SwapReverted { .. } => self.reverted = true,
                _ => {}
            }
        }
    }
}

/// Single-level play session owning the board, statistics and systems.
#[derive(Debug)]
pub struct Session {
    world: World,
    level: LevelDescriptor,
    cascade: Cascade,
    blast: Blast,
    bootstrap: Bootstrap,
    faulted: bool,
}

impl Session {
    /// Validates the level and initialises a board drawn from `seed`.
    ///
    /// The draw stream is derived from both the seed and the level name, so
    /// different levels played with the same seed start from different boards.
    pub fn new(level: LevelDescriptor, seed: u64) -> Result<Self, SessionError> {
        let draw = SeededDraw::for_level(seed, &level.name);
        Self::with_draw(level, Box::new(draw))
    }

    /// Validates the level and initialises a board using the provided draw source.
    pub fn with_draw(
        level: LevelDescriptor,
        draw: Box<dyn DrawSource>,
    ) -> Result<Self, SessionError> {
        validate_level(&level)?;
        let mut session = Self {
            world: World::with_draw(draw),
            level,
            cascade: Cascade::new(),
            blast: Blast::new(),
            bootstrap: Bootstrap::new(),
            faulted: false,
        };
        let _ = session.init_board()?;
        Ok(session)
    }

    /// Resets statistics and rebuilds a match-free board for the level.
    ///
    /// This is the only operation that clears a fault.
    pub fn init_board(&mut self) -> Result<&Grid, SessionError> {
        self.faulted = false;
        info!(
            level = %self.level.name,
            moves = self.level.moves,
            palette = self.level.palette.len(),
            "starting level"
        );
        let _ = self.run(Command::LoadLevel {
            level: self.level.clone(),
        })?;
        Ok(query::grid(&self.world))
    }

    /// Replaces the board with a supplied layout, keeping statistics.
    ///
    /// The layout is taken as is; runs already present are not resolved.
    pub fn load_layout(&mut self, grid: Grid) -> Result<(), SessionError> {
        let _ = self.run(Command::ReplaceGrid { grid })?;
        Ok(())
    }

    /// Swaps two adjacent tiles and resolves the resulting cascade.
    ///
    /// A swap that produces no match is reverted and costs no move.
    pub fn apply_swap(&mut self, a: CellCoord, b: CellCoord) -> Result<SwapOutcome, SessionError> {
        let report = self.run(Command::SwapTiles { a, b })?;
        if let Some(reason) = report.rejected {
            return Err(SessionError::Rejected(reason));
        }
        Ok(SwapOutcome {
            matched: !report.reverted,
            rounds: report.rounds,
        })
    }

    /// Activates the special tile at `center` and resolves the resulting cascade.
    pub fn apply_area_blast(&mut self, center: CellCoord) -> Result<BlastOutcome, SessionError> {
        let report = self.run(Command::ActivateTile { cell: center })?;
        if let Some(reason) = report.rejected {
            return Err(SessionError::Rejected(reason));
        }
        Ok(BlastOutcome {
            rounds: report.rounds,
        })
    }

    /// Current board.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        query::grid(&self.world)
    }

    /// Counters accumulated since the board was initialised.
    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        query::stats(&self.world)
    }

    /// Current values of the statistics referenced by the level goals.
    #[must_use]
    pub fn goal_progress(&self) -> BTreeMap<StatKey, u32> {
        let stats = self.stats();
        self.level
            .goals
            .iter()
            .map(|goal| (goal.stat, stats.get(goal.stat)))
            .collect()
    }

    /// Progress of the level derived from goals and remaining moves.
    #[must_use]
    pub fn status(&self) -> LevelStatus {
        self.level.status(self.stats())
    }

    /// Level being played.
    #[must_use]
    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }

    /// Reports whether a cascade fault blocks further actions.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    fn run(&mut self, command: Command) -> Result<TurnReport, SessionError> {
        if self.faulted {
            return Err(SessionError::Faulted);
        }

        let mut report = TurnReport::default();
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        loop {
            report.record(&events);

            let grid = query::grid(&self.world);
            let mut commands = Vec::new();
            self.bootstrap
                .handle(&events, grid, &self.level.seeding, &mut commands);
            self.blast.handle(&events, &mut commands);
            if let Err(fault) = self.cascade.handle(
                &events,
                grid,
                query::specials_enabled(&self.world),
                &mut commands,
            ) {
                error!(level = %self.level.name, %fault, "cascade aborted");
                self.faulted = true;
                return Err(fault.into());
            }

            if commands.is_empty() {
                return Ok(report);
            }

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }
}

/// Builds a match-free board drawn from the palette.
pub fn init_board(palette: &[TileKind], seed: u64) -> Result<Grid, SessionError> {
    let level = LevelDescriptor {
        name: String::from("board"),
        moves: 1,
        palette: palette.to_vec(),
        goals: Vec::new(),
        specials_enabled: false,
        seeding: Default::default(),
    };
    let session = Session::with_draw(level, Box::new(SeededDraw::new(seed)))?;
    Ok(session.grid().clone())
}

/// Validates a level, including checks that need the match detector.
pub fn validate_level(level: &LevelDescriptor) -> Result<(), LevelError> {
    level.validate()?;

    let mut forced = Grid::new();
    for placement in &level.seeding.forced {
        let _ = forced.set(placement.cell, Some(Tile::ordinary(placement.kind)));
    }
    let scan = scan(&forced);
    if let Some(cell) = scan.runs().first().and_then(|run| run.cells().first()) {
        return Err(LevelError::SeededRun(*cell));
    }
    Ok(())
}
