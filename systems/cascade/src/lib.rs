#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cascade resolution system that drives clear, collapse and refill rounds.
//!
//! The system never mutates the grid. It reacts to swaps, area clears and
//! resolved rounds by re-scanning the current snapshot and emitting the next
//! [`Command::ResolveRound`] until a scan leaves nothing to clear.

use butter_blast_core::{CellCoord, Command, Event, Grid};
use butter_blast_system_matching::{scan, Scan};
use thiserror::Error;
use tracing::{debug, trace};

/// Number of rounds a single cascade may run before it is considered runaway.
pub const DEFAULT_ROUND_LIMIT: u32 = 256;

/// Internal faults raised while resolving a cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CascadeError {
    /// The cascade kept producing matches past the configured round cap.
    #[error("cascade exceeded {limit} rounds without settling")]
    RoundLimit {
        /// Round cap that was exceeded.
        limit: u32,
    },
}

/// Pure system that turns match scans into cascade rounds.
#[derive(Debug)]
pub struct Cascade {
    round_limit: u32,
    rounds: u32,
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new()
    }
}

impl Cascade {
    /// Creates a cascade system using the default round cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            round_limit: DEFAULT_ROUND_LIMIT,
            rounds: 0,
        }
    }

    /// Overrides the number of rounds a cascade may run.
    #[must_use]
    pub const fn with_round_limit(mut self, round_limit: u32) -> Self {
        self.round_limit = round_limit;
        self
    }

    /// Rounds emitted since the current cascade started.
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Consumes world events and the current grid to emit cascade commands.
    ///
    /// Only the last triggering event of the batch is considered; earlier
    /// ones describe grids that no longer exist.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        specials_enabled: bool,
        out: &mut Vec<Command>,
    ) -> Result<(), CascadeError> {
        let Some(trigger) = events.iter().rev().find(|event| {
            matches!(
                event,
                Event::TilesSwapped { .. } | Event::AreaCleared { .. } | Event::RoundResolved { .. }
            )
        }) else {
            return Ok(());
        };

        match trigger {
            Event::TilesSwapped { a, b } => {
                self.rounds = 0;
                let pending = PendingRound::gate(scan(grid), specials_enabled);
                if pending.is_empty() {
                    trace!(%a, %b, "swap produced no match");
                    out.push(Command::RevertSwap { a: *a, b: *b });
                    return Ok(());
                }
                out.push(Command::ConsumeMove);
                self.emit(pending, out)
            }
            Event::AreaCleared { .. } => {
                self.rounds = 0;
                self.advance(grid, specials_enabled, out)
            }
            _ => self.advance(grid, specials_enabled, out),
        }
    }

    fn advance(
        &mut self,
        grid: &Grid,
        specials_enabled: bool,
        out: &mut Vec<Command>,
    ) -> Result<(), CascadeError> {
        let pending = PendingRound::gate(scan(grid), specials_enabled);
        if pending.is_empty() {
            debug!(rounds = self.rounds, "cascade settled");
            return Ok(());
        }
        self.emit(pending, out)
    }

    fn emit(&mut self, pending: PendingRound, out: &mut Vec<Command>) -> Result<(), CascadeError> {
        if self.rounds >= self.round_limit {
            return Err(CascadeError::RoundLimit {
                limit: self.round_limit,
            });
        }
        self.rounds += 1;
        out.push(Command::ResolveRound {
            runs: pending.runs,
            clear: pending.clear,
            spawns: pending.spawns,
        });
        Ok(())
    }
}

/// Clear set and spawn points after applying the specials gate.
struct PendingRound {
    runs: u32,
    clear: Vec<CellCoord>,
    spawns: Vec<CellCoord>,
}

impl PendingRound {
    fn gate(scan: Scan, specials_enabled: bool) -> Self {
        let runs = scan.run_count();
        if specials_enabled {
            Self {
                runs,
                clear: scan.clear().iter().copied().collect(),
                spawns: scan.spawns().to_vec(),
            }
        } else {
            // Without specials every spawn point is cleared like any run member.
            Self {
                runs,
                clear: scan.members().into_iter().collect(),
                spawns: Vec::new(),
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.clear.is_empty()
    }
}
