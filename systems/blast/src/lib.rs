#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Area blast system that converts special tile activations into area clears.

use butter_blast_core::{CellCoord, Command, Event};

/// Pure system reacting to activated special tiles.
#[derive(Debug, Default)]
pub struct Blast;

impl Blast {
    /// Creates a new blast system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Consumes world events and emits the move cost plus the area clear.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if let Event::BlastTriggered { center } = event {
                out.push(Command::ConsumeMove);
                out.push(Command::ClearArea {
                    center: *center,
                    cells: neighborhood(*center),
                });
            }
        }
    }
}

/// Cells of the 3×3 square centred on `center`, clipped to the board.
///
/// Returns the cells in row-major order. An out-of-bounds centre yields no
/// cells.
#[must_use]
pub fn neighborhood(center: CellCoord) -> Vec<CellCoord> {
    if !center.in_bounds() {
        return Vec::new();
    }

    let rows = center.row().saturating_sub(1)..=center.row().saturating_add(1);
    rows.flat_map(|row| {
        let columns = center.column().saturating_sub(1)..=center.column().saturating_add(1);
        columns.map(move |column| CellCoord::new(row, column))
    })
    .filter(CellCoord::in_bounds)
    .collect()
}
