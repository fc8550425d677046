use std::fmt::Write as _;

use butter_blast_core::{Grid, LevelDescriptor, LevelStatus, RoundResult, SessionStats, StatKey};

/// Renders the board with row and column indices.
///
/// Glyphs follow the board text format: upper case for ordinary tiles,
/// lower case for obstacles, `*` for specials and `.` for empty cells.
pub(crate) fn board(grid: &Grid) -> String {
    let text = grid.to_string();
    let mut out = String::from("   ");
    let width = text.lines().next().map_or(0, |line| line.chars().count());
    for column in 0..width {
        let _ = write!(out, " {column}");
    }
    out.push('\n');
    for (row, line) in text.lines().enumerate() {
        let _ = write!(out, "{row:>2} ");
        for glyph in line.chars() {
            let _ = write!(out, " {glyph}");
        }
        out.push('\n');
    }
    out
}

/// Summarises one resolution round on a single line.
pub(crate) fn round(index: usize, round: &RoundResult) -> String {
    let mut line = format!(
        "round {}: {} runs, {} cleared",
        index + 1,
        round.runs,
        round.cleared.len()
    );
    if !round.spawned.is_empty() {
        let cells: Vec<String> = round.spawned.iter().map(ToString::to_string).collect();
        let _ = write!(line, ", specials at {}", cells.join(" "));
    }
    if !round.loosened.is_empty() {
        let _ = write!(line, ", {} obstacles loosened", round.loosened.len());
    }
    line
}

/// Lists every statistic with its current value.
pub(crate) fn stats(stats: &SessionStats) -> String {
    StatKey::ALL
        .iter()
        .map(|key| format!("{}={}", key.id(), stats.get(*key)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lists the level goals with their progress.
pub(crate) fn goals(level: &LevelDescriptor, stats: &SessionStats) -> String {
    level
        .goals
        .iter()
        .map(|goal| {
            let mark = if goal.is_met(stats) { "x" } else { " " };
            format!(
                "[{mark}] {} {}/{}",
                goal.stat.id(),
                stats.get(goal.stat).min(goal.target),
                goal.target
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human readable level status.
pub(crate) fn status(status: LevelStatus) -> &'static str {
    match status {
        LevelStatus::InProgress => "in progress",
        LevelStatus::Won => "level complete",
        LevelStatus::OutOfMoves => "out of moves",
    }
}
