#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Butter Blast engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query the
//! immutable [`Grid`], and respond exclusively with new command batches.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of rows contained in every board.
pub const GRID_ROWS: u32 = 8;

/// Number of columns contained in every board.
pub const GRID_COLUMNS: u32 = 8;

const ROWS: usize = GRID_ROWS as usize;
const COLUMNS: usize = GRID_COLUMNS as usize;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts the provided level: resets statistics and fills the board with
    /// independently drawn ordinary tiles.
    LoadLevel {
        /// Level that becomes active.
        level: LevelDescriptor,
    },
    /// Replaces the board with a caller-supplied grid without touching statistics.
    ReplaceGrid {
        /// Grid that becomes authoritative.
        grid: Grid,
    },
    /// Replaces the tiles at the provided cells with freshly drawn ordinary tiles.
    RedrawCells {
        /// Cells whose tiles are redrawn from the active palette.
        cells: Vec<CellCoord>,
    },
    /// Overwrites cells with forced ordinary tiles.
    PlaceTiles {
        /// Tiles to write into the board.
        placements: Vec<Placement>,
    },
    /// Flags the requested number of distinct random cells as obstacles.
    FlagObstacles {
        /// Number of cells that receive the obstacle flag.
        count: u32,
    },
    /// Requests that two adjacent tiles trade places.
    SwapTiles {
        /// First cell taking part in the swap.
        a: CellCoord,
        /// Second cell taking part in the swap.
        b: CellCoord,
    },
    /// Undoes a swap that produced no match.
    RevertSwap {
        /// First cell of the original swap.
        a: CellCoord,
        /// Second cell of the original swap.
        b: CellCoord,
    },
    /// Requests activation of the special tile located at the provided cell.
    ActivateTile {
        /// Cell holding the special tile.
        cell: CellCoord,
    },
    /// Deducts one move from the session budget.
    ConsumeMove,
    /// Executes a single cascade round: clear, spawn, collapse, refill.
    ResolveRound {
        /// Number of runs detected by the scan that produced this round.
        runs: u32,
        /// Cells cleared (or obstacle-loosened) during the round.
        clear: Vec<CellCoord>,
        /// Cells that receive a newly spawned special tile.
        spawns: Vec<CellCoord>,
    },
    /// Clears the area affected by an activated special tile, then collapses.
    ClearArea {
        /// Cell holding the activated special tile.
        center: CellCoord,
        /// In-bounds cells affected by the activation.
        cells: Vec<CellCoord>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a level started and the board was filled.
    LevelStarted {
        /// Number of moves available for the level.
        moves: u32,
    },
    /// Confirms that the board was replaced by a supplied grid.
    GridReplaced,
    /// Confirms that tiles were redrawn at the provided cells.
    CellsRedrawn {
        /// Cells that received new tiles.
        cells: Vec<CellCoord>,
    },
    /// Confirms that forced tiles were written into the board.
    TilesPlaced {
        /// Cells that received forced tiles.
        cells: Vec<CellCoord>,
    },
    /// Confirms that obstacle flags were applied.
    ObstaclesFlagged {
        /// Cells whose tiles became obstacles.
        cells: Vec<CellCoord>,
    },
    /// Confirms that two tiles traded places.
    TilesSwapped {
        /// First cell taking part in the swap.
        a: CellCoord,
        /// Second cell taking part in the swap.
        b: CellCoord,
    },
    /// Confirms that an unproductive swap was undone.
    SwapReverted {
        /// First cell of the original swap.
        a: CellCoord,
        /// Second cell of the original swap.
        b: CellCoord,
    },
    /// Announces that a special tile was activated by the player.
    BlastTriggered {
        /// Cell holding the activated special tile.
        center: CellCoord,
    },
    /// Reports that a move was deducted from the budget.
    MoveConsumed {
        /// Moves left after the deduction.
        remaining: u32,
    },
    /// Reports the outcome of a completed cascade round.
    RoundResolved {
        /// Cells touched by the round.
        round: RoundResult,
    },
    /// Reports the outcome of an area clear triggered by a special tile.
    AreaCleared {
        /// Cell holding the activated special tile.
        center: CellCoord,
        /// Cells touched by the clear.
        round: RoundResult,
    },
    /// Reports that a player action was rejected.
    ActionRejected {
        /// Specific reason the action failed.
        reason: ActionError,
    },
}

/// Location of a single board cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell, counted from the top.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell, counted from the left.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Reports whether the coordinate lies inside the board.
    #[must_use]
    pub const fn in_bounds(&self) -> bool {
        self.row < GRID_ROWS && self.column < GRID_COLUMNS
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Reports whether the two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.column)
    }
}

/// Ordinary tile categories a level palette may draw from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    /// Whole potato.
    Potato,
    /// Potato slice.
    Slice,
    /// Butter pat.
    Butter,
    /// Herb sprig.
    Herb,
}

impl TileKind {
    /// Every tile kind in declaration order.
    pub const ALL: [TileKind; 4] = [Self::Potato, Self::Slice, Self::Butter, Self::Herb];

    /// Single-character glyph used by the textual board format.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Potato => 'P',
            Self::Slice => 'S',
            Self::Butter => 'B',
            Self::Herb => 'H',
        }
    }

    /// Resolves a glyph back into its tile kind, ignoring case.
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.glyph() == glyph.to_ascii_uppercase())
    }

    /// Statistic that counts collected tiles of this kind.
    #[must_use]
    pub const fn stat_key(self) -> StatKey {
        match self {
            Self::Potato => StatKey::Potato,
            Self::Slice => StatKey::Slice,
            Self::Butter => StatKey::Butter,
            Self::Herb => StatKey::Herb,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Potato => 0,
            Self::Slice => 1,
            Self::Butter => 2,
            Self::Herb => 3,
        }
    }
}

/// Special behaviours a tile may carry instead of ordinary matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialKind {
    /// Clears the 3×3 neighbourhood around itself when activated.
    AreaBlast,
}

/// Content of an occupied board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    kind: TileKind,
    special: Option<SpecialKind>,
    obstacle: bool,
}

impl Tile {
    /// Creates an ordinary tile of the provided kind.
    #[must_use]
    pub const fn ordinary(kind: TileKind) -> Self {
        Self {
            kind,
            special: None,
            obstacle: false,
        }
    }

    /// Creates a special tile that keeps the provided kind for presentation.
    #[must_use]
    pub const fn special(kind: TileKind, special: SpecialKind) -> Self {
        Self {
            kind,
            special: Some(special),
            obstacle: false,
        }
    }

    /// Returns a copy of the tile with the obstacle flag set.
    #[must_use]
    pub const fn with_obstacle(mut self) -> Self {
        self.obstacle = true;
        self
    }

    /// Returns a copy of the tile with the obstacle flag removed.
    #[must_use]
    pub const fn without_obstacle(mut self) -> Self {
        self.obstacle = false;
        self
    }

    /// Category of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Special behaviour carried by the tile, if any.
    #[must_use]
    pub const fn special_kind(&self) -> Option<SpecialKind> {
        self.special
    }

    /// Reports whether the tile carries a special behaviour.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.special.is_some()
    }

    /// Reports whether the tile is flagged as an obstacle.
    #[must_use]
    pub const fn is_obstacle(&self) -> bool {
        self.obstacle
    }

    /// Match-equality: both tiles are ordinary and share a kind.
    ///
    /// Special tiles never match anything, including other special tiles of
    /// the same kind. The obstacle flag does not affect matching.
    #[must_use]
    pub fn matches(&self, other: &Tile) -> bool {
        self.special.is_none() && other.special.is_none() && self.kind == other.kind
    }

    fn glyph(&self) -> char {
        match (self.special, self.obstacle) {
            (Some(SpecialKind::AreaBlast), _) => '*',
            (None, true) => self.kind.glyph().to_ascii_lowercase(),
            (None, false) => self.kind.glyph(),
        }
    }
}

/// Fixed-size board of optional tiles addressed by [`CellCoord`].
///
/// The textual form (see [`FromStr`] and [`fmt::Display`]) writes one line
/// per row: `P S B H` for ordinary tiles, lowercase for obstacles, `*` for an
/// area blast (parsed back as a butter blast) and `.` for an empty cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    cells: [[Option<Tile>; COLUMNS]; ROWS],
}

impl Grid {
    /// Creates a grid with every cell empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grid with every cell filled by the provided closure.
    #[must_use]
    pub fn filled_with<F>(mut tile_at: F) -> Self
    where
        F: FnMut(CellCoord) -> Tile,
    {
        let mut grid = Self::new();
        for cell in Self::coords() {
            let _ = grid.set(cell, Some(tile_at(cell)));
        }
        grid
    }

    /// Iterator over every coordinate of the board in row-major order.
    pub fn coords() -> impl Iterator<Item = CellCoord> {
        (0..GRID_ROWS).flat_map(|row| (0..GRID_COLUMNS).map(move |column| CellCoord::new(row, column)))
    }

    /// Reports whether the coordinate addresses a cell of the board.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.in_bounds()
    }

    /// Returns the tile stored at the provided cell, if any.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<Tile> {
        let (row, column) = Self::index(cell)?;
        self.cells[row][column]
    }

    /// Stores the provided content at the cell, returning the previous content.
    ///
    /// Writes to out-of-bounds cells are ignored.
    pub fn set(&mut self, cell: CellCoord, tile: Option<Tile>) -> Option<Tile> {
        let (row, column) = Self::index(cell)?;
        std::mem::replace(&mut self.cells[row][column], tile)
    }

    /// Removes and returns the tile stored at the cell.
    pub fn take(&mut self, cell: CellCoord) -> Option<Tile> {
        self.set(cell, None)
    }

    /// Exchanges the contents of two cells. Returns `false` when either is out of bounds.
    pub fn swap(&mut self, a: CellCoord, b: CellCoord) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        let first = self.take(a);
        let second = self.set(b, first);
        let _ = self.set(a, second);
        true
    }

    /// Iterator over every cell and its content in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, Option<Tile>)> + '_ {
        Self::coords().map(move |cell| (cell, self.tile(cell)))
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|slot| slot.is_some()).count()
    }

    /// Compacts every column toward the bottom and refills vacated cells.
    ///
    /// Surviving tiles keep their relative top-to-bottom order. Vacated cells
    /// are filled top to bottom, column by column from the left, by calling
    /// `draw` once per cell. Returns the refilled cells in that order.
    ///
    /// # Panics
    ///
    /// Panics if a column is left with an empty cell, which would mean the
    /// collapse invariants were violated.
    pub fn collapse<F>(&mut self, mut draw: F) -> Vec<CellCoord>
    where
        F: FnMut() -> Tile,
    {
        let mut refilled = Vec::new();
        for column in 0..COLUMNS {
            let survivors: Vec<Tile> = (0..ROWS)
                .filter_map(|row| self.cells[row][column])
                .collect();
            let vacated = ROWS - survivors.len();

            for row in 0..vacated {
                self.cells[row][column] = Some(draw());
                refilled.push(CellCoord::new(row as u32, column as u32));
            }
            for (offset, tile) in survivors.into_iter().enumerate() {
                self.cells[vacated + offset][column] = Some(tile);
            }

            assert!(
                (0..ROWS).all(|row| self.cells[row][column].is_some()),
                "collapse left column {column} short"
            );
        }
        refilled
    }

    fn index(cell: CellCoord) -> Option<(usize, usize)> {
        if cell.in_bounds() {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            Some((row, column))
        } else {
            None
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.cells.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            for slot in row {
                let glyph = slot.map_or('.', |tile| tile.glyph());
                write!(f, "{glyph}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = GridParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() != ROWS {
            return Err(GridParseError::RowCount(lines.len()));
        }

        let mut grid = Grid::new();
        for (row, line) in lines.into_iter().enumerate() {
            let glyphs: Vec<char> = line.chars().filter(|glyph| !glyph.is_whitespace()).collect();
            if glyphs.len() != COLUMNS {
                return Err(GridParseError::ColumnCount {
                    row,
                    found: glyphs.len(),
                });
            }
            for (column, glyph) in glyphs.into_iter().enumerate() {
                let tile = match glyph {
                    '.' => None,
                    '*' => Some(Tile::special(TileKind::Butter, SpecialKind::AreaBlast)),
                    other => {
                        let kind = TileKind::from_glyph(other)
                            .ok_or(GridParseError::UnknownGlyph(other))?;
                        let tile = Tile::ordinary(kind);
                        Some(if other.is_ascii_lowercase() {
                            tile.with_obstacle()
                        } else {
                            tile
                        })
                    }
                };
                grid.cells[row][column] = tile;
            }
        }
        Ok(grid)
    }
}

/// Errors raised while parsing the textual board format.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridParseError {
    /// The text did not contain exactly one line per board row.
    #[error("expected {} rows, found {0}", ROWS)]
    RowCount(usize),
    /// A row did not contain exactly one glyph per board column.
    #[error("row {row} has {found} cells, expected {expected}", expected = COLUMNS)]
    ColumnCount {
        /// Zero-based row index of the malformed line.
        row: usize,
        /// Number of glyphs found in the line.
        found: usize,
    },
    /// A glyph did not correspond to any tile.
    #[error("unknown tile glyph '{0}'")]
    UnknownGlyph(char),
}

/// Axis along which a run was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Run laid out along a row.
    Horizontal,
    /// Run laid out along a column.
    Vertical,
}

/// Maximal line of three or more match-equal tiles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    orientation: Orientation,
    cells: Vec<CellCoord>,
}

impl Run {
    /// Creates a run from its orientation and member cells in walk order.
    #[must_use]
    pub fn new(orientation: Orientation, cells: Vec<CellCoord>) -> Self {
        Self { orientation, cells }
    }

    /// Axis along which the run lies.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Member cells in walk order (left to right, or top to bottom).
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of member cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the run has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the run contains the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }
}

/// Cells touched by one resolution round, reported for presentation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundResult {
    /// Number of runs that triggered the round (zero for an area clear).
    pub runs: u32,
    /// Cells whose tiles were removed.
    pub cleared: Vec<CellCoord>,
    /// Cells that received a newly spawned special tile.
    pub spawned: Vec<CellCoord>,
    /// Cells whose obstacle flag was removed instead of clearing the tile.
    pub loosened: Vec<CellCoord>,
}

/// Reasons a player action may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ActionError {
    /// A referenced cell lies outside the board.
    #[error("cell lies outside the board")]
    OutOfBounds,
    /// The swapped cells do not share an edge.
    #[error("cells are not adjacent")]
    NotAdjacent,
    /// The activated cell does not hold a special tile.
    #[error("cell does not hold a special tile")]
    NotSpecial,
    /// The move budget is exhausted.
    #[error("no moves left")]
    OutOfMoves,
}

/// Statistic keys shared by goals and the session counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKey {
    /// Moves left in the budget.
    Moves,
    /// Runs matched across all rounds.
    Matches,
    /// Tiles removed from the board.
    Clear,
    /// Area blasts activated.
    Blasts,
    /// Obstacle flags removed.
    Obstacles,
    /// Whole potatoes collected.
    Potato,
    /// Potato slices collected.
    Slice,
    /// Butter pats collected.
    Butter,
    /// Herb sprigs collected.
    Herb,
}

impl StatKey {
    /// Every statistic key in declaration order.
    pub const ALL: [StatKey; 9] = [
        Self::Moves,
        Self::Matches,
        Self::Clear,
        Self::Blasts,
        Self::Obstacles,
        Self::Potato,
        Self::Slice,
        Self::Butter,
        Self::Herb,
    ];

    /// Identifier used by level descriptors.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Moves => "moves",
            Self::Matches => "matches",
            Self::Clear => "clear",
            Self::Blasts => "blasts",
            Self::Obstacles => "obstacles",
            Self::Potato => "potato",
            Self::Slice => "slice",
            Self::Butter => "butter",
            Self::Herb => "herb",
        }
    }
}

/// Counters accumulated by a session across rounds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    moves: u32,
    matches: u32,
    cleared: u32,
    blasts: u32,
    obstacles: u32,
    collected: [u32; 4],
}

impl SessionStats {
    /// Creates counters for a fresh level with the provided move budget.
    #[must_use]
    pub fn with_moves(moves: u32) -> Self {
        Self {
            moves,
            ..Self::default()
        }
    }

    /// Current value of the requested statistic.
    #[must_use]
    pub fn get(&self, key: StatKey) -> u32 {
        match key {
            StatKey::Moves => self.moves,
            StatKey::Matches => self.matches,
            StatKey::Clear => self.cleared,
            StatKey::Blasts => self.blasts,
            StatKey::Obstacles => self.obstacles,
            StatKey::Potato => self.collected[TileKind::Potato.index()],
            StatKey::Slice => self.collected[TileKind::Slice.index()],
            StatKey::Butter => self.collected[TileKind::Butter.index()],
            StatKey::Herb => self.collected[TileKind::Herb.index()],
        }
    }

    /// Captures every statistic keyed by [`StatKey`].
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<StatKey, u32> {
        StatKey::ALL.into_iter().map(|key| (key, self.get(key))).collect()
    }

    /// Moves left in the budget.
    #[must_use]
    pub const fn moves(&self) -> u32 {
        self.moves
    }

    /// Deducts a move, returning `false` when the budget was already exhausted.
    pub fn consume_move(&mut self) -> bool {
        if self.moves == 0 {
            return false;
        }
        self.moves -= 1;
        true
    }

    /// Adds the run count of one resolution round.
    pub fn record_matches(&mut self, runs: u32) {
        self.matches = self.matches.saturating_add(runs);
    }

    /// Counts a removed tile of the provided kind.
    pub fn record_cleared(&mut self, kind: TileKind) {
        self.cleared = self.cleared.saturating_add(1);
        let slot = &mut self.collected[kind.index()];
        *slot = slot.saturating_add(1);
    }

    /// Counts a removed obstacle flag.
    pub fn record_loosened(&mut self) {
        self.obstacles = self.obstacles.saturating_add(1);
    }

    /// Counts an activated area blast.
    pub fn record_blast(&mut self) {
        self.blasts = self.blasts.saturating_add(1);
    }
}

/// Target a level expects a statistic to reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Goal {
    /// Statistic tracked by the goal.
    pub stat: StatKey,
    /// Value the statistic must reach.
    pub target: u32,
}

impl Goal {
    /// Reports whether the statistics satisfy the goal.
    #[must_use]
    pub fn is_met(&self, stats: &SessionStats) -> bool {
        stats.get(self.stat) >= self.target
    }
}

/// Forced ordinary tile written into the board by level seeding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Cell that receives the tile.
    pub cell: CellCoord,
    /// Kind of the ordinary tile written.
    pub kind: TileKind,
}

/// Scripted post-processing applied after the board becomes match-free.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seeding {
    /// Forced tiles creating a guaranteed opportunity.
    #[serde(default)]
    pub forced: Vec<Placement>,
    /// Number of random cells flagged as obstacles.
    #[serde(default)]
    pub obstacles: u32,
}

impl Seeding {
    /// Reports whether the seeding performs no work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forced.is_empty() && self.obstacles == 0
    }
}

/// Level configuration consumed by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Display name of the level.
    pub name: String,
    /// Move budget.
    pub moves: u32,
    /// Tile kinds drawn when filling and refilling the board.
    pub palette: Vec<TileKind>,
    /// Goals that must all be met to win the level.
    pub goals: Vec<Goal>,
    /// Whether long runs and intersections spawn special tiles.
    #[serde(default)]
    pub specials_enabled: bool,
    /// Scripted board post-processing.
    #[serde(default)]
    pub seeding: Seeding,
}

impl LevelDescriptor {
    /// Checks the descriptor for configuration errors.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.palette.is_empty() {
            return Err(LevelError::EmptyPalette);
        }
        for (index, kind) in self.palette.iter().enumerate() {
            if self.palette[..index].contains(kind) {
                return Err(LevelError::DuplicatePaletteEntry(*kind));
            }
        }
        if self.moves == 0 {
            return Err(LevelError::NoMoves);
        }
        if let Some(goal) = self.goals.iter().find(|goal| goal.target == 0) {
            return Err(LevelError::ZeroTarget(goal.stat));
        }
        for placement in &self.seeding.forced {
            if !placement.cell.in_bounds() {
                return Err(LevelError::PlacementOutOfBounds(placement.cell));
            }
            if !self.palette.contains(&placement.kind) {
                return Err(LevelError::PlacementOutsidePalette(placement.kind));
            }
        }
        if self.seeding.obstacles > GRID_ROWS * GRID_COLUMNS {
            return Err(LevelError::TooManyObstacles(self.seeding.obstacles));
        }
        Ok(())
    }

    /// Reports whether every goal of the level is met.
    #[must_use]
    pub fn goals_met(&self, stats: &SessionStats) -> bool {
        self.goals.iter().all(|goal| goal.is_met(stats))
    }

    /// Derives the level status from the statistics.
    #[must_use]
    pub fn status(&self, stats: &SessionStats) -> LevelStatus {
        if self.goals_met(stats) {
            LevelStatus::Won
        } else if stats.moves() == 0 {
            LevelStatus::OutOfMoves
        } else {
            LevelStatus::InProgress
        }
    }
}

/// Configuration errors detected when a level is loaded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The palette contains no tile kinds.
    #[error("palette is empty")]
    EmptyPalette,
    /// The palette lists a tile kind more than once.
    #[error("palette lists {0:?} more than once")]
    DuplicatePaletteEntry(TileKind),
    /// The move budget is zero.
    #[error("move budget must be positive")]
    NoMoves,
    /// A goal targets zero, which is met before the level starts.
    #[error("goal for '{}' has a zero target", .0.id())]
    ZeroTarget(StatKey),
    /// A forced placement lies outside the board.
    #[error("forced placement at {0} lies outside the board")]
    PlacementOutOfBounds(CellCoord),
    /// A forced placement uses a kind the palette does not contain.
    #[error("forced placement uses {0:?}, which is not in the palette")]
    PlacementOutsidePalette(TileKind),
    /// More obstacles were requested than the board has cells.
    #[error("{0} obstacles requested but the board has {} cells", GRID_ROWS * GRID_COLUMNS)]
    TooManyObstacles(u32),
    /// The forced placements already form a run on their own.
    #[error("forced placements form a run at {0}")]
    SeededRun(CellCoord),
}

/// Progress of the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelStatus {
    /// Goals remain and moves are left.
    InProgress,
    /// Every goal is met.
    Won,
    /// The budget is exhausted with goals outstanding.
    OutOfMoves,
}
