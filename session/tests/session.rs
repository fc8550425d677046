use std::{cell::RefCell, rc::Rc};

use butter_blast_core::{
    ActionError, CellCoord, Goal, Grid, LevelDescriptor, LevelError, LevelStatus, Placement,
    Seeding, StatKey, Tile, TileKind,
};
use butter_blast_session::{init_board, Session, SessionError};
use butter_blast_system_cascade::CascadeError;
use butter_blast_system_matching::scan;
use butter_blast_world::{DrawSource, ScriptedDraw, SeededDraw};

const SWAP_READY: &str = "
    PSBHPSBH
    SBHPSBHP
    BHPSBHPS
    HPSBHPSB
    PSBHPSBH
    SBHPSBHP
    BHPSBHPS
    PPSBHPSB
";

const OBSTACLE_READY: &str = "
    PSBHPSBH
    SBHPSBHP
    BHPSBHPS
    HPSBHPSB
    PSBHPSBH
    SBHPSBHP
    BHPSBHPS
    PpSBHPSB
";

const FOUR_READY: &str = "
    PSBHPSBH
    SBHPSBHP
    PBBSBHPS
    HPSBHPSB
    PSBHPSBH
    SBHPSBHP
    BHPSBHPS
    HPSBHPSB
";

const CORNER_SPECIAL: &str = "
    *SBHPSBH
    SBHPSBHP
    BHPSBHPS
    HPSBHPSB
    PSBHPSBH
    SBHPSBHP
    BHPSBHPS
    HPSBHPSB
";

/// Draw source whose underlying stream can be swapped after the board is built.
#[derive(Clone, Debug)]
struct SharedDraw(Rc<RefCell<Box<dyn DrawSource>>>);

impl SharedDraw {
    fn seeded(seed: u64) -> Self {
        Self(Rc::new(RefCell::new(Box::new(SeededDraw::new(seed)))))
    }

    fn script(&self, indices: Vec<usize>) {
        *self.0.borrow_mut() = Box::new(ScriptedDraw::new(indices));
    }
}

impl DrawSource for SharedDraw {
    fn next_index(&mut self, upper: usize) -> usize {
        self.0.borrow_mut().next_index(upper)
    }
}

fn level(moves: u32, goals: Vec<Goal>, specials_enabled: bool) -> LevelDescriptor {
    LevelDescriptor {
        name: String::from("Session test"),
        moves,
        palette: TileKind::ALL.to_vec(),
        goals,
        specials_enabled,
        seeding: Seeding::default(),
    }
}

fn goal(stat: StatKey, target: u32) -> Goal {
    Goal { stat, target }
}

/// Builds a session on the given layout whose refills follow `draws`.
fn scripted_session(level: LevelDescriptor, layout: &str, draws: Vec<usize>) -> Session {
    let draw = SharedDraw::seeded(3);
    let mut session = Session::with_draw(level, Box::new(draw.clone())).expect("valid level");
    session
        .load_layout(layout.parse::<Grid>().expect("valid layout"))
        .expect("layout loaded");
    draw.script(draws);
    session
}

#[test]
fn initial_boards_are_match_free() {
    let palettes = [
        vec![TileKind::Potato, TileKind::Slice, TileKind::Herb],
        TileKind::ALL.to_vec(),
    ];
    for palette in palettes {
        for seed in [0, 1, 2, 17, 99, 1_000_003] {
            let grid = init_board(&palette, seed).expect("valid palette");
            assert!(scan(&grid).is_empty(), "seed {seed}:\n{grid}");
            assert_eq!(grid.occupied(), 64);
        }
    }
}

#[test]
fn new_session_starts_in_progress() {
    let session = Session::new(level(30, vec![goal(StatKey::Matches, 6)], false), 11)
        .expect("valid level");

    assert_eq!(session.status(), LevelStatus::InProgress);
    assert_eq!(session.stats().moves(), 30);
    assert_eq!(
        session.goal_progress().into_iter().collect::<Vec<_>>(),
        vec![(StatKey::Matches, 0)]
    );
    assert!(scan(session.grid()).is_empty());
}

#[test]
fn unmatched_swap_is_reverted_and_free() {
    let mut session = scripted_session(
        level(30, vec![goal(StatKey::Matches, 6)], false),
        SWAP_READY,
        vec![0],
    );
    let before = session.grid().clone();

    let outcome = session
        .apply_swap(CellCoord::new(3, 3), CellCoord::new(3, 4))
        .expect("swap accepted");

    assert!(!outcome.matched);
    assert!(outcome.rounds.is_empty());
    assert_eq!(session.grid(), &before);
    assert_eq!(session.stats().moves(), 30);
}

#[test]
fn matched_swap_cascades_twice() {
    let mut session = scripted_session(
        level(
            30,
            vec![goal(StatKey::Potato, 6), goal(StatKey::Matches, 2)],
            false,
        ),
        SWAP_READY,
        vec![0, 0, 0, 1],
    );

    let outcome = session
        .apply_swap(CellCoord::new(6, 2), CellCoord::new(7, 2))
        .expect("swap accepted");

    assert!(outcome.matched);
    assert_eq!(outcome.rounds.len(), 2);
    assert!(outcome.rounds.iter().all(|round| round.runs == 1));
    assert_eq!(session.stats().get(StatKey::Matches), 2);
    assert_eq!(session.stats().get(StatKey::Clear), 6);
    assert_eq!(session.stats().moves(), 29);
    assert_eq!(session.status(), LevelStatus::Won);
    assert!(scan(session.grid()).is_empty());
}

#[test]
fn obstacle_loosens_instead_of_clearing() {
    let mut session = scripted_session(
        level(30, vec![goal(StatKey::Obstacles, 1)], false),
        OBSTACLE_READY,
        vec![2, 3],
    );

    let outcome = session
        .apply_swap(CellCoord::new(6, 2), CellCoord::new(7, 2))
        .expect("swap accepted");

    assert_eq!(outcome.rounds.len(), 1);
    let round = &outcome.rounds[0];
    assert_eq!(round.loosened, vec![CellCoord::new(7, 1)]);
    assert_eq!(
        round.cleared,
        vec![CellCoord::new(7, 0), CellCoord::new(7, 2)]
    );
    assert_eq!(
        session.grid().tile(CellCoord::new(7, 1)),
        Some(Tile::ordinary(TileKind::Potato))
    );
    assert_eq!(session.stats().get(StatKey::Obstacles), 1);
    assert_eq!(session.stats().get(StatKey::Clear), 2);
    assert_eq!(session.status(), LevelStatus::Won);
}

#[test]
fn specials_flag_controls_spawning() {
    let swap = (CellCoord::new(2, 3), CellCoord::new(3, 3));

    let mut enabled = scripted_session(
        level(30, vec![goal(StatKey::Butter, 10)], true),
        FOUR_READY,
        vec![1, 2, 3, 0],
    );
    let outcome = enabled.apply_swap(swap.0, swap.1).expect("swap accepted");
    assert_eq!(outcome.rounds.len(), 1);
    assert_eq!(outcome.rounds[0].spawned, vec![CellCoord::new(2, 2)]);
    assert_eq!(enabled.stats().get(StatKey::Butter), 3);
    assert!(enabled
        .grid()
        .tile(CellCoord::new(2, 2))
        .expect("special placed")
        .is_special());

    let mut disabled = scripted_session(
        level(30, vec![goal(StatKey::Butter, 10)], false),
        FOUR_READY,
        vec![1, 2, 3, 0],
    );
    let outcome = disabled.apply_swap(swap.0, swap.1).expect("swap accepted");
    assert_eq!(outcome.rounds.len(), 1);
    assert!(outcome.rounds[0].spawned.is_empty());
    assert_eq!(outcome.rounds[0].cleared.len(), 4);
    assert_eq!(disabled.stats().get(StatKey::Butter), 4);
}

#[test]
fn corner_blast_clears_four_cells() {
    let mut session = scripted_session(
        level(30, vec![goal(StatKey::Blasts, 2)], true),
        CORNER_SPECIAL,
        vec![1, 2, 3, 0, 2],
    );

    let outcome = session
        .apply_area_blast(CellCoord::new(0, 0))
        .expect("blast accepted");

    assert_eq!(outcome.rounds.len(), 1);
    let first = &outcome.rounds[0];
    assert_eq!(first.runs, 0);
    assert_eq!(
        first.cleared,
        vec![
            CellCoord::new(0, 0),
            CellCoord::new(0, 1),
            CellCoord::new(1, 0),
            CellCoord::new(1, 1),
        ]
    );
    assert_eq!(session.stats().get(StatKey::Blasts), 1);
    assert_eq!(session.stats().moves(), 29);
    assert!(scan(session.grid()).is_empty());
}

#[test]
fn invalid_actions_are_rejected() {
    let mut session = scripted_session(
        level(30, vec![goal(StatKey::Matches, 6)], true),
        SWAP_READY,
        vec![0],
    );

    assert_eq!(
        session.apply_swap(CellCoord::new(0, 0), CellCoord::new(2, 0)),
        Err(SessionError::Rejected(ActionError::NotAdjacent))
    );
    assert_eq!(
        session.apply_swap(CellCoord::new(7, 7), CellCoord::new(7, 8)),
        Err(SessionError::Rejected(ActionError::OutOfBounds))
    );
    assert_eq!(
        session.apply_area_blast(CellCoord::new(4, 4)),
        Err(SessionError::Rejected(ActionError::NotSpecial))
    );
    assert_eq!(session.stats().moves(), 30);
}

#[test]
fn actions_stop_when_moves_run_out() {
    let mut session = scripted_session(
        level(1, vec![goal(StatKey::Matches, 5)], false),
        SWAP_READY,
        vec![0, 0, 0, 1],
    );

    let outcome = session
        .apply_swap(CellCoord::new(6, 2), CellCoord::new(7, 2))
        .expect("last move");
    assert!(outcome.matched);
    assert_eq!(session.status(), LevelStatus::OutOfMoves);

    assert_eq!(
        session.apply_swap(CellCoord::new(0, 0), CellCoord::new(0, 1)),
        Err(SessionError::Rejected(ActionError::OutOfMoves))
    );
}

#[test]
fn runaway_cascade_faults_the_session() {
    let mut level = level(5, vec![goal(StatKey::Clear, 10)], false);
    level.palette = vec![TileKind::Herb];
    let mut session = Session::new(level, 5).expect("valid level");

    let result = session.apply_swap(CellCoord::new(0, 0), CellCoord::new(0, 1));
    assert_eq!(
        result,
        Err(SessionError::Cascade(CascadeError::RoundLimit { limit: 256 }))
    );
    assert!(session.is_faulted());
    assert_eq!(
        session.apply_swap(CellCoord::new(0, 0), CellCoord::new(0, 1)),
        Err(SessionError::Faulted)
    );

    let _ = session.init_board().expect("reinitialised");
    assert!(!session.is_faulted());
    assert_eq!(session.stats().moves(), 5);
}

#[test]
fn equal_seeds_replay_identically() {
    let actions = [
        (CellCoord::new(0, 0), CellCoord::new(0, 1)),
        (CellCoord::new(3, 3), CellCoord::new(4, 3)),
        (CellCoord::new(5, 6), CellCoord::new(5, 7)),
        (CellCoord::new(7, 2), CellCoord::new(6, 2)),
    ];
    let play = || {
        let mut session = Session::new(level(30, vec![goal(StatKey::Clear, 50)], true), 2024)
            .expect("valid level");
        let outcomes: Vec<_> = actions
            .iter()
            .map(|(a, b)| session.apply_swap(*a, *b))
            .collect();
        (outcomes, session.grid().clone(), session.stats().clone())
    };

    assert_eq!(play(), play());
}

#[test]
fn level_names_separate_draw_streams() {
    let first = Session::new(level(30, vec![goal(StatKey::Clear, 50)], true), 8)
        .expect("valid level");
    let mut renamed = level(30, vec![goal(StatKey::Clear, 50)], true);
    renamed.name = String::from("Another level");
    let second = Session::new(renamed, 8).expect("valid level");

    assert_ne!(first.grid(), second.grid());
}

#[test]
fn invalid_levels_are_refused() {
    let mut empty = level(30, vec![goal(StatKey::Clear, 5)], false);
    empty.palette.clear();
    assert_eq!(
        Session::new(empty, 1).err(),
        Some(SessionError::InvalidLevel(LevelError::EmptyPalette))
    );

    let mut seeded = level(30, vec![goal(StatKey::Clear, 5)], false);
    seeded.seeding.forced = (1..4)
        .map(|column| Placement {
            cell: CellCoord::new(2, column),
            kind: TileKind::Butter,
        })
        .collect();
    assert_eq!(
        Session::new(seeded, 1).err(),
        Some(SessionError::InvalidLevel(LevelError::SeededRun(
            CellCoord::new(2, 1)
        )))
    );
}

#[test]
fn seeded_level_keeps_its_opportunity() {
    let mut seeded = level(30, vec![goal(StatKey::Blasts, 2)], true);
    seeded.seeding.forced = [
        (1, TileKind::Butter),
        (2, TileKind::Butter),
        (3, TileKind::Potato),
        (4, TileKind::Butter),
        (5, TileKind::Butter),
    ]
    .into_iter()
    .map(|(column, kind)| Placement {
        cell: CellCoord::new(2, column),
        kind,
    })
    .collect();
    seeded.seeding.obstacles = 4;

    let session = Session::new(seeded.clone(), 31).expect("valid level");

    for placement in &seeded.seeding.forced {
        assert_eq!(
            session.grid().tile(placement.cell).map(|tile| tile.kind()),
            Some(placement.kind)
        );
    }
    let obstacles = session
        .grid()
        .cells()
        .filter(|(_, tile)| tile.map_or(false, |tile| tile.is_obstacle()))
        .count();
    assert_eq!(obstacles, 4);
    assert!(scan(session.grid()).is_empty());
}
