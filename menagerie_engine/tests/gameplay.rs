use std::time::Duration;

use menagerie_engine::{
    ActivePiece, Command, Feedback, Game, GameConfig, PieceDraw, PieceKind, Tile, TickError,
    WIDTH,
};

const TICK: Duration = Duration::from_millis(16);

/// A config with all creatures and novelty shapes disabled, so the only
/// things moving are the active piece and the clock.
fn quiet_config() -> GameConfig {
    GameConfig {
        crazy_enabled: false,
        fillers_enabled: false,
        relocator_enabled: false,
        remover_enabled: false,
        ..GameConfig::default()
    }
}

fn set_active(game: &mut Game, kind: PieceKind, x: i32) {
    game.state_mut().active = Some(ActivePiece {
        shape: kind.shape(),
        tile: Tile::Piece(kind),
        x,
        y: 0,
    });
}

#[test]
fn hard_dropped_piece_lands_scores_and_promotes_next() {
    let mut game = Game::new(quiet_config());
    set_active(&mut game, PieceKind::I, 3);
    let promoted = game.state().next.clone();

    let events = game.tick(Some(Command::HardDrop), TICK).unwrap();

    // The flat I descends 19 rows onto the floor.
    for x in 3..7 {
        assert_eq!(game.state().board.cell(x, 19), Some(Tile::Piece(PieceKind::I)));
    }
    assert_eq!(game.state().score, 2 * 19);
    assert!(events.iter().any(|(_, f)| matches!(f, Feedback::HardDrop)));
    assert!(events.iter().any(|(_, f)| matches!(f, Feedback::PieceLocked)));
    // The previewed piece became the new active piece.
    let active = game.state().active.as_ref().unwrap();
    assert_eq!(active.shape, promoted.shape);
    assert_eq!(active.tile, promoted.tile);
    assert_eq!(active.y, 0);
}

#[test]
fn single_line_clears_through_the_animation() {
    let mut game = Game::new(quiet_config());
    for x in 0..WIDTH as i32 {
        if x != 5 && x != 6 {
            game.state_mut().board.set_cell(x, 19, Some(Tile::Filler));
        }
    }
    set_active(&mut game, PieceKind::O, 5);

    let events = game.tick(Some(Command::HardDrop), TICK).unwrap();
    assert!(events
        .iter()
        .any(|(_, f)| matches!(f, Feedback::LineClears(rows, _) if rows == &[19])));
    // The matched row stays on the board while the animation runs.
    assert!(game.state().board.cell(0, 19).is_some());
    assert_eq!(game.state().lines, 0);

    let events = game
        .tick(None, game.config().line_clear_duration)
        .unwrap();
    assert!(events.iter().any(|(_, f)| matches!(
        f,
        Feedback::LinesCleared {
            n: 1,
            score_bonus: 100
        }
    )));
    assert_eq!(game.state().lines, 1);
    assert_eq!(game.state().level, 1);
    // Hard drop bonus (18 rows) plus the clear bonus.
    assert_eq!(game.state().score, 2 * 18 + 100);
    // The surviving half of the O slid down into the bottom row.
    assert_eq!(game.state().board.cell(5, 19), Some(Tile::Piece(PieceKind::O)));
    assert_eq!(game.state().board.cell(6, 19), Some(Tile::Piece(PieceKind::O)));
    assert_eq!(game.state().board.cell(0, 19), None);
}

#[test]
fn double_clear_scores_per_line_times_level() {
    let mut game = Game::new(quiet_config());
    for x in 0..WIDTH as i32 {
        if x != 4 && x != 5 {
            game.state_mut().board.set_cell(x, 18, Some(Tile::Filler));
            game.state_mut().board.set_cell(x, 19, Some(Tile::Filler));
        }
    }
    set_active(&mut game, PieceKind::O, 4);

    game.tick(Some(Command::HardDrop), TICK).unwrap();
    let events = game
        .tick(None, game.config().line_clear_duration)
        .unwrap();
    assert!(events.iter().any(|(_, f)| matches!(
        f,
        Feedback::LinesCleared {
            n: 2,
            score_bonus: 200
        }
    )));
    assert_eq!(game.state().lines, 2);
}

#[test]
fn tenth_line_raises_the_level() {
    let mut game = Game::new(quiet_config());
    game.state_mut().lines = 9;
    for x in 0..WIDTH as i32 {
        if x != 4 && x != 5 {
            game.state_mut().board.set_cell(x, 19, Some(Tile::Filler));
        }
    }
    set_active(&mut game, PieceKind::O, 4);

    game.tick(Some(Command::HardDrop), TICK).unwrap();
    game.tick(None, game.config().line_clear_duration).unwrap();
    assert_eq!(game.state().lines, 10);
    assert_eq!(game.state().level, 2);
}

#[test]
fn blocked_spawn_ends_the_game_once() {
    let mut game = Game::new(quiet_config());
    // Choke the spawn rows without completing them.
    for x in 1..WIDTH as i32 {
        game.state_mut().board.set_cell(x, 0, Some(Tile::Filler));
        game.state_mut().board.set_cell(x, 1, Some(Tile::Filler));
    }
    game.state_mut().active = Some(ActivePiece {
        shape: PieceKind::O.shape(),
        tile: Tile::Piece(PieceKind::O),
        x: 7,
        y: 18,
    });

    // One full gravity interval forces the lock attempt.
    let events = game
        .tick(None, Duration::from_millis(1000))
        .unwrap();
    let game_overs = events
        .iter()
        .filter(|(_, f)| matches!(f, Feedback::GameOver { .. }))
        .count();
    assert_eq!(game_overs, 1);
    assert!(game.state().ended);
    assert!(game.state().active.is_none());

    // Stats freeze and further ticks are rejected.
    let (score, lines) = (game.state().score, game.state().lines);
    assert_eq!(game.tick(None, TICK), Err(TickError::GameEnded));
    assert_eq!(game.state().score, score);
    assert_eq!(game.state().lines, lines);
}

#[test]
fn soft_drop_moves_without_scoring() {
    let mut game = Game::new(quiet_config());
    set_active(&mut game, PieceKind::T, 3);
    game.tick(Some(Command::SoftDrop), TICK).unwrap();
    assert_eq!(game.state().active.as_ref().unwrap().y, 1);
    assert_eq!(game.state().score, 0);
}

#[test]
fn moves_against_the_wall_fail_silently() {
    let mut game = Game::new(quiet_config());
    set_active(&mut game, PieceKind::I, 0);
    game.tick(Some(Command::MoveLeft), TICK).unwrap();
    assert_eq!(game.state().active.as_ref().unwrap().x, 0);

    set_active(&mut game, PieceKind::I, 6);
    game.tick(Some(Command::MoveRight), TICK).unwrap();
    // Width-4 piece at x = 6 already touches the right wall.
    assert_eq!(game.state().active.as_ref().unwrap().x, 6);
}

#[test]
fn blocked_rotation_keeps_the_old_shape() {
    let mut game = Game::new(quiet_config());
    // Vertical I against the floor cannot rotate back to horizontal if
    // neighbors are occupied.
    let vertical = PieceKind::I.shape().rotated_cw();
    game.state_mut().active = Some(ActivePiece {
        shape: vertical.clone(),
        tile: Tile::Piece(PieceKind::I),
        x: 0,
        y: 16,
    });
    for y in 16..20 {
        game.state_mut().board.set_cell(1, y, Some(Tile::Filler));
    }
    game.tick(Some(Command::Rotate), TICK).unwrap();
    assert_eq!(game.state().active.as_ref().unwrap().shape, vertical);
}

#[test]
fn creature_piece_hard_drops_through_overhangs() {
    let mut game = Game::new(quiet_config());
    // An obstruction midway down the creature's columns.
    game.state_mut().board.set_cell(3, 10, Some(Tile::Filler));
    let draw = PieceDraw::relocator();
    game.state_mut().active = Some(ActivePiece {
        shape: draw.shape,
        tile: draw.tile,
        x: 0,
        y: 0,
    });

    game.tick(Some(Command::HardDrop), TICK).unwrap();

    // Past the overhang, onto the floor row.
    for x in 0..7 {
        assert_eq!(game.state().board.cell(x, 19), Some(Tile::Relocator));
    }
    assert_eq!(game.state().board.cell(3, 10), Some(Tile::Filler));
    // 19 rows dropped plus the creature lock bonus.
    assert_eq!(game.state().score, 2 * 19 + 50);
}

#[test]
fn score_never_decreases_under_full_simulation() {
    let mut game = Game::new(GameConfig::default());
    let mut last_score = 0;
    for _ in 0..3000 {
        match game.tick(None, TICK) {
            Ok(_) => {
                assert!(game.state().score >= last_score);
                last_score = game.state().score;
            }
            Err(TickError::GameEnded) => break,
        }
    }
}
