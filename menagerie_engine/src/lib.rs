//! Tetromino game engine with autonomous board creatures.
//!
//! The engine is headless and deterministic in structure: a frontend drives
//! it by calling [`Game::tick`] with elapsed wall time and at most one player
//! command, then renders from [`Game::snapshot`]. Everything that happens in
//! a tick is reported back through [`Feedback`] events so frontends can play
//! effects without polling internal state.
//!
//! Beyond the classic falling-piece loop there are three creature systems:
//! gap fillers that patch holes in the stack, a self-relocating elongated
//! piece that crawls to better placements after locking, and a prowling
//! remover that naps on the stack or claws single blocks away.

pub mod board;
pub mod filler;
pub mod line_clear;
pub mod piece_generators;
pub mod pieces;
pub mod relocator;
pub mod remover;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::rngs::ThreadRng;
use rand::Rng;

pub use board::{Board, Coord, LineRow, HEIGHT, WIDTH};
pub use filler::GapFiller;
pub use line_clear::LineClearAnimation;
pub use piece_generators::{PieceDraw, PieceGenerator};
pub use pieces::{CrazyKind, PieceKind, Shape, Tile};
pub use relocator::{bend_score, BendShape, RelocatorSession, MAX_PHASES};
pub use remover::{Remover, RemoverMode, RemoverOutcome};

pub type GameTime = Duration;
pub type FeedbackEvents = Vec<(GameTime, Feedback)>;

/// Gravity never drops faster than this, regardless of level.
pub const MIN_DROP_INTERVAL: Duration = Duration::from_millis(50);
/// Hard drop awards this per cell descended.
const HARD_DROP_SCORE_PER_CELL: u32 = 2;
/// Locking the creature piece awards this once, before any relocation.
const RELOCATOR_LOCK_BONUS: u32 = 50;
/// Per-line base for the clear bonus, multiplied by the level.
const LINE_SCORE: u32 = 100;

/// Converts a per-frame probability (tuned against a nominal 60 fps loop)
/// into a per-tick probability for an arbitrary `dt`.
pub fn frame_chance(per_frame: f64, dt: Duration) -> f64 {
    (per_frame * dt.as_secs_f64() * 60.0).clamp(0.0, 1.0)
}

/// Gravity pacing presets.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl Difficulty {
    /// Drop interval at level 1.
    pub fn base_drop_interval(self) -> Duration {
        Duration::from_millis(match self {
            Difficulty::Easy => 1500,
            Difficulty::Normal => 1000,
            Difficulty::Hard => 600,
            Difficulty::Expert => 300,
        })
    }

    /// How much the drop interval shrinks per level gained.
    pub fn speed_step(self) -> Duration {
        Duration::from_millis(match self {
            Difficulty::Easy => 50,
            Difficulty::Normal => 100,
            Difficulty::Hard => 150,
            Difficulty::Expert => 200,
        })
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        })
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub struct UnknownDifficulty(pub String);

impl fmt::Display for UnknownDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown difficulty {:?} (expected easy, normal, hard or expert)",
            self.0
        )
    }
}

impl std::error::Error for UnknownDifficulty {}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(UnknownDifficulty(s.to_owned())),
        }
    }
}

/// Everything tunable about a game, fixed at construction.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub crazy_enabled: bool,
    pub fillers_enabled: bool,
    pub relocator_enabled: bool,
    pub remover_enabled: bool,
    /// Per-spawn chance of an oversized novelty shape.
    pub crazy_chance: f64,
    /// Per-spawn chance of the creature piece.
    pub relocator_chance: f64,
    pub line_clear_duration: Duration,
    pub relocation_phase_duration: Duration,
    pub relocation_pause: Duration,
    pub max_fillers: usize,
    pub filler_spawn_chance: f64,
    pub filler_fill_chance: f64,
    pub filler_max_age: Duration,
    pub remover_spawn_chance: f64,
    pub remover_leave_chance: f64,
    pub remover_rest_chance: f64,
    pub remover_action_interval: Duration,
    pub remover_rest_duration: Duration,
    pub remover_claw_duration: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            crazy_enabled: true,
            fillers_enabled: true,
            relocator_enabled: true,
            remover_enabled: true,
            crazy_chance: 0.15,
            relocator_chance: 0.10,
            line_clear_duration: Duration::from_millis(500),
            relocation_phase_duration: Duration::from_secs(2),
            relocation_pause: Duration::from_millis(500),
            max_fillers: 15,
            filler_spawn_chance: 0.02,
            filler_fill_chance: 0.1,
            filler_max_age: Duration::from_secs(5),
            remover_spawn_chance: 0.005,
            remover_leave_chance: 0.002,
            remover_rest_chance: 0.5,
            remover_action_interval: Duration::from_secs(3),
            remover_rest_duration: Duration::from_secs(4),
            remover_claw_duration: Duration::from_millis(1500),
        }
    }
}

/// One player command, at most one per tick.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    HardDrop,
    TogglePause,
}

/// Events that occurred during a tick, timestamped with game time.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feedback {
    PieceLocked,
    HardDrop,
    /// Rows matched; their removal animates for the given duration.
    LineClears(Vec<usize>, Duration),
    /// Rows physically removed and scored.
    LinesCleared { n: u32, score_bonus: u32 },
    GapFilled { x: i32, y: i32 },
    BlockClawed { x: i32, y: i32 },
    RelocationPhase(u32),
    GameOver { score: u32, lines: u32, level: u32 },
}

#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum TickError {
    /// The game has ended; the final state stays readable but no further
    /// ticks are accepted.
    GameEnded,
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickError::GameEnded => f.write_str("game has already ended"),
        }
    }
}

impl std::error::Error for TickError {}

/// The falling piece: footprint, lock tag, and anchor position.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivePiece {
    pub shape: Shape,
    pub tile: Tile,
    pub x: i32,
    pub y: i32,
}

impl ActivePiece {
    /// Board coordinates of the piece's filled cells.
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.shape
            .cells()
            .map(|(col, row)| (self.x + col as i32, self.y + row as i32))
    }
}

/// Observable game state. Mutable access exists for frontends layering
/// custom modes on top of the engine.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub board: Board,
    pub active: Option<ActivePiece>,
    pub next: PieceDraw,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub time: GameTime,
    pub paused: bool,
    pub ended: bool,
}

/// What the remover creature is currently up to, for rendering.
#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum RemoverActivity {
    Prowling,
    Napping,
    Clawing { target: Coord },
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub struct RemoverView {
    pub pos: (f32, f32),
    pub activity: RemoverActivity,
}

/// Borrowing view of everything a renderer needs for one frame.
pub struct RenderSnapshot<'a> {
    pub board: &'a Board,
    pub active: Option<&'a ActivePiece>,
    pub next: &'a PieceDraw,
    pub fillers: &'a [GapFiller],
    pub remover: Option<RemoverView>,
    pub clearing: Option<&'a LineClearAnimation>,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub time: GameTime,
    pub paused: bool,
    pub ended: bool,
}

pub struct Game {
    config: GameConfig,
    state: GameState,
    generator: PieceGenerator,
    rng: ThreadRng,
    drop_timer: Duration,
    line_clear: Option<LineClearAnimation>,
    sessions: Vec<RelocatorSession>,
    fillers: Vec<GapFiller>,
    remover: Option<Remover>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let generator = PieceGenerator {
            relocator_chance: config.relocator_enabled.then_some(config.relocator_chance),
            crazy_chance: config.crazy_enabled.then_some(config.crazy_chance),
        };
        let mut rng = rand::thread_rng();
        let next = generator.draw(&mut rng);
        let mut game = Self {
            config,
            state: GameState {
                board: Board::new(),
                active: None,
                next,
                score: 0,
                lines: 0,
                level: 1,
                time: Duration::ZERO,
                paused: false,
                ended: false,
            },
            generator,
            rng,
            drop_timer: Duration::ZERO,
            line_clear: None,
            sessions: Vec::new(),
            fillers: Vec::new(),
            remover: None,
        };
        // The board is empty, so the first spawn cannot fail.
        game.spawn_next(&mut Vec::new());
        game
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Advances the simulation by `dt`, applying at most one command.
    ///
    /// Subsystems run in a fixed order each tick: line-clear animation,
    /// relocation sessions, gap fillers, the remover, player input, then
    /// gravity. Pausing freezes all of them, including game time.
    pub fn tick(
        &mut self,
        input: Option<Command>,
        dt: Duration,
    ) -> Result<FeedbackEvents, TickError> {
        if self.state.ended {
            return Err(TickError::GameEnded);
        }
        if input == Some(Command::TogglePause) {
            self.state.paused = !self.state.paused;
        }
        if self.state.paused {
            return Ok(Vec::new());
        }
        self.state.time += dt;
        let mut feedback = Vec::new();
        self.advance_line_clear(dt, &mut feedback);
        self.sessions.retain_mut(|session| {
            !session.advance(&mut self.state.board, &self.config, dt, &mut feedback)
        });
        if self.config.fillers_enabled {
            self.state.score += filler::advance_swarm(
                &mut self.fillers,
                &mut self.state.board,
                &self.config,
                &mut self.rng,
                dt,
                &mut feedback,
            );
        }
        self.advance_remover(dt, &mut feedback);
        match input {
            Some(Command::TogglePause) | None => {}
            Some(command) => self.apply_command(command, &mut feedback),
        }
        if !self.state.ended {
            self.advance_drop(dt, &mut feedback);
        }
        let time = self.state.time;
        Ok(feedback.into_iter().map(|f| (time, f)).collect())
    }

    pub fn snapshot(&self) -> RenderSnapshot<'_> {
        let remover = self.remover.as_ref().map(|r| RemoverView {
            pos: r.pos,
            activity: match r.mode {
                RemoverMode::Wandering => RemoverActivity::Prowling,
                RemoverMode::Resting { .. } => RemoverActivity::Napping,
                RemoverMode::Removing { cell, .. } => RemoverActivity::Clawing { target: cell },
            },
        });
        RenderSnapshot {
            board: &self.state.board,
            active: self.state.active.as_ref(),
            next: &self.state.next,
            fillers: &self.fillers,
            remover,
            clearing: self.line_clear.as_ref(),
            score: self.state.score,
            lines: self.state.lines,
            level: self.state.level,
            time: self.state.time,
            paused: self.state.paused,
            ended: self.state.ended,
        }
    }

    fn drop_interval(&self) -> Duration {
        let base = self.config.difficulty.base_drop_interval();
        let step = self.config.difficulty.speed_step();
        base.saturating_sub(step * (self.state.level - 1))
            .max(MIN_DROP_INTERVAL)
    }

    fn protected_cell(&self) -> Option<Coord> {
        self.remover.as_ref().and_then(Remover::resting_cell)
    }

    fn advance_line_clear(&mut self, dt: Duration, feedback: &mut Vec<Feedback>) {
        let Some(anim) = &mut self.line_clear else {
            return;
        };
        if !anim.advance(dt) {
            return;
        }
        let rows = std::mem::take(&mut anim.rows);
        self.line_clear = None;
        self.state.board.remove_rows(&rows);
        let n = rows.len() as u32;
        let score_bonus = n * LINE_SCORE * self.state.level;
        self.state.score += score_bonus;
        self.state.lines += n;
        self.state.level = self.state.lines / 10 + 1;
        feedback.push(Feedback::LinesCleared { n, score_bonus });
    }

    fn advance_remover(&mut self, dt: Duration, feedback: &mut Vec<Feedback>) {
        if !self.config.remover_enabled {
            return;
        }
        match &mut self.remover {
            Some(remover) => {
                let outcome = remover.advance(
                    &mut self.state.board,
                    &self.config,
                    &mut self.rng,
                    dt,
                    feedback,
                );
                if matches!(outcome, RemoverOutcome::Despawn) {
                    self.remover = None;
                }
            }
            None => {
                if self
                    .rng
                    .gen_bool(frame_chance(self.config.remover_spawn_chance, dt))
                {
                    self.remover = Some(Remover::spawn(&mut self.rng));
                }
            }
        }
    }

    fn apply_command(&mut self, command: Command, feedback: &mut Vec<Feedback>) {
        let protected = self.protected_cell();
        let Some(active) = &mut self.state.active else {
            return;
        };
        let board = &self.state.board;
        match command {
            // Lateral moves and rotation fail silently; there are no wall
            // kicks.
            Command::MoveLeft => {
                if board.is_free(&active.shape, active.x - 1, active.y, protected) {
                    active.x -= 1;
                }
            }
            Command::MoveRight => {
                if board.is_free(&active.shape, active.x + 1, active.y, protected) {
                    active.x += 1;
                }
            }
            Command::Rotate => {
                let rotated = active.shape.rotated_cw();
                if board.is_free(&rotated, active.x, active.y, protected) {
                    active.shape = rotated;
                }
            }
            // Soft drop scores nothing.
            Command::SoftDrop => {
                if board.is_free(&active.shape, active.x, active.y + 1, protected) {
                    active.y += 1;
                }
            }
            Command::HardDrop => {
                // The creature piece teleports to the deepest valid row in
                // its column, passing through overhangs; everything else
                // descends cell by cell.
                let target = if active.tile == Tile::Relocator {
                    (active.y.max(0)..HEIGHT as i32)
                        .rev()
                        .find(|&y| board.is_free(&active.shape, active.x, y, protected))
                } else {
                    let mut y = active.y;
                    while board.is_free(&active.shape, active.x, y + 1, protected) {
                        y += 1;
                    }
                    Some(y)
                };
                match target {
                    Some(target) => {
                        let dropped = (target - active.y).max(0) as u32;
                        active.y = target;
                        self.state.score += HARD_DROP_SCORE_PER_CELL * dropped;
                        feedback.push(Feedback::HardDrop);
                        self.lock_active(feedback);
                    }
                    // The creature piece has no valid resting row at all:
                    // terminal condition.
                    None => {
                        self.state.ended = true;
                        self.state.active = None;
                        feedback.push(Feedback::GameOver {
                            score: self.state.score,
                            lines: self.state.lines,
                            level: self.state.level,
                        });
                    }
                }
            }
            Command::TogglePause => {}
        }
    }

    fn advance_drop(&mut self, dt: Duration, feedback: &mut Vec<Feedback>) {
        self.drop_timer += dt;
        let interval = self.drop_interval();
        while self.drop_timer >= interval {
            self.drop_timer -= interval;
            let protected = self.protected_cell();
            let Some(active) = &self.state.active else {
                break;
            };
            if self
                .state
                .board
                .is_free(&active.shape, active.x, active.y + 1, protected)
            {
                if let Some(active) = &mut self.state.active {
                    active.y += 1;
                }
            } else {
                self.lock_active(feedback);
                if self.state.ended {
                    break;
                }
            }
        }
    }

    fn lock_active(&mut self, feedback: &mut Vec<Feedback>) {
        let Some(active) = self.state.active.take() else {
            return;
        };
        self.state
            .board
            .commit(&active.shape, active.x, active.y, active.tile);
        feedback.push(Feedback::PieceLocked);
        if active.tile == Tile::Relocator {
            self.state.score += RELOCATOR_LOCK_BONUS;
            let cells: Vec<Coord> = active.cells().filter(|&(_, y)| y >= 0).collect();
            // A session only starts from a fully on-board creature.
            if cells.len() == active.shape.filled_count() {
                self.sessions.push(RelocatorSession::new(cells));
            }
        }
        let mut fresh = self.state.board.full_rows();
        if let Some(anim) = &self.line_clear {
            fresh.retain(|row| !anim.rows.contains(row));
        }
        if !fresh.is_empty() {
            match &mut self.line_clear {
                Some(anim) => anim.merge_rows(&fresh),
                None => {
                    self.line_clear = Some(LineClearAnimation::new(
                        fresh.clone(),
                        self.config.line_clear_duration,
                    ));
                }
            }
            feedback.push(Feedback::LineClears(fresh, self.config.line_clear_duration));
        }
        self.spawn_next(feedback);
    }

    fn spawn_next(&mut self, feedback: &mut Vec<Feedback>) {
        self.drop_timer = Duration::ZERO;
        let protected = self.protected_cell();
        let mut draw = std::mem::replace(&mut self.state.next, self.generator.draw(&mut self.rng));
        let mut x = Self::centered_x(&draw.shape);
        if draw.tile == Tile::Relocator && !self.state.board.is_free(&draw.shape, x, 0, protected) {
            // The wide creature piece slides to any free spawn column; if
            // nowhere fits it yields to a standard piece instead of ending
            // the game.
            let limit = WIDTH as i32 - draw.shape.width() as i32;
            match (0..=limit).find(|&fx| self.state.board.is_free(&draw.shape, fx, 0, protected)) {
                Some(fx) => x = fx,
                None => {
                    draw = self.generator.draw_standard(&mut self.rng);
                    x = Self::centered_x(&draw.shape);
                }
            }
        }
        if !self.state.board.is_free(&draw.shape, x, 0, protected) {
            self.state.ended = true;
            self.state.active = None;
            feedback.push(Feedback::GameOver {
                score: self.state.score,
                lines: self.state.lines,
                level: self.state.level,
            });
            return;
        }
        self.state.active = Some(ActivePiece {
            shape: draw.shape,
            tile: draw.tile,
            x,
            y: 0,
        });
    }

    fn centered_x(shape: &Shape) -> i32 {
        (WIDTH as i32 - shape.width() as i32) / 2
    }
}
