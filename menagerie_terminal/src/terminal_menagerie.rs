use std::{
    collections::{HashMap, VecDeque},
    fs::File,
    io::{self, Read, Write},
    sync::mpsc,
    time::{Duration, Instant},
};

use crossterm::{
    cursor,
    event::KeyCode,
    style, terminal, ExecutableCommand,
};
use serde_with::serde_as;

use menagerie_engine::{Command, Game, GameConfig, TickError};

use crate::game_input_handler::{CommandSignal, CrosstermHandler};
use crate::game_renderer::GameRenderer;

#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct GameFinishedStats {
    timestamp: String,
    config: GameConfig,
    score: u32,
    lines: u32,
    level: u32,
}

#[serde_as]
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Settings {
    pub game_fps: f64,
    // `KeyCode` keys are not valid JSON object keys.
    #[serde_as(as = "Vec<(_, _)>")]
    pub keybinds: HashMap<KeyCode, Command>,
}

#[derive(Debug)]
pub struct App<T: Write> {
    pub term: T,
    pub settings: Settings,
    config: GameConfig,
    games_finished: Vec<GameFinishedStats>,
}

impl<T: Write> Drop for App<T> {
    fn drop(&mut self) {
        let _ = Self::save_games(&self.games_finished);
        // Console epilogue: de-initialization.
        let _ = terminal::disable_raw_mode();
        let _ = self.term.execute(style::ResetColor);
        let _ = self.term.execute(cursor::Show);
    }
}

impl<T: Write> App<T> {
    pub const SAVE_FILE: &'static str = "./menagerie_terminal_scores.json";

    pub fn new(mut terminal: T, fps: u32, config: GameConfig) -> Self {
        // Console prologue: initialization.
        let _ = terminal.execute(terminal::EnterAlternateScreen);
        let _ = terminal.execute(terminal::SetTitle("Menagerie Terminal"));
        let _ = terminal.execute(cursor::Hide);
        let _ = terminal::enable_raw_mode();
        let keybinds = HashMap::from([
            (KeyCode::Left, Command::MoveLeft),
            (KeyCode::Right, Command::MoveRight),
            (KeyCode::Up, Command::Rotate),
            (KeyCode::Down, Command::SoftDrop),
            (KeyCode::Char(' '), Command::HardDrop),
            (KeyCode::Char('p'), Command::TogglePause),
        ]);
        let settings = Settings {
            keybinds,
            game_fps: fps.into(),
        };
        let games_finished = Self::load_games().unwrap_or_default();
        Self {
            term: terminal,
            settings,
            config,
            games_finished,
        }
    }

    fn save_games(games_finished: &[GameFinishedStats]) -> io::Result<()> {
        let save_str = serde_json::to_string(games_finished)?;
        let mut file = File::create(Self::SAVE_FILE)?;
        file.write_all(save_str.as_bytes())?;
        Ok(())
    }

    fn load_games() -> io::Result<Vec<GameFinishedStats>> {
        let mut file = File::open(Self::SAVE_FILE)?;
        let mut save_str = String::new();
        file.read_to_string(&mut save_str)?;
        let games_finished = serde_json::from_str(&save_str)?;
        Ok(games_finished)
    }

    pub fn run(&mut self) -> io::Result<String> {
        let mut game = Game::new(self.config.clone());
        let mut renderer = GameRenderer::default();
        // Channel over which the input thread sends `Command`s / interrupt.
        let (tx, rx) = mpsc::channel::<CommandSignal>();
        let _input_handler = CrosstermHandler::new(&tx, &self.settings.keybinds);
        let mut queued = VecDeque::<Command>::new();
        let session_started = Instant::now();
        let mut last_tick = session_started;
        let mut f = 0u32;
        // Game loop: idle until the frame deadline while queueing inputs,
        // then tick the engine and render.
        let msg = 'render_loop: loop {
            f += 1;
            let next_frame_at = session_started
                + Duration::from_secs_f64(f64::from(f) / self.settings.game_fps);
            'idle_loop: loop {
                let idle_remaining = next_frame_at.saturating_duration_since(Instant::now());
                match rx.recv_timeout(idle_remaining) {
                    Ok(None) => {
                        break 'render_loop format!(
                            "game aborted (score {})",
                            game.state().score
                        );
                    }
                    Ok(Some(command)) => {
                        queued.push_back(command);
                        continue 'idle_loop;
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => break 'idle_loop,
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        break 'render_loop String::from("input channel closed");
                    }
                }
            }
            let now = Instant::now();
            let dt = now.saturating_duration_since(last_tick);
            last_tick = now;
            // The engine takes at most one command per tick; surplus queued
            // commands are applied through zero-duration ticks.
            let mut events = Vec::new();
            let mut step = dt;
            loop {
                match game.tick(queued.pop_front(), step) {
                    Ok(evts) => events.extend(evts),
                    Err(TickError::GameEnded) => break,
                }
                if queued.is_empty() {
                    break;
                }
                step = Duration::ZERO;
            }
            renderer.render(&mut self.term, &game, events)?;
            if game.state().ended {
                let state = game.state();
                self.games_finished.push(GameFinishedStats {
                    timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M").to_string(),
                    config: self.config.clone(),
                    score: state.score,
                    lines: state.lines,
                    level: state.level,
                });
                break 'render_loop format!(
                    "game over (score {}, lines {}, level {})",
                    state.score, state.lines, state.level
                );
            }
        };
        let _ = self.term.execute(terminal::LeaveAlternateScreen);
        Ok(msg)
    }
}
