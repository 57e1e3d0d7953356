use std::time::Duration;

use rand::{rngs::ThreadRng, Rng};

use crate::board::{Board, Coord, HEIGHT, WIDTH};
use crate::{frame_chance, Feedback, GameConfig};

const MARGIN: f32 = 1.0;
/// Wandering drift speed bounds, cells per second.
const MAX_SPEED: f32 = 1.5;

/// Behavioral sub-state of the remover creature.
#[derive(PartialEq, Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemoverMode {
    Wandering,
    /// Napping on top of a column; the cell underneath is protected from
    /// new piece placement for the duration.
    Resting {
        cell: Coord,
        remaining: Duration,
    },
    /// Clawing at an occupied cell; the cell is cleared when the timer runs
    /// out. Score-neutral.
    Removing {
        cell: Coord,
        remaining: Duration,
    },
}

/// Single-instance wandering entity that periodically rests on the stack or
/// removes one occupied cell.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Remover {
    pub pos: (f32, f32),
    pub vel: (f32, f32),
    pub mode: RemoverMode,
    action_timer: Duration,
}

/// What the per-tick update decided about the entity's lifetime.
#[must_use]
pub enum RemoverOutcome {
    Keep,
    Despawn,
}

impl Remover {
    /// Spawns at a random point on one of the four board edges.
    pub fn spawn(rng: &mut ThreadRng) -> Self {
        let drift = |rng: &mut ThreadRng| rng.gen_range(-MAX_SPEED..MAX_SPEED);
        let pos = match rng.gen_range(0..4) {
            0 => (rng.gen_range(0.0..WIDTH as f32), 0.0),
            1 => (WIDTH as f32, rng.gen_range(0.0..HEIGHT as f32)),
            2 => (rng.gen_range(0.0..WIDTH as f32), HEIGHT as f32),
            _ => (0.0, rng.gen_range(0.0..HEIGHT as f32)),
        };
        Self {
            pos,
            vel: (drift(rng), drift(rng)),
            mode: RemoverMode::Wandering,
            action_timer: Duration::ZERO,
        }
    }

    /// The cell shielded from piece placement, while resting.
    pub fn resting_cell(&self) -> Option<Coord> {
        match self.mode {
            RemoverMode::Resting { cell, .. } => Some(cell),
            _ => None,
        }
    }

    pub fn advance(
        &mut self,
        board: &mut Board,
        config: &GameConfig,
        rng: &mut ThreadRng,
        dt: Duration,
        feedback: &mut Vec<Feedback>,
    ) -> RemoverOutcome {
        match self.mode {
            RemoverMode::Wandering => {
                if rng.gen_bool(frame_chance(config.remover_leave_chance, dt)) {
                    return RemoverOutcome::Despawn;
                }
                let scale = dt.as_secs_f32();
                self.pos.0 = (self.pos.0 + self.vel.0 * scale).clamp(-MARGIN, WIDTH as f32 + MARGIN);
                self.pos.1 =
                    (self.pos.1 + self.vel.1 * scale).clamp(-MARGIN, HEIGHT as f32 + MARGIN);
                // Slow random heading changes.
                let jitter = 4.0 * scale;
                self.vel.0 = (self.vel.0 + rng.gen_range(-jitter..=jitter))
                    .clamp(-MAX_SPEED, MAX_SPEED);
                self.vel.1 = (self.vel.1 + rng.gen_range(-jitter..=jitter))
                    .clamp(-MAX_SPEED, MAX_SPEED);
                self.action_timer += dt;
                if self.action_timer >= config.remover_action_interval {
                    self.action_timer = Duration::ZERO;
                    self.choose_action(board, config, rng);
                }
                RemoverOutcome::Keep
            }
            RemoverMode::Resting {
                cell,
                ref mut remaining,
            } => {
                *remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.mode = RemoverMode::Wandering;
                } else {
                    self.pos = (cell.0 as f32 + 0.5, cell.1 as f32 + 0.5);
                }
                RemoverOutcome::Keep
            }
            RemoverMode::Removing {
                cell,
                ref mut remaining,
            } => {
                *remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    board.set_cell(cell.0, cell.1, None);
                    feedback.push(Feedback::BlockClawed {
                        x: cell.0,
                        y: cell.1,
                    });
                    self.mode = RemoverMode::Wandering;
                } else {
                    self.pos = (cell.0 as f32 + 0.5, cell.1 as f32 + 0.5);
                }
                RemoverOutcome::Keep
            }
        }
    }

    fn choose_action(&mut self, board: &Board, config: &GameConfig, rng: &mut ThreadRng) {
        if rng.gen_bool(config.remover_rest_chance) {
            // Snap to the topmost occupied cell of a random non-empty column.
            let tops: Vec<Coord> = (0..WIDTH as i32)
                .filter_map(|x| board.column_top(x))
                .collect();
            if tops.is_empty() {
                return;
            }
            let top = tops[rng.gen_range(0..tops.len())];
            // The perch is the empty cell above the column top; while the
            // creature naps there no piece may occupy it.
            self.mode = RemoverMode::Resting {
                cell: (top.0, top.1 - 1),
                remaining: config.remover_rest_duration,
            };
        } else {
            let occupied = board.occupied_cells();
            if occupied.is_empty() {
                return;
            }
            let cell = occupied[rng.gen_range(0..occupied.len())];
            self.mode = RemoverMode::Removing {
                cell,
                remaining: config.remover_claw_duration,
            };
        }
    }
}
