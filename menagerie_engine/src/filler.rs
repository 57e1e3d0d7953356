use std::time::Duration;

use rand::{rngs::ThreadRng, Rng};

use crate::board::{Board, HEIGHT, WIDTH};
use crate::pieces::Tile;
use crate::{frame_chance, Feedback, GameConfig};

/// How far outside the board entities may drift before despawning, and how
/// far outside an edge they spawn. In cell units.
const MARGIN: f32 = 1.0;
/// Maximum lateral/vertical speed, cells per second.
const MAX_SPEED: f32 = 4.0;
/// A block above the candidate cell must be within this many rows for the
/// cell to count as a gap.
const GAP_REACH: i32 = 3;

pub const FILL_SCORE: u32 = 5;

/// One wandering gap-filler particle. Position is continuous, in cell units.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GapFiller {
    pub pos: (f32, f32),
    pub vel: (f32, f32),
    pub age: Duration,
}

impl GapFiller {
    /// Spawns at a random point just outside one of the four board edges,
    /// moving inward.
    pub fn spawn(rng: &mut ThreadRng) -> Self {
        let lateral = |rng: &mut ThreadRng| rng.gen_range(-2.0..2.0);
        let inward = |rng: &mut ThreadRng| rng.gen_range(2.0..6.0);
        let (pos, vel) = match rng.gen_range(0..4) {
            // Top.
            0 => (
                (rng.gen_range(0.0..WIDTH as f32), -MARGIN),
                (lateral(rng), inward(rng)),
            ),
            // Right.
            1 => (
                (WIDTH as f32 + MARGIN, rng.gen_range(0.0..HEIGHT as f32)),
                (-inward(rng), lateral(rng)),
            ),
            // Bottom.
            2 => (
                (rng.gen_range(0.0..WIDTH as f32), HEIGHT as f32 + MARGIN),
                (lateral(rng), -inward(rng)),
            ),
            // Left.
            _ => (
                (-MARGIN, rng.gen_range(0.0..HEIGHT as f32)),
                (inward(rng), lateral(rng)),
            ),
        };
        Self {
            pos,
            vel,
            age: Duration::ZERO,
        }
    }

    fn out_of_bounds(&self) -> bool {
        self.pos.0 < -MARGIN
            || self.pos.0 > WIDTH as f32 + MARGIN
            || self.pos.1 < -MARGIN
            || self.pos.1 > HEIGHT as f32 + MARGIN
    }

    pub fn board_cell(&self) -> (i32, i32) {
        (self.pos.0.floor() as i32, self.pos.1.floor() as i32)
    }
}

/// True iff the cell qualifies for a passive repair: empty, with a
/// non-creature block not far above it in the same column, and walled in by
/// at least two occupied orthogonal neighbors (so wide-open areas are left
/// alone).
pub fn should_fill(board: &Board, x: i32, y: i32) -> bool {
    if x < 0 || x >= WIDTH as i32 || y < 0 || y >= HEIGHT as i32 {
        return false;
    }
    if board.cell(x, y).is_some() {
        return false;
    }
    let roofed = (1..=GAP_REACH)
        .any(|d| matches!(board.cell(x, y - d), Some(tile) if !tile.is_creature()));
    if !roofed {
        return false;
    }
    let neighbors = [(x, y - 1), (x - 1, y), (x + 1, y), (x, y + 1)]
        .iter()
        .filter(|&&(nx, ny)| board.cell(nx, ny).is_some())
        .count();
    neighbors >= 2
}

/// Advances the whole swarm one tick: stochastic spawn, motion integration,
/// opportunistic fills, and despawns. Returns the score gained.
pub fn advance_swarm(
    swarm: &mut Vec<GapFiller>,
    board: &mut Board,
    config: &GameConfig,
    rng: &mut ThreadRng,
    dt: Duration,
    feedback: &mut Vec<Feedback>,
) -> u32 {
    let mut score = 0;
    if swarm.len() < config.max_fillers && rng.gen_bool(frame_chance(config.filler_spawn_chance, dt))
    {
        swarm.push(GapFiller::spawn(rng));
    }
    let scale = dt.as_secs_f32();
    swarm.retain_mut(|filler| {
        filler.pos.0 += filler.vel.0 * scale;
        filler.pos.1 += filler.vel.1 * scale;
        // Bounded random perturbation, clamped to the max speed.
        let jitter = 30.0 * scale;
        filler.vel.0 = (filler.vel.0 + rng.gen_range(-jitter..=jitter)).clamp(-MAX_SPEED, MAX_SPEED);
        filler.vel.1 = (filler.vel.1 + rng.gen_range(-jitter..=jitter)).clamp(-MAX_SPEED, MAX_SPEED);
        filler.age += dt;
        if rng.gen_bool(frame_chance(config.filler_fill_chance, dt)) {
            let (x, y) = filler.board_cell();
            if should_fill(board, x, y) {
                board.set_cell(x, y, Some(Tile::Filler));
                score += FILL_SCORE;
                feedback.push(Feedback::GapFilled { x, y });
                return false;
            }
        }
        !(filler.out_of_bounds() || filler.age > config.filler_max_age)
    });
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;

    fn walled_gap_board() -> Board {
        // Column 4 has a roof at row 15 and occupied cells flanking (4, 17).
        let mut board = Board::new();
        board.set_cell(4, 15, Some(Tile::Piece(PieceKind::O)));
        board.set_cell(3, 17, Some(Tile::Piece(PieceKind::O)));
        board.set_cell(5, 17, Some(Tile::Piece(PieceKind::O)));
        board.set_cell(4, 16, Some(Tile::Piece(PieceKind::O)));
        board
    }

    #[test]
    fn fills_walled_gap_under_roof() {
        let board = walled_gap_board();
        assert!(should_fill(&board, 4, 17));
    }

    #[test]
    fn rejects_cell_with_single_neighbor() {
        let mut board = Board::new();
        board.set_cell(4, 14, Some(Tile::Piece(PieceKind::O)));
        board.set_cell(3, 16, Some(Tile::Piece(PieceKind::O)));
        // Roofed within reach but only one occupied neighbor.
        assert!(!should_fill(&board, 4, 16));
    }

    #[test]
    fn rejects_cell_without_nearby_roof() {
        let mut board = Board::new();
        // Neighbors present, but the nearest block above is out of reach.
        board.set_cell(4, 10, Some(Tile::Piece(PieceKind::O)));
        board.set_cell(3, 17, Some(Tile::Piece(PieceKind::O)));
        board.set_cell(5, 17, Some(Tile::Piece(PieceKind::O)));
        assert!(!should_fill(&board, 4, 17));
    }

    #[test]
    fn creature_material_is_not_a_roof() {
        let mut board = Board::new();
        board.set_cell(4, 16, Some(Tile::Relocator));
        board.set_cell(3, 17, Some(Tile::Piece(PieceKind::O)));
        board.set_cell(5, 17, Some(Tile::Piece(PieceKind::O)));
        assert!(!should_fill(&board, 4, 17));
    }

    #[test]
    fn rejects_occupied_cell() {
        let mut board = walled_gap_board();
        board.set_cell(4, 17, Some(Tile::Filler));
        assert!(!should_fill(&board, 4, 17));
    }

    #[test]
    fn spawned_filler_moves_inward() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let filler = GapFiller::spawn(&mut rng);
            let (x, y) = filler.pos;
            if x < 0.0 {
                assert!(filler.vel.0 > 0.0);
            } else if x > WIDTH as f32 {
                assert!(filler.vel.0 < 0.0);
            } else if y < 0.0 {
                assert!(filler.vel.1 > 0.0);
            } else {
                assert!(filler.vel.1 < 0.0);
            }
        }
    }
}
