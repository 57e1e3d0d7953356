use std::collections::{HashSet, VecDeque};
use std::f32::consts::PI;
use std::time::Duration;

use crate::board::{Board, Coord, HEIGHT, WIDTH};
use crate::pieces::{Shape, Tile};
use crate::{Feedback, GameConfig};

/// A relocation session runs at most this many phases.
pub const MAX_PHASES: u32 = 5;
/// Interpolation steps per phase path (waypoints 0..=40).
const WAYPOINT_STEPS: usize = 40;
/// Peak of the sinusoidal vertical bend mid-transition, in cells.
const BEND_AMPLITUDE: f32 = 3.0;
/// Phases after the first need at least this score to justify another move.
const MIN_FOLLOWUP_SCORE: i32 = 30;
/// The creature always occupies exactly seven cells.
const CELL_COUNT: usize = 7;

/// The six footprints the creature can read as or bend into: straight
/// horizontal/vertical, and four bent boxes filled row-major until seven
/// cells are placed.
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BendShape {
    Flat,
    Upright,
    Box4x2,
    Box3x3,
    Box5x2,
    Box2x4,
}

impl BendShape {
    pub const ALL: [BendShape; 6] = [
        BendShape::Flat,
        BendShape::Upright,
        BendShape::Box4x2,
        BendShape::Box3x3,
        BendShape::Box5x2,
        BendShape::Box2x4,
    ];

    pub fn footprint(self) -> Shape {
        let (width, height) = match self {
            BendShape::Flat => (7, 1),
            BendShape::Upright => (1, 7),
            BendShape::Box4x2 => (4, 2),
            BendShape::Box3x3 => (3, 3),
            BendShape::Box5x2 => (5, 2),
            BendShape::Box2x4 => (2, 4),
        };
        let mut rows = vec![vec![false; width]; height];
        let mut left = CELL_COUNT;
        'fill: for row in rows.iter_mut() {
            for cell in row.iter_mut() {
                *cell = true;
                left -= 1;
                if left == 0 {
                    break 'fill;
                }
            }
        }
        Shape::from_rows(rows)
    }
}

/// Scores a candidate placement of `shape` at `(x, y)` against the
/// pre-removal board (the creature's current cells still committed). Pure:
/// identical inputs always yield the identical score.
pub fn bend_score(board: &Board, shape: &Shape, x: i32, y: i32, current_y: i32) -> i32 {
    // Moving up is forbidden outright.
    if y < current_y {
        return -1;
    }
    let mut score = 0i32;
    let mut filled = 0u32;
    let mut gap_fills = 0u32;
    let mut bridges = 0u32;
    let mut clear_potential = 0u32;
    for (col, row) in shape.cells() {
        let cx = x + col as i32;
        let cy = y + row as i32;
        if cx < 0 || cx >= WIDTH as i32 || cy < 0 || cy >= HEIGHT as i32 {
            continue;
        }
        // Only newly-filled empty cells contribute; overlap with the
        // creature's own current cells reads as occupied here, which is
        // what makes no-op moves score badly.
        if board.cell(cx, cy).is_some() {
            continue;
        }
        filled += 1;
        score += 30;
        // Gap fill: a non-creature block anywhere above in this column.
        let mut empties = 0;
        for yy in (0..cy).rev() {
            match board.cell(cx, yy) {
                Some(tile) if !tile.is_creature() => {
                    gap_fills += 1;
                    score += 60 + 8 * empties;
                    break;
                }
                Some(_) => {}
                None => empties += 1,
            }
        }
        // Bridging on top of a solid block.
        if matches!(board.cell(cx, cy + 1), Some(tile) if !tile.is_creature()) {
            bridges += 1;
            score += 25;
        }
        // Line-clear potential from adjacent solid blocks.
        if matches!(board.cell(cx, cy - 1), Some(tile) if !tile.is_creature()) {
            clear_potential += 1;
            score += 15;
        }
        if matches!(board.cell(cx - 1, cy), Some(tile) if !tile.is_creature()) {
            clear_potential += 1;
            score += 10;
        }
        if matches!(board.cell(cx + 1, cy), Some(tile) if !tile.is_creature()) {
            clear_potential += 1;
            score += 10;
        }
    }
    score += (HEIGHT as i32 - y) * 6;
    if shape.height() > 1 {
        score += 25;
    }
    if gap_fills >= 2 {
        score += 40;
    }
    if bridges >= 2 {
        score += 35;
    }
    if clear_potential >= 3 {
        score += 30;
    }
    if filled == 0 {
        score -= 200;
    }
    if y > current_y {
        score += 20;
    }
    score
}

/// Matches a set of board cells against the known footprints. Returns the
/// bounding-box anchor and the footprint, or `None` if the cells no longer
/// read as the creature (line clears or the remover mutated them).
fn detect_footprint(cells: &[Coord]) -> Option<(Coord, BendShape)> {
    if cells.len() != CELL_COUNT {
        return None;
    }
    let min_x = cells.iter().map(|c| c.0).min()?;
    let min_y = cells.iter().map(|c| c.1).min()?;
    let offsets: HashSet<(usize, usize)> = cells
        .iter()
        .map(|&(x, y)| ((x - min_x) as usize, (y - min_y) as usize))
        .collect();
    BendShape::ALL
        .into_iter()
        .find(|kind| kind.footprint().cells().collect::<HashSet<_>>() == offsets)
        .map(|kind| ((min_x, min_y), kind))
}

/// Anchors reachable from `start` via {down, left, right} moves (never up)
/// with `shape`, in deterministic breadth-first order.
fn reachable(scratch: &Board, shape: &Shape, start: Coord) -> Vec<Coord> {
    if !scratch.is_free(shape, start.0, start.1, None) {
        return Vec::new();
    }
    let mut order = Vec::new();
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some((x, y)) = queue.pop_front() {
        order.push((x, y));
        for (dx, dy) in [(0, 1), (-1, 0), (1, 0)] {
            let next = (x + dx, y + dy);
            if !seen.contains(&next) && scratch.is_free(shape, next.0, next.1, None) {
                seen.insert(next);
                queue.push_back(next);
            }
        }
    }
    order
}

/// Interpolated path between two anchors: ease-in-ease-out quadratic timing
/// with a downward sinusoidal bend peaking mid-transition. Waypoints that
/// would move above the starting row or collide are discarded.
fn waypoints(scratch: &Board, shape: &Shape, from: Coord, to: Coord, current_y: i32) -> Vec<Coord> {
    let mut pts = Vec::new();
    for step in 0..=WAYPOINT_STEPS {
        let f = step as f32 / WAYPOINT_STEPS as f32;
        let ease = if f < 0.5 {
            2.0 * f * f
        } else {
            1.0 - (-2.0 * f + 2.0).powi(2) / 2.0
        };
        let bend = (f * PI).sin() * BEND_AMPLITUDE;
        let x = (from.0 as f32 + (to.0 - from.0) as f32 * ease).round() as i32;
        let y = (from.1 as f32 + (to.1 - from.1) as f32 * ease + bend).round() as i32;
        if y < current_y || !scratch.is_free(shape, x, y, None) {
            continue;
        }
        if pts.last() != Some(&(x, y)) {
            pts.push((x, y));
        }
    }
    pts
}

#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Stage {
    Search,
    Move {
        shape: BendShape,
        path: Vec<Coord>,
        index: usize,
        elapsed: Duration,
    },
    Wait {
        remaining: Duration,
    },
}

/// Multi-phase self-relocation of a locked creature piece: search for a
/// better-scoring placement, animate towards it, settle, repeat.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelocatorSession {
    phase: u32,
    cells: Vec<Coord>,
    stage: Stage,
}

impl RelocatorSession {
    /// Starts a session for a creature piece whose cells were just
    /// committed to the board.
    pub fn new(cells: Vec<Coord>) -> Self {
        Self {
            phase: 0,
            cells,
            stage: Stage::Search,
        }
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// One tick of the session. Returns true once the session is over.
    pub fn advance(
        &mut self,
        board: &mut Board,
        config: &GameConfig,
        dt: Duration,
        feedback: &mut Vec<Feedback>,
    ) -> bool {
        match &mut self.stage {
            Stage::Search => match self.begin_phase(board) {
                Some((shape, path)) => {
                    feedback.push(Feedback::RelocationPhase(self.phase));
                    self.stage = Stage::Move {
                        shape,
                        path,
                        index: 0,
                        elapsed: Duration::ZERO,
                    };
                    false
                }
                // No improving placement: the session ends here.
                None => true,
            },
            Stage::Move {
                shape,
                path,
                index,
                elapsed,
            } => {
                *elapsed = (*elapsed + dt).min(config.relocation_phase_duration);
                let frac =
                    elapsed.as_secs_f32() / config.relocation_phase_duration.as_secs_f32();
                let target = ((path.len() - 1) as f32 * frac) as usize;
                if target != *index {
                    *index = target;
                    let footprint = shape.footprint();
                    let (x, y) = path[*index];
                    // Remove-then-place: clear the creature's old cells
                    // before committing the new ones.
                    for &(cx, cy) in &self.cells {
                        if board.cell(cx, cy) == Some(Tile::Relocator) {
                            board.set_cell(cx, cy, None);
                        }
                    }
                    board.commit(&footprint, x, y, Tile::Relocator);
                    self.cells = footprint
                        .cells()
                        .map(|(col, row)| (x + col as i32, y + row as i32))
                        .collect();
                }
                if *elapsed >= config.relocation_phase_duration {
                    self.stage = Stage::Wait {
                        remaining: config.relocation_pause,
                    };
                }
                false
            }
            Stage::Wait { remaining } => {
                *remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.phase += 1;
                    if self.phase >= MAX_PHASES {
                        return true;
                    }
                    self.stage = Stage::Search;
                }
                false
            }
        }
    }

    /// Candidate search for the current phase: locate the creature,
    /// enumerate placements (exhaustive for phase 0, reachable-only after),
    /// score them, and build the animation path to the winner.
    fn begin_phase(&self, board: &Board) -> Option<(BendShape, Vec<Coord>)> {
        if self
            .cells
            .iter()
            .any(|&(x, y)| board.cell(x, y) != Some(Tile::Relocator))
        {
            return None;
        }
        let (anchor, _current) = detect_footprint(&self.cells)?;
        let current_y = anchor.1;
        // Validity is tested with the creature lifted off the board;
        // scoring reads the pre-removal board.
        let mut scratch = board.clone();
        for &(x, y) in &self.cells {
            scratch.set_cell(x, y, None);
        }
        // First maximal candidate in a fixed deterministic scan order wins.
        let mut best: Option<(i32, BendShape, Coord)> = None;
        let mut consider = |score: i32, kind: BendShape, pos: Coord| {
            if score > best.as_ref().map_or(i32::MIN, |b| b.0) {
                best = Some((score, kind, pos));
            }
        };
        if self.phase == 0 {
            for kind in BendShape::ALL {
                let footprint = kind.footprint();
                for y in current_y..HEIGHT as i32 {
                    for x in 0..WIDTH as i32 {
                        if scratch.is_free(&footprint, x, y, None) {
                            consider(bend_score(board, &footprint, x, y, current_y), kind, (x, y));
                        }
                    }
                }
            }
        } else {
            for kind in BendShape::ALL {
                let footprint = kind.footprint();
                for pos in reachable(&scratch, &footprint, anchor) {
                    consider(
                        bend_score(board, &footprint, pos.0, pos.1, current_y),
                        kind,
                        pos,
                    );
                }
            }
        }
        let (score, kind, pos) = best?;
        if score <= 0 {
            return None;
        }
        if self.phase > 0 && score < MIN_FOLLOWUP_SCORE {
            return None;
        }
        let path = waypoints(&scratch, &kind.footprint(), anchor, pos, current_y);
        if path.is_empty() {
            return None;
        }
        Some((kind, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;

    #[test]
    fn all_footprints_have_seven_cells() {
        for kind in BendShape::ALL {
            assert_eq!(kind.footprint().filled_count(), CELL_COUNT, "{kind:?}");
        }
    }

    #[test]
    fn footprint_detection_round_trips() {
        for kind in BendShape::ALL {
            let footprint = kind.footprint();
            let cells: Vec<Coord> = footprint
                .cells()
                .map(|(col, row)| (2 + col as i32, 5 + row as i32))
                .collect();
            assert_eq!(detect_footprint(&cells), Some(((2, 5), kind)));
        }
    }

    #[test]
    fn mutated_cells_do_not_detect() {
        let mut cells: Vec<Coord> = BendShape::Flat
            .footprint()
            .cells()
            .map(|(col, row)| (col as i32, row as i32))
            .collect();
        cells.pop();
        assert_eq!(detect_footprint(&cells), None);
        cells.push((0, 5));
        assert_eq!(detect_footprint(&cells), None);
    }

    #[test]
    fn bend_score_is_deterministic() {
        let mut board = Board::new();
        board.set_cell(2, 10, Some(Tile::Piece(PieceKind::O)));
        board.set_cell(3, 17, Some(Tile::Piece(PieceKind::T)));
        let shape = BendShape::Box4x2.footprint();
        let a = bend_score(&board, &shape, 2, 15, 3);
        let b = bend_score(&board, &shape, 2, 15, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn moving_up_is_forbidden() {
        let board = Board::new();
        let shape = BendShape::Flat.footprint();
        assert_eq!(bend_score(&board, &shape, 0, 4, 5), -1);
    }

    #[test]
    fn gap_fill_outscores_open_ground() {
        let mut board = Board::new();
        // A roof over column 2 turns (2, 18) into a gap.
        board.set_cell(2, 12, Some(Tile::Piece(PieceKind::O)));
        let shape = BendShape::Flat.footprint();
        let with_gap = bend_score(&board, &shape, 0, 18, 0);
        let without = bend_score(&Board::new(), &shape, 0, 18, 0);
        assert!(with_gap > without);
    }

    #[test]
    fn no_op_move_scores_negative() {
        let mut board = Board::new();
        let shape = BendShape::Flat.footprint();
        board.commit(&shape, 1, 10, Tile::Relocator);
        // Re-placing exactly on its own cells fills nothing.
        assert!(bend_score(&board, &shape, 1, 10, 10) <= 0);
    }

    #[test]
    fn downward_moves_get_progress_bonus() {
        let board = Board::new();
        let shape = BendShape::Flat.footprint();
        let same_row = bend_score(&board, &shape, 0, 10, 10);
        let below = bend_score(&board, &shape, 0, 11, 10);
        // One row deeper trades 6 depth points for the +20 progress bonus.
        assert_eq!(below, same_row - 6 + 20);
    }

    #[test]
    fn reachable_never_goes_up() {
        let scratch = Board::new();
        let shape = BendShape::Flat.footprint();
        for pos in reachable(&scratch, &shape, (1, 10)) {
            assert!(pos.1 >= 10);
        }
    }

    #[test]
    fn waypoint_paths_stay_valid() {
        let scratch = Board::new();
        let shape = BendShape::Box3x3.footprint();
        let path = waypoints(&scratch, &shape, (0, 5), (6, 15), 5);
        assert!(!path.is_empty());
        assert_eq!(*path.last().unwrap(), (6, 15));
        for &(x, y) in &path {
            assert!(y >= 5);
            assert!(scratch.is_free(&shape, x, y, None));
        }
    }

    #[test]
    fn session_runs_to_completion_and_keeps_seven_cells() {
        let mut board = Board::new();
        let flat = BendShape::Flat.footprint();
        board.commit(&flat, 1, 0, Tile::Relocator);
        let cells: Vec<Coord> = flat.cells().map(|(c, r)| (1 + c as i32, r as i32)).collect();
        let mut session = RelocatorSession::new(cells);
        let config = GameConfig::default();
        let mut feedback = Vec::new();
        let dt = Duration::from_millis(50);
        let mut done = false;
        for _ in 0..10_000 {
            if session.advance(&mut board, &config, dt, &mut feedback) {
                done = true;
                break;
            }
            assert_eq!(board.cells_with(Tile::Relocator).len(), CELL_COUNT);
        }
        assert!(done, "session never finished");
        assert_eq!(board.cells_with(Tile::Relocator).len(), CELL_COUNT);
    }
}
