use crate::pieces::{Shape, Tile};

pub const WIDTH: usize = 10;
pub const HEIGHT: usize = 20;

pub type LineRow = [Option<Tile>; WIDTH];
pub type Coord = (i32, i32);

/// Fixed 10×20 grid of cell occupancy, row 0 at the top.
///
/// Coordinates are signed: rows above the board (y < 0) are legal piece
/// positions and always read as empty.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    rows: Vec<LineRow>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: vec![[None; WIDTH]; HEIGHT],
        }
    }

    pub fn rows(&self) -> &[LineRow] {
        &self.rows
    }

    fn in_bounds(x: i32, y: i32) -> bool {
        (0..WIDTH as i32).contains(&x) && (0..HEIGHT as i32).contains(&y)
    }

    /// Cell content; `None` for empty cells and for anything above the board.
    /// Out-of-range coordinates below or beside the board also read `None` —
    /// callers test placement validity separately.
    pub fn cell(&self, x: i32, y: i32) -> Option<Tile> {
        if Self::in_bounds(x, y) {
            self.rows[y as usize][x as usize]
        } else {
            None
        }
    }

    pub fn set_cell(&mut self, x: i32, y: i32, tile: Option<Tile>) {
        if Self::in_bounds(x, y) {
            self.rows[y as usize][x as usize] = tile;
        }
    }

    /// True iff every filled cell of `shape` at offset `(x, y)` lies within
    /// horizontal bounds, above the floor, and on an empty cell. Cells with
    /// row < 0 count as empty (above-board spawn). A cell currently occupied
    /// by a resting remover (`protected`) counts as solid.
    pub fn is_free(&self, shape: &Shape, x: i32, y: i32, protected: Option<Coord>) -> bool {
        shape.cells().all(|(col, row)| {
            let cx = x + col as i32;
            let cy = y + row as i32;
            if cx < 0 || cx >= WIDTH as i32 || cy >= HEIGHT as i32 {
                return false;
            }
            if cy < 0 {
                return true;
            }
            if protected == Some((cx, cy)) {
                return false;
            }
            self.rows[cy as usize][cx as usize].is_none()
        })
    }

    /// Writes `tile` into every in-bounds filled cell of `shape`; cells with
    /// row < 0 are never written (standard top-out visuals).
    pub fn commit(&mut self, shape: &Shape, x: i32, y: i32, tile: Tile) {
        for (col, row) in shape.cells() {
            let cx = x + col as i32;
            let cy = y + row as i32;
            if Self::in_bounds(cx, cy) {
                self.rows[cy as usize][cx as usize] = Some(tile);
            }
        }
    }

    /// Indices of completely filled rows, bottom-to-top.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..HEIGHT)
            .rev()
            .filter(|&y| self.rows[y].iter().all(|cell| cell.is_some()))
            .collect()
    }

    /// Removes the given rows (any order) and prepends that many empty rows
    /// at the top, preserving the relative order of the remaining rows.
    pub fn remove_rows(&mut self, rows: &[usize]) {
        let mut sorted: Vec<usize> = rows.to_vec();
        sorted.sort_unstable();
        for &y in sorted.iter().rev() {
            self.rows.remove(y);
        }
        for _ in 0..sorted.len() {
            self.rows.insert(0, [None; WIDTH]);
        }
    }

    /// All coordinates currently holding `tile`.
    pub fn cells_with(&self, tile: Tile) -> Vec<Coord> {
        let mut found = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if *cell == Some(tile) {
                    found.push((x as i32, y as i32));
                }
            }
        }
        found
    }

    /// Topmost occupied cell of column `x`, if any.
    pub fn column_top(&self, x: i32) -> Option<Coord> {
        (0..HEIGHT as i32).find_map(|y| self.cell(x, y).map(|_| (x, y)))
    }

    /// All occupied coordinates.
    pub fn occupied_cells(&self) -> Vec<Coord> {
        let mut found = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if cell.is_some() {
                    found.push((x as i32, y as i32));
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;

    #[test]
    fn placement_respects_bounds_and_occupancy() {
        let mut board = Board::new();
        let o = PieceKind::O.shape();
        assert!(board.is_free(&o, 0, 0, None));
        assert!(board.is_free(&o, 8, 18, None));
        // Horizontal bounds.
        assert!(!board.is_free(&o, -1, 0, None));
        assert!(!board.is_free(&o, 9, 0, None));
        // Floor.
        assert!(!board.is_free(&o, 0, 19, None));
        // Above-board rows count as empty.
        assert!(board.is_free(&o, 0, -1, None));
        // Occupied cell.
        board.set_cell(1, 1, Some(Tile::Filler));
        assert!(!board.is_free(&o, 0, 0, None));
        assert!(board.is_free(&o, 2, 0, None));
    }

    #[test]
    fn protected_cell_blocks_placement() {
        let board = Board::new();
        let o = PieceKind::O.shape();
        assert!(board.is_free(&o, 4, 10, None));
        assert!(!board.is_free(&o, 4, 10, Some((5, 11))));
        assert!(board.is_free(&o, 4, 10, Some((6, 11))));
    }

    #[test]
    fn commit_skips_negative_rows() {
        let mut board = Board::new();
        let i = PieceKind::I.shape().rotated_cw(); // 4 tall
        board.commit(&i, 3, -2, Tile::Piece(PieceKind::I));
        assert_eq!(board.cell(3, 0), Some(Tile::Piece(PieceKind::I)));
        assert_eq!(board.cell(3, 1), Some(Tile::Piece(PieceKind::I)));
        assert_eq!(board.occupied_cells().len(), 2);
    }

    #[test]
    fn full_rows_reported_bottom_to_top() {
        let mut board = Board::new();
        for x in 0..WIDTH as i32 {
            board.set_cell(x, 19, Some(Tile::Filler));
            board.set_cell(x, 17, Some(Tile::Filler));
        }
        board.set_cell(0, 18, Some(Tile::Filler));
        assert_eq!(board.full_rows(), vec![19, 17]);
    }

    #[test]
    fn remove_rows_round_trip() {
        let mut board = Board::new();
        for x in 0..WIDTH as i32 {
            board.set_cell(x, 19, Some(Tile::Filler));
            board.set_cell(x, 18, Some(Tile::Filler));
        }
        board.set_cell(4, 17, Some(Tile::Relocator));
        board.remove_rows(&[19, 18]);
        assert_eq!(board.rows().len(), HEIGHT);
        // Survivor shifted down by the number of removed rows below it.
        assert_eq!(board.cell(4, 19), Some(Tile::Relocator));
        assert!(board.full_rows().is_empty());
    }

    #[test]
    fn column_top_finds_topmost() {
        let mut board = Board::new();
        board.set_cell(3, 12, Some(Tile::Filler));
        board.set_cell(3, 15, Some(Tile::Filler));
        assert_eq!(board.column_top(3), Some((3, 12)));
        assert_eq!(board.column_top(4), None);
    }
}
