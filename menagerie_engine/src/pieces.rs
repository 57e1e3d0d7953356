use std::ops;

/// Rectangular boolean matrix describing a piece footprint.
///
/// Invariants: all rows have equal length, and at least one cell is filled.
/// Rotation preserves the filled-cell count.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Self {
        debug_assert!(!rows.is_empty());
        debug_assert!(rows.iter().all(|r| r.len() == rows[0].len()));
        debug_assert!(rows.iter().flatten().any(|&c| c));
        Self { rows }
    }

    pub fn from_bits(bits: &[&[u8]]) -> Self {
        Self::from_rows(
            bits.iter()
                .map(|row| row.iter().map(|&b| b != 0).collect())
                .collect(),
        )
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn filled(&self, col: usize, row: usize) -> bool {
        self.rows[row][col]
    }

    /// Filled cells as `(col, row)` offsets.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter_map(move |(col, &c)| c.then_some((col, row)))
        })
    }

    pub fn filled_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&c| c).count()
    }

    /// 90° clockwise transform: `new[i][j] = old[rows - 1 - j][i]`.
    pub fn rotated_cw(&self) -> Self {
        let (h, w) = (self.height(), self.width());
        let rows = (0..w)
            .map(|i| (0..h).map(|j| self.rows[h - 1 - j][i]).collect())
            .collect();
        Self::from_rows(rows)
    }
}

/// The seven standard tetromino kinds.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    pub fn shape(self) -> Shape {
        #[rustfmt::skip]
        let bits: &[&[u8]] = match self {
            PieceKind::I => &[&[1, 1, 1, 1]],
            PieceKind::O => &[&[1, 1],
                              &[1, 1]],
            PieceKind::T => &[&[0, 1, 0],
                              &[1, 1, 1]],
            PieceKind::S => &[&[0, 1, 1],
                              &[1, 1, 0]],
            PieceKind::Z => &[&[1, 1, 0],
                              &[0, 1, 1]],
            PieceKind::J => &[&[1, 0, 0],
                              &[1, 1, 1]],
            PieceKind::L => &[&[0, 0, 1],
                              &[1, 1, 1]],
        };
        Shape::from_bits(bits)
    }
}

impl TryFrom<usize> for PieceKind {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        PieceKind::ALL.get(value).copied().ok_or(())
    }
}

/// The five oversized novelty-mode shapes.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrazyKind {
    BigL,
    BigT,
    WideZ,
    Slab,
    LongBar,
}

impl CrazyKind {
    pub const ALL: [CrazyKind; 5] = [
        CrazyKind::BigL,
        CrazyKind::BigT,
        CrazyKind::WideZ,
        CrazyKind::Slab,
        CrazyKind::LongBar,
    ];

    pub fn shape(self) -> Shape {
        #[rustfmt::skip]
        let bits: &[&[u8]] = match self {
            CrazyKind::BigL => &[&[1, 0, 0, 0],
                                 &[1, 0, 0, 0],
                                 &[1, 1, 1, 1],
                                 &[0, 0, 0, 1]],
            CrazyKind::BigT => &[&[0, 1, 0, 0],
                                 &[1, 1, 1, 1],
                                 &[0, 1, 0, 0],
                                 &[0, 1, 0, 0]],
            CrazyKind::WideZ => &[&[1, 1, 0, 0, 0],
                                  &[0, 1, 1, 1, 0],
                                  &[0, 0, 0, 1, 1]],
            CrazyKind::Slab => &[&[1, 1, 1],
                                 &[1, 1, 1],
                                 &[1, 1, 1]],
            CrazyKind::LongBar => &[&[1, 1, 1, 1, 1, 1]],
        };
        Shape::from_bits(bits)
    }
}

impl TryFrom<usize> for CrazyKind {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        CrazyKind::ALL.get(value).copied().ok_or(())
    }
}

/// Material tag of an occupied board cell.
///
/// Later board scans dispatch on the tag, not on piece identity: the
/// relocator creature's own cells must be distinguishable from everything
/// the agents treat as solid ground.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tile {
    Piece(PieceKind),
    Crazy(CrazyKind),
    Relocator,
    Filler,
}

impl Tile {
    pub fn is_creature(self) -> bool {
        self == Tile::Relocator
    }
}

impl<T> ops::Index<PieceKind> for [T; 7] {
    type Output = T;

    fn index(&self, idx: PieceKind) -> &Self::Output {
        &self[idx as usize]
    }
}

impl<T> ops::IndexMut<PieceKind> for [T; 7] {
    fn index_mut(&mut self, idx: PieceKind) -> &mut Self::Output {
        &mut self[idx as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_matches_matrix_transform() {
        // T: ⊤ shape, one clockwise turn points it left.
        let t = PieceKind::T.shape();
        let r = t.rotated_cw();
        assert_eq!(r.width(), 2);
        assert_eq!(r.height(), 3);
        #[rustfmt::skip]
        let expected = Shape::from_bits(&[&[1, 0],
                                          &[1, 1],
                                          &[1, 0]]);
        assert_eq!(r, expected);
    }

    #[test]
    fn four_rotations_return_original() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            let mut r = shape.clone();
            for _ in 0..4 {
                r = r.rotated_cw();
            }
            assert_eq!(r, shape, "{kind:?} drifted after four rotations");
        }
        for kind in CrazyKind::ALL {
            let shape = kind.shape();
            let mut r = shape.clone();
            for _ in 0..4 {
                r = r.rotated_cw();
            }
            assert_eq!(r, shape, "{kind:?} drifted after four rotations");
        }
    }

    #[test]
    fn rotation_preserves_filled_count() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            assert_eq!(shape.rotated_cw().filled_count(), shape.filled_count());
        }
        for kind in CrazyKind::ALL {
            let shape = kind.shape();
            assert_eq!(shape.rotated_cw().filled_count(), shape.filled_count());
        }
    }

    #[test]
    fn standard_shapes_have_four_cells() {
        for kind in PieceKind::ALL {
            assert_eq!(kind.shape().filled_count(), 4, "{kind:?}");
        }
    }
}
