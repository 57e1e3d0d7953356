use rand::{rngs::ThreadRng, Rng};

use crate::pieces::{CrazyKind, PieceKind, Shape, Tile};

/// One drawn piece: its footprint and the tag its cells lock under.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceDraw {
    pub shape: Shape,
    pub tile: Tile,
}

impl PieceDraw {
    pub fn standard(kind: PieceKind) -> Self {
        Self {
            shape: kind.shape(),
            tile: Tile::Piece(kind),
        }
    }

    pub fn crazy(kind: CrazyKind) -> Self {
        Self {
            shape: kind.shape(),
            tile: Tile::Crazy(kind),
        }
    }

    /// The elongated 1×7 creature piece.
    pub fn relocator() -> Self {
        Self {
            shape: Shape::from_bits(&[&[1, 1, 1, 1, 1, 1, 1]]),
            tile: Tile::Relocator,
        }
    }
}

/// Three-tier spawn distribution, checked in priority order each draw:
/// relocator piece, then crazy shape, then uniform standard piece. The
/// tiers are mutually exclusive per spawn (first match wins).
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceGenerator {
    pub relocator_chance: Option<f64>,
    pub crazy_chance: Option<f64>,
}

impl PieceGenerator {
    pub fn standard_only() -> Self {
        Self {
            relocator_chance: None,
            crazy_chance: None,
        }
    }

    pub fn draw(&self, rng: &mut ThreadRng) -> PieceDraw {
        if let Some(p) = self.relocator_chance {
            if rng.gen_bool(p) {
                return PieceDraw::relocator();
            }
        }
        if let Some(p) = self.crazy_chance {
            if rng.gen_bool(p) {
                let kind = CrazyKind::ALL[rng.gen_range(0..CrazyKind::ALL.len())];
                return PieceDraw::crazy(kind);
            }
        }
        self.draw_standard(rng)
    }

    /// Uniform standard draw; also the fallback when the relocator piece
    /// cannot be placed anywhere on its spawn row.
    pub fn draw_standard(&self, rng: &mut ThreadRng) -> PieceDraw {
        let kind = PieceKind::ALL[rng.gen_range(0..PieceKind::ALL.len())];
        PieceDraw::standard(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_mutually_exclusive() {
        let mut rng = rand::thread_rng();
        // Certain relocator tier shadows the crazy tier entirely.
        let gen = PieceGenerator {
            relocator_chance: Some(1.0),
            crazy_chance: Some(1.0),
        };
        for _ in 0..20 {
            assert_eq!(gen.draw(&mut rng).tile, Tile::Relocator);
        }
        // Certain crazy tier shadows the standard tier.
        let gen = PieceGenerator {
            relocator_chance: None,
            crazy_chance: Some(1.0),
        };
        for _ in 0..20 {
            assert!(matches!(gen.draw(&mut rng).tile, Tile::Crazy(_)));
        }
    }

    #[test]
    fn standard_tier_draws_all_seven() {
        let mut rng = rand::thread_rng();
        let gen = PieceGenerator::standard_only();
        let mut seen = [false; 7];
        for _ in 0..500 {
            match gen.draw(&mut rng).tile {
                Tile::Piece(kind) => seen[kind] = true,
                tile => panic!("unexpected draw {tile:?}"),
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn relocator_piece_is_one_by_seven() {
        let draw = PieceDraw::relocator();
        assert_eq!((draw.shape.width(), draw.shape.height()), (7, 1));
        assert_eq!(draw.shape.filled_count(), 7);
    }
}
