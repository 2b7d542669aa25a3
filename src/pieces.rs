use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::matrix::Matrix;

// ============================================================================
// Catalog
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize)]
pub enum PieceKind {
    I,
    L,
    J,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::L,
        PieceKind::J,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Color id written into the field, 1..=7 in catalog order.
    pub fn id(self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::L => 2,
            PieceKind::J => 3,
            PieceKind::O => 4,
            PieceKind::S => 5,
            PieceKind::T => 6,
            PieceKind::Z => 7,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1..=7 => Some(Self::ALL[id as usize - 1]),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::L => 'L',
            PieceKind::J => 'J',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::T => 'T',
            PieceKind::Z => 'Z',
        }
    }

    /// Spawn orientation. I is 4x4, O is 2x2, the rest 3x3.
    pub fn shape(self) -> Matrix {
        match self {
            PieceKind::I => Matrix::from_static(&[
                &[0, 1, 0, 0],
                &[0, 1, 0, 0],
                &[0, 1, 0, 0],
                &[0, 1, 0, 0],
            ]),
            PieceKind::L => Matrix::from_static(&[
                &[0, 2, 0],
                &[0, 2, 0],
                &[0, 2, 2],
            ]),
            PieceKind::J => Matrix::from_static(&[
                &[0, 3, 0],
                &[0, 3, 0],
                &[3, 3, 0],
            ]),
            PieceKind::O => Matrix::from_static(&[
                &[4, 4],
                &[4, 4],
            ]),
            PieceKind::S => Matrix::from_static(&[
                &[0, 5, 5],
                &[5, 5, 0],
                &[0, 0, 0],
            ]),
            PieceKind::T => Matrix::from_static(&[
                &[0, 0, 0],
                &[6, 6, 6],
                &[0, 6, 0],
            ]),
            PieceKind::Z => Matrix::from_static(&[
                &[7, 7, 0],
                &[0, 7, 7],
                &[0, 0, 0],
            ]),
        }
    }

    /// Kind of a shape, read from its first occupied cell.
    pub fn of_shape(shape: &Matrix) -> Option<Self> {
        shape.occupied().next().and_then(|(_, _, v)| Self::from_id(v))
    }

    /// Uniform draw; each call is independent of the previous ones.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Uniformly random piece shape from the thread RNG.
pub fn random_piece() -> Matrix {
    PieceKind::random(&mut rand::thread_rng()).shape()
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> PieceKind;
}

pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible draws for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        PieceKind::random(&mut self.rng)
    }
}

pub struct SequencePieceProvider {
    pieces: Vec<PieceKind>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<PieceKind>) -> Self {
        assert!(!pieces.is_empty(), "sequence provider needs at least one piece");
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}
