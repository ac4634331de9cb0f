//! Pieces and per-side aggregates.

use crate::data::PIECE_VALUE;
use crate::moves::{rotate_square, Square};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    Red = 0,
    Black = 1,
}

impl Side {
    pub fn index(self) -> usize { self as usize }

    pub fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PieceKind {
    King = 0,
    Advisor = 1,
    Bishop = 2,
    Knight = 3,
    Rook = 4,
    Cannon = 5,
    Pawn = 6,
}

impl PieceKind {
    pub fn index(self) -> usize { self as usize }

    pub fn from_fen_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_uppercase() {
            'K' => Some(PieceKind::King),
            'A' => Some(PieceKind::Advisor),
            'B' | 'E' => Some(PieceKind::Bishop),
            'N' | 'H' => Some(PieceKind::Knight),
            'R' => Some(PieceKind::Rook),
            'C' => Some(PieceKind::Cannon),
            'P' => Some(PieceKind::Pawn),
            _ => None,
        }
    }

    pub fn fen_char(self, side: Side) -> char {
        let c = match self {
            PieceKind::King => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Rook => 'R',
            PieceKind::Cannon => 'C',
            PieceKind::Pawn => 'P',
        };
        match side {
            Side::Red => c,
            Side::Black => c.to_ascii_lowercase(),
        }
    }
}

/// Stable handle into the position's piece arena.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PieceId(pub(crate) usize);

/// A piece keeps its identity for the whole game; capture only clears the
/// visibility flag so undo can restore it in place.
#[derive(Clone, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
    pub square: Square,
    pub visible: bool,
}

impl Piece {
    /// Positional value of this piece standing on `sq`. Black reads the
    /// red tables through the rotated square.
    pub fn value_at(&self, sq: Square) -> i32 {
        match self.side {
            Side::Red => PIECE_VALUE[self.kind.index()][sq],
            Side::Black => PIECE_VALUE[self.kind.index()][rotate_square(sq)],
        }
    }
}

pub const MAX_PLAYER_PIECES: usize = 16;

/// One side's piece roster and running positional value.
#[derive(Clone, Debug)]
pub struct Player {
    pub side: Side,
    pub value: i32,
    pieces: Vec<PieceId>,
    king: Option<PieceId>,
}

impl Player {
    pub fn new(side: Side) -> Self {
        Player { side, value: 0, pieces: Vec::with_capacity(MAX_PLAYER_PIECES), king: None }
    }

    pub(crate) fn register(&mut self, id: PieceId, kind: PieceKind) {
        debug_assert!(self.pieces.len() < MAX_PLAYER_PIECES);
        self.pieces.push(id);
        if kind == PieceKind::King {
            self.king = Some(id);
        }
    }

    pub fn pieces(&self) -> &[PieceId] { &self.pieces }

    pub fn piece_count(&self) -> usize { self.pieces.len() }

    pub fn king(&self) -> Option<PieceId> { self.king }
}
