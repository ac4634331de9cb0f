//! Packed moves and square coordinate arithmetic.

use crate::data::{FILE_LEFT, RANK_TOP};

/// Index into the 16x16 virtual grid.
pub type Square = usize;

pub fn rank_of(sq: Square) -> usize { sq >> 4 }

pub fn file_of(sq: Square) -> usize { sq & 15 }

pub fn square_from(file: usize, rank: usize) -> Square { file + (rank << 4) }

/// Board coordinates (0..10 top-down, 0..9 left-right) to grid square.
pub fn board_square(row: usize, col: usize) -> Square {
    square_from(col + FILE_LEFT, row + RANK_TOP)
}

/// Same rank, column reflected through the center file.
pub fn mirror_square(sq: Square) -> Square { square_from(14 - file_of(sq), rank_of(sq)) }

/// Point symmetry through the board center, used when the two sides swap.
pub fn rotate_square(sq: Square) -> Square { 254 - sq }

/// A move packed as start | end << 8. `Move::NONE` (square 0 to square 0,
/// both off-board) doubles as the "no move" sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Move(u16);

impl Move {
    pub const NONE: Move = Move(0);

    pub fn new(start: Square, end: Square) -> Move { Move((start | (end << 8)) as u16) }

    pub fn start(self) -> Square { (self.0 & 255) as usize }

    pub fn end(self) -> Square { (self.0 >> 8) as usize }

    pub fn is_none(self) -> bool { self.0 == 0 }

    pub fn is_some(self) -> bool { self.0 != 0 }

    /// Index into the history table.
    pub fn index(self) -> usize { self.0 as usize }

    pub fn mirrored(self) -> Move { Move::new(mirror_square(self.start()), mirror_square(self.end())) }
}
