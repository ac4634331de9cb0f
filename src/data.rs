//! Pregenerated board geometry tables and engine tuning constants.
//!
//! The playing field is a 10x9 board embedded in a 16x16 virtual grid, so
//! every square fits in a byte and file/rank extraction is bit masking.
//! Rows 3..=12 and columns 3..=11 of the grid are on the board.

pub const LIMIT_DEPTH: usize = 64;
pub const NULL_DEPTH: i32 = 2;

pub const MATE_VALUE: i32 = 10000;
pub const BAN_VALUE: i32 = MATE_VALUE - 100;
pub const WIN_VALUE: i32 = MATE_VALUE - 200;

pub const NULL_SAFE_MARGIN: i32 = 400;
pub const NULL_OKAY_MARGIN: i32 = 200;

pub const DRAW_VALUE: i32 = 20;
pub const ADVANCED_VALUE: i32 = 3;

pub const RANK_TOP: usize = 3;
pub const RANK_BOTTOM: usize = 12;
pub const FILE_LEFT: usize = 3;
pub const FILE_RIGHT: usize = 11;

pub const MAX_GENERATE_MOVES: usize = 128;

const fn build_in_board() -> [bool; 256] {
    let mut table = [false; 256];
    let mut rank = RANK_TOP;
    while rank <= RANK_BOTTOM {
        let mut file = FILE_LEFT;
        while file <= FILE_RIGHT {
            table[(rank << 4) + file] = true;
            file += 1;
        }
        rank += 1;
    }
    table
}

const fn build_in_fort() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        let rank = i >> 4;
        let file = i & 15;
        if file >= 6 && file <= 8 && ((rank >= 3 && rank <= 5) || (rank >= 10 && rank <= 12)) {
            table[i] = true;
        }
        i += 1;
    }
    table
}

// Fixed-span table: for a square delta d, LEGAL_SPAN[d + 256] says which
// short-range piece can span it (1 king, 2 advisor, 3 bishop).
const fn build_legal_span() -> [u8; 512] {
    let mut table = [0u8; 512];
    table[256 - 16] = 1;
    table[256 - 1] = 1;
    table[256 + 1] = 1;
    table[256 + 16] = 1;
    table[256 - 17] = 2;
    table[256 - 15] = 2;
    table[256 + 15] = 2;
    table[256 + 17] = 2;
    table[256 - 34] = 3;
    table[256 - 30] = 3;
    table[256 + 30] = 3;
    table[256 + 34] = 3;
    table
}

// KNIGHT_PIN[d + 256] is the offset from the source square to the blocking
// leg of a knight jump with delta d, or 0 when d is not a knight delta.
const fn build_knight_pin() -> [i16; 512] {
    let mut table = [0i16; 512];
    table[256 - 33] = -16;
    table[256 - 31] = -16;
    table[256 - 18] = -1;
    table[256 - 14] = 1;
    table[256 + 14] = -1;
    table[256 + 18] = 1;
    table[256 + 31] = 16;
    table[256 + 33] = 16;
    table
}

pub static IN_BOARD: [bool; 256] = build_in_board();
pub static IN_FORT: [bool; 256] = build_in_fort();
pub static LEGAL_SPAN: [u8; 512] = build_legal_span();
pub static KNIGHT_PIN: [i16; 512] = build_knight_pin();

pub fn in_board(sq: usize) -> bool { IN_BOARD[sq] }

pub fn in_fort(sq: usize) -> bool { IN_FORT[sq] }

fn span(src: usize, dst: usize) -> u8 { LEGAL_SPAN[(dst + 256 - src) & 511] }

pub fn king_span(src: usize, dst: usize) -> bool { span(src, dst) == 1 }

pub fn advisor_span(src: usize, dst: usize) -> bool { span(src, dst) == 2 }

pub fn bishop_span(src: usize, dst: usize) -> bool { span(src, dst) == 3 }

/// Midpoint of a bishop move, the square that blocks the bishop's eye.
pub fn bishop_pin(src: usize, dst: usize) -> usize { (src + dst) >> 1 }

/// Leg square that blocks a knight jump, or `src` itself when the delta is
/// not a knight delta at all.
pub fn knight_pin(src: usize, dst: usize) -> usize {
    src.wrapping_add_signed(KNIGHT_PIN[(dst + 256 - src) & 511] as isize)
}

pub fn same_half(a: usize, b: usize) -> bool { (a ^ b) & 0x80 == 0 }

pub fn same_rank(a: usize, b: usize) -> bool { (a ^ b) & 0xf0 == 0 }

pub fn same_file(a: usize, b: usize) -> bool { (a ^ b) & 0x0f == 0 }

pub const KING_DELTA: [isize; 4] = [-16, -1, 1, 16];
pub const ADVISOR_DELTA: [isize; 4] = [-17, -15, 15, 17];
pub const KNIGHT_DELTA: [[isize; 2]; 4] = [[-33, -31], [-18, 14], [-14, 18], [31, 33]];

/// Victim weight per piece kind for MVV/LVA capture ordering.
pub const MVV_VALUE: [i32; 7] = [5, 1, 1, 3, 4, 3, 2];

// Positional piece values, red's point of view with red at the bottom
// (grid rows 8..=12). Black values read the same tables through the
// rotated square 254 - sq. Every row is left-right symmetric.
#[rustfmt::skip]
const KING_POS: [[i32; 9]; 10] = [
    [0, 0, 0,  0,  0,  0, 0, 0, 0],
    [0, 0, 0,  0,  0,  0, 0, 0, 0],
    [0, 0, 0,  0,  0,  0, 0, 0, 0],
    [0, 0, 0,  0,  0,  0, 0, 0, 0],
    [0, 0, 0,  0,  0,  0, 0, 0, 0],
    [0, 0, 0,  0,  0,  0, 0, 0, 0],
    [0, 0, 0,  0,  0,  0, 0, 0, 0],
    [0, 0, 0,  1,  1,  1, 0, 0, 0],
    [0, 0, 0,  2,  2,  2, 0, 0, 0],
    [0, 0, 0, 11, 15, 11, 0, 0, 0],
];

#[rustfmt::skip]
const ADVISOR_BISHOP_POS: [[i32; 9]; 10] = [
    [ 0, 0,  0,  0,  0,  0,  0, 0,  0],
    [ 0, 0,  0,  0,  0,  0,  0, 0,  0],
    [ 0, 0,  0,  0,  0,  0,  0, 0,  0],
    [ 0, 0,  0,  0,  0,  0,  0, 0,  0],
    [ 0, 0,  0,  0,  0,  0,  0, 0,  0],
    [ 0, 0, 18,  0,  0,  0, 18, 0,  0],
    [ 0, 0,  0,  0,  0,  0,  0, 0,  0],
    [18, 0,  0, 20, 23, 20,  0, 0, 18],
    [ 0, 0,  0,  0, 23,  0,  0, 0,  0],
    [ 0, 0, 20, 20,  0, 20, 20, 0,  0],
];

#[rustfmt::skip]
const KNIGHT_POS: [[i32; 9]; 10] = [
    [90,  90,  90,  96,  90,  96,  90,  90, 90],
    [90,  96, 103,  97,  94,  97, 103,  96, 90],
    [92,  98,  99, 103,  99, 103,  99,  98, 92],
    [93, 108, 100, 107, 100, 107, 100, 108, 93],
    [90, 100,  99, 103, 104, 103,  99, 100, 90],
    [90,  98, 101, 102, 103, 102, 101,  98, 90],
    [92,  94,  98,  95,  98,  95,  98,  94, 92],
    [93,  92,  94,  95,  92,  95,  94,  92, 93],
    [85,  90,  92,  93,  78,  93,  92,  90, 85],
    [88,  85,  90,  88,  90,  88,  90,  85, 88],
];

#[rustfmt::skip]
const ROOK_POS: [[i32; 9]; 10] = [
    [206, 208, 207, 213, 214, 213, 207, 208, 206],
    [206, 212, 209, 216, 233, 216, 209, 212, 206],
    [206, 208, 207, 214, 216, 214, 207, 208, 206],
    [206, 213, 213, 216, 216, 216, 213, 213, 206],
    [208, 211, 211, 214, 215, 214, 211, 211, 208],
    [208, 212, 212, 214, 215, 214, 212, 212, 208],
    [204, 209, 204, 212, 214, 212, 204, 209, 204],
    [198, 208, 204, 212, 212, 212, 204, 208, 198],
    [200, 208, 206, 212, 200, 212, 206, 208, 200],
    [194, 206, 204, 212, 200, 212, 204, 206, 194],
];

#[rustfmt::skip]
const CANNON_POS: [[i32; 9]; 10] = [
    [100, 100,  96, 91,  90, 91,  96, 100, 100],
    [ 98,  98,  96, 92,  89, 92,  96,  98,  98],
    [ 97,  97,  96, 91,  92, 91,  96,  97,  97],
    [ 96,  99,  99, 98, 100, 98,  99,  99,  96],
    [ 96,  96,  96, 96, 100, 96,  96,  96,  96],
    [ 95,  96,  99, 96, 100, 96,  99,  96,  95],
    [ 96,  96,  96, 96,  96, 96,  96,  96,  96],
    [ 97,  96, 100, 99, 101, 99, 100,  96,  97],
    [ 96,  97,  98, 98,  98, 98,  98,  97,  96],
    [ 96,  96,  97, 99,  99, 99,  97,  96,  96],
];

#[rustfmt::skip]
const PAWN_POS: [[i32; 9]; 10] = [
    [ 9,  9,  9, 11, 13, 11,  9,  9,  9],
    [19, 24, 34, 42, 44, 42, 34, 24, 19],
    [19, 24, 32, 37, 37, 37, 32, 24, 19],
    [19, 23, 27, 29, 30, 29, 27, 23, 19],
    [14, 18, 20, 27, 29, 27, 20, 18, 14],
    [ 7,  0, 13,  0, 16,  0, 13,  0,  7],
    [ 7,  0,  7,  0, 15,  0,  7,  0,  7],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
];

const fn expand(rows: [[i32; 9]; 10]) -> [i32; 256] {
    let mut table = [0i32; 256];
    let mut rank = 0;
    while rank < 10 {
        let mut file = 0;
        while file < 9 {
            table[((rank + RANK_TOP) << 4) + file + FILE_LEFT] = rows[rank][file];
            file += 1;
        }
        rank += 1;
    }
    table
}

pub static PIECE_VALUE: [[i32; 256]; 7] = [
    expand(KING_POS),
    expand(ADVISOR_BISHOP_POS),
    expand(ADVISOR_BISHOP_POS),
    expand(KNIGHT_POS),
    expand(ROOK_POS),
    expand(CANNON_POS),
    expand(PAWN_POS),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::mirror_square;

    #[test]
    fn test_board_geometry() {
        assert_eq!(IN_BOARD.iter().filter(|b| **b).count(), 90);
        assert_eq!(IN_FORT.iter().filter(|b| **b).count(), 18);
        assert!(in_board(0x33));
        assert!(in_board(0xcb));
        assert!(!in_board(0x32));
        assert!(in_fort(0x37));
        assert!(!in_fort(0x63));
    }

    #[test]
    fn test_spans() {
        let king = 0xc7;
        assert!(king_span(king, king - 16));
        assert!(king_span(king, king + 1));
        assert!(!king_span(king, king + 2));
        assert!(advisor_span(king, king - 17));
        assert!(!advisor_span(king, king - 16));
        assert!(bishop_span(0xa5, 0xa5 + 34));
        assert_eq!(bishop_pin(0xa5, 0xa5 + 34), 0xa5 + 17);
    }

    #[test]
    fn test_knight_pin() {
        let sq = 0x77;
        assert_eq!(knight_pin(sq, sq - 33), sq - 16);
        assert_eq!(knight_pin(sq, sq + 14), sq - 1);
        assert_eq!(knight_pin(sq, sq + 18), sq + 1);
        // not a knight delta: pins on the source itself
        assert_eq!(knight_pin(sq, sq + 1), sq);
    }

    #[test]
    fn test_masks() {
        assert!(same_rank(0x34, 0x3b));
        assert!(!same_rank(0x34, 0x44));
        assert!(same_file(0x34, 0xc4));
        assert!(same_half(0x34, 0x74));
        assert!(!same_half(0x74, 0x84));
    }

    #[test]
    fn test_piece_value_symmetry() {
        // every positional table must be left-right symmetric, otherwise
        // mirrored positions would not evaluate equally
        for table in PIECE_VALUE.iter() {
            for sq in 0..256 {
                if in_board(sq) {
                    assert_eq!(table[sq], table[mirror_square(sq)]);
                }
            }
        }
    }
}
