//! ICCS coordinate notation ("h2e2"): files a..i left to right, ranks
//! 0..9 from the bottom edge up.

use crate::data::{FILE_LEFT, RANK_TOP};
use crate::moves::{file_of, rank_of, square_from, Move, Square};

fn square_to_iccs(sq: Square, out: &mut String) {
    out.push((b'a' + (file_of(sq) - FILE_LEFT) as u8) as char);
    out.push((b'0' + (12 - rank_of(sq)) as u8) as char);
}

fn iccs_to_square(file: char, rank: char) -> Option<Square> {
    if !('a'..='i').contains(&file) || !rank.is_ascii_digit() {
        return None;
    }
    let col = file as usize - 'a' as usize + FILE_LEFT;
    let row = 9 - (rank as usize - '0' as usize) + RANK_TOP;
    Some(square_from(col, row))
}

pub fn move_to_iccs(mv: Move) -> String {
    let mut out = String::with_capacity(4);
    square_to_iccs(mv.start(), &mut out);
    square_to_iccs(mv.end(), &mut out);
    out
}

pub fn iccs_to_move(iccs: &str) -> Option<Move> {
    let mut chars = iccs.chars();
    let start = iccs_to_square(chars.next()?, chars.next()?)?;
    let end = iccs_to_square(chars.next()?, chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(Move::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::board_square;

    #[test]
    fn test_iccs_round_trip() {
        for iccs in ["h2e2", "a0a9", "i9i0", "e3e4"] {
            let mv = iccs_to_move(iccs).unwrap();
            assert_eq!(move_to_iccs(mv), iccs);
        }
    }

    #[test]
    fn test_iccs_squares() {
        let mv = iccs_to_move("a0i9").unwrap();
        assert_eq!(mv.start(), board_square(9, 0));
        assert_eq!(mv.end(), board_square(0, 8));
    }

    #[test]
    fn test_iccs_rejects_garbage() {
        assert!(iccs_to_move("").is_none());
        assert!(iccs_to_move("h2e").is_none());
        assert!(iccs_to_move("h2e2e2").is_none());
        assert!(iccs_to_move("j2e2").is_none());
        assert!(iccs_to_move("h2ex").is_none());
    }
}
