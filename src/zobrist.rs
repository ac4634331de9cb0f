//! Position hashing.
//!
//! Hash material comes from an RC4 keystream with the key-less identity
//! schedule, so the table is identical on every run and across hosts. Each
//! hashed feature carries a triple: a 32-bit key used to index the
//! transposition table and two 32-bit locks used to verify an entry really
//! belongs to the probed position.

use std::ops::BitXorAssign;
use std::sync::OnceLock;

use crate::piece::{PieceKind, Side};

pub struct Rc4 {
    x: usize,
    y: usize,
    state: [u8; 256],
}

impl Default for Rc4 {
    fn default() -> Self { Rc4::new() }
}

impl Rc4 {
    pub fn new() -> Self {
        let mut state = [0u8; 256];
        let mut i = 0;
        while i < 256 {
            state[i] = i as u8;
            i += 1;
        }
        let mut j = 0usize;
        for i in 0..256 {
            j = (j + state[i] as usize) & 255;
            state.swap(i, j);
        }
        Rc4 { x: 0, y: 0, state }
    }

    pub fn next_byte(&mut self) -> u8 {
        self.x = (self.x + 1) & 255;
        self.y = (self.y + self.state[self.x] as usize) & 255;
        self.state.swap(self.x, self.y);
        self.state[(self.state[self.x] as usize + self.state[self.y] as usize) & 255]
    }

    /// Four keystream bytes, little-endian.
    pub fn next_u32(&mut self) -> u32 {
        let b0 = self.next_byte() as u32;
        let b1 = self.next_byte() as u32;
        let b2 = self.next_byte() as u32;
        let b3 = self.next_byte() as u32;
        b0 | (b1 << 8) | (b2 << 16) | (b3 << 24)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Zobrist {
    pub key: u32,
    pub lock1: u32,
    pub lock2: u32,
}

impl Zobrist {
    fn next(rc4: &mut Rc4) -> Self {
        Zobrist { key: rc4.next_u32(), lock1: rc4.next_u32(), lock2: rc4.next_u32() }
    }

    /// The two locks as one 64-bit word, for opening-book lookups.
    pub fn checksum(&self) -> u64 { (self.lock2 as u64) << 32 | self.lock1 as u64 }
}

impl BitXorAssign for Zobrist {
    fn bitxor_assign(&mut self, rhs: Zobrist) {
        self.key ^= rhs.key;
        self.lock1 ^= rhs.lock1;
        self.lock2 ^= rhs.lock2;
    }
}

pub struct ZobristTable {
    pub player: Zobrist,
    table: Box<[[[Zobrist; 256]; 7]; 2]>,
}

static TABLE: OnceLock<ZobristTable> = OnceLock::new();

impl ZobristTable {
    pub fn shared() -> &'static ZobristTable { TABLE.get_or_init(ZobristTable::build) }

    fn build() -> ZobristTable {
        let mut rc4 = Rc4::new();
        let player = Zobrist::next(&mut rc4);
        let mut table = Box::new([[[Zobrist::default(); 256]; 7]; 2]);
        for side in table.iter_mut() {
            for kind in side.iter_mut() {
                for sq in kind.iter_mut() {
                    *sq = Zobrist::next(&mut rc4);
                }
            }
        }
        ZobristTable { player, table }
    }

    pub fn piece(&self, side: Side, kind: PieceKind, sq: usize) -> Zobrist {
        self.table[side.index()][kind.index()][sq]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystream_deterministic() {
        let mut a = Rc4::new();
        let mut b = Rc4::new();
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_table_entries_distinct() {
        let table = ZobristTable::shared();
        let a = table.piece(Side::Red, PieceKind::Rook, 0x33);
        let b = table.piece(Side::Red, PieceKind::Rook, 0x34);
        let c = table.piece(Side::Black, PieceKind::Rook, 0x33);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a.key, 0);
    }

    #[test]
    fn test_xor_is_involution() {
        let table = ZobristTable::shared();
        let mut z = table.piece(Side::Red, PieceKind::King, 0xc7);
        let orig = z;
        z ^= table.player;
        assert_ne!(z, orig);
        z ^= table.player;
        assert_eq!(z, orig);
    }
}
