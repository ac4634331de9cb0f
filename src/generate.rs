//! Move generation and legality.
//!
//! Generation is pseudo-legal: it honors every movement rule but will
//! happily leave the mover's king attacked. The `_noncheck` variants and
//! `legal_move` apply each move to filter out self-checks.

use crate::board::Position;
use crate::data::{self, MAX_GENERATE_MOVES, MVV_VALUE};
use crate::moves::{Move, Square};
use crate::piece::{Piece, PieceKind, Side};

/// Caller-owned move buffer. Capacity covers the densest reachable
/// positions with room to spare; overflow means the position is corrupt,
/// so it fails hard.
pub struct MoveList {
    mvs: [Move; MAX_GENERATE_MOVES],
    len: usize,
}

impl Default for MoveList {
    fn default() -> Self { MoveList::new() }
}

impl MoveList {
    pub fn new() -> Self { MoveList { mvs: [Move::NONE; MAX_GENERATE_MOVES], len: 0 } }

    pub fn push(&mut self, mv: Move) {
        assert!(self.len < MAX_GENERATE_MOVES, "move buffer overflow");
        self.mvs[self.len] = mv;
        self.len += 1;
    }

    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn clear(&mut self) { self.len = 0 }

    pub fn as_slice(&self) -> &[Move] { &self.mvs[..self.len] }

    pub fn as_mut_slice(&mut self) -> &mut [Move] { &mut self.mvs[..self.len] }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> { self.as_slice().iter() }

    pub fn contains(&self, mv: Move) -> bool { self.as_slice().contains(&mv) }
}

fn offset(sq: Square, delta: isize) -> Square { sq.wrapping_add_signed(delta) }

impl Position {
    /// All pseudo-legal moves for the side to move.
    pub fn generate_all_moves(&self, out: &mut MoveList) {
        self.generate(out, false);
    }

    /// Pseudo-legal captures only.
    pub fn generate_all_capture_moves(&self, out: &mut MoveList) {
        self.generate(out, true);
    }

    /// All fully legal moves (self-check filtered).
    pub fn generate_all_moves_noncheck(&mut self, out: &mut MoveList) {
        self.filter_noncheck(out, false);
    }

    /// Fully legal captures.
    pub fn generate_all_capture_moves_noncheck(&mut self, out: &mut MoveList) {
        self.filter_noncheck(out, true);
    }

    fn filter_noncheck(&mut self, out: &mut MoveList, captures: bool) {
        let mut all = MoveList::new();
        self.generate(&mut all, captures);
        for &mv in all.iter() {
            self.make_move(mv);
            if !self.will_kill_self_king() {
                out.push(mv);
            }
            self.undo_move();
        }
    }

    fn generate(&self, out: &mut MoveList, captures: bool) {
        for &id in self.current_player().pieces() {
            let piece = self.piece(id);
            if piece.visible {
                self.piece_moves(piece, out, captures);
            }
        }
    }

    /// Empty square or capturable enemy, depending on mode.
    fn push_target(&self, out: &mut MoveList, src: Square, dst: Square, captures: bool) {
        match self.piece_at(dst) {
            Some(target) => {
                if target.side != self.turn() {
                    out.push(Move::new(src, dst));
                }
            }
            None => {
                if !captures {
                    out.push(Move::new(src, dst));
                }
            }
        }
    }

    fn piece_moves(&self, piece: &Piece, out: &mut MoveList, captures: bool) {
        let src = piece.square;
        match piece.kind {
            PieceKind::King => {
                for delta in data::KING_DELTA {
                    let dst = offset(src, delta);
                    if data::in_fort(dst) {
                        self.push_target(out, src, dst, captures);
                    }
                }
            }
            PieceKind::Advisor => {
                for delta in data::ADVISOR_DELTA {
                    let dst = offset(src, delta);
                    if data::in_fort(dst) {
                        self.push_target(out, src, dst, captures);
                    }
                }
            }
            PieceKind::Bishop => {
                for delta in data::ADVISOR_DELTA {
                    let eye = offset(src, delta);
                    if !data::in_board(eye)
                        || !self.home_half(piece.side, eye)
                        || self.piece_at(eye).is_some()
                    {
                        continue;
                    }
                    let dst = offset(eye, delta);
                    if data::in_board(dst) {
                        self.push_target(out, src, dst, captures);
                    }
                }
            }
            PieceKind::Knight => {
                for (i, legs) in data::KNIGHT_DELTA.iter().enumerate() {
                    let pin = offset(src, data::KING_DELTA[i]);
                    if self.piece_at(pin).is_some() {
                        continue;
                    }
                    for &delta in legs {
                        let dst = offset(src, delta);
                        if data::in_board(dst) {
                            self.push_target(out, src, dst, captures);
                        }
                    }
                }
            }
            PieceKind::Rook => {
                for delta in data::KING_DELTA {
                    let mut dst = offset(src, delta);
                    while data::in_board(dst) {
                        match self.piece_at(dst) {
                            None => {
                                if !captures {
                                    out.push(Move::new(src, dst));
                                }
                            }
                            Some(target) => {
                                if target.side != self.turn() {
                                    out.push(Move::new(src, dst));
                                }
                                break;
                            }
                        }
                        dst = offset(dst, delta);
                    }
                }
            }
            PieceKind::Cannon => {
                for delta in data::KING_DELTA {
                    let mut dst = offset(src, delta);
                    // quiet slide until the screen
                    while data::in_board(dst) {
                        if self.piece_at(dst).is_some() {
                            break;
                        }
                        if !captures {
                            out.push(Move::new(src, dst));
                        }
                        dst = offset(dst, delta);
                    }
                    // past the screen: the first piece is the only target
                    dst = offset(dst, delta);
                    while data::in_board(dst) {
                        if let Some(target) = self.piece_at(dst) {
                            if target.side != self.turn() {
                                out.push(Move::new(src, dst));
                            }
                            break;
                        }
                        dst = offset(dst, delta);
                    }
                }
            }
            PieceKind::Pawn => {
                let forward = self.forward_square(piece.side, src);
                if data::in_board(forward) {
                    self.push_target(out, src, forward, captures);
                }
                if self.away_half(piece.side, src) {
                    for delta in [-1isize, 1] {
                        let dst = offset(src, delta);
                        if data::in_board(dst) {
                            self.push_target(out, src, dst, captures);
                        }
                    }
                }
            }
        }
    }

    /// Movement rule for `piece` reaching `dst`, occupancy of `dst` aside.
    /// The king branch covers the flying-general capture, which makes this
    /// predicate double as the check scan.
    fn kind_legal_move(&self, piece: &Piece, dst: Square) -> bool {
        let src = piece.square;
        if dst == src {
            return false;
        }
        match piece.kind {
            PieceKind::King => {
                if data::in_fort(dst) && data::king_span(src, dst) {
                    return true;
                }
                // flying general: an open file straight to the enemy king
                if !data::same_file(src, dst) {
                    return false;
                }
                match self.piece_at(dst) {
                    Some(p) if p.kind == PieceKind::King && p.side != piece.side => {}
                    _ => return false,
                }
                self.ray_pieces_between(src, dst, if dst > src { 16 } else { -16 }) == 0
            }
            PieceKind::Advisor => data::in_fort(dst) && data::advisor_span(src, dst),
            PieceKind::Bishop => {
                data::same_half(src, dst)
                    && data::bishop_span(src, dst)
                    && self.piece_at(data::bishop_pin(src, dst)).is_none()
            }
            PieceKind::Knight => {
                let pin = data::knight_pin(src, dst);
                pin != src && self.piece_at(pin).is_none()
            }
            PieceKind::Rook | PieceKind::Cannon => {
                let delta: isize = if data::same_rank(src, dst) {
                    if dst < src { -1 } else { 1 }
                } else if data::same_file(src, dst) {
                    if dst < src { -16 } else { 16 }
                } else {
                    return false;
                };
                let screens = self.ray_pieces_between(src, dst, delta);
                match piece.kind {
                    PieceKind::Rook => screens == 0,
                    _ => {
                        if self.piece_at(dst).is_some() {
                            screens == 1
                        } else {
                            screens == 0
                        }
                    }
                }
            }
            PieceKind::Pawn => {
                if self.away_half(piece.side, src) && (dst == src - 1 || dst == src + 1) {
                    return true;
                }
                dst == self.forward_square(piece.side, src)
            }
        }
    }

    fn ray_pieces_between(&self, src: Square, dst: Square, delta: isize) -> usize {
        let mut count = 0;
        let mut sq = offset(src, delta);
        while sq != dst {
            if self.piece_at(sq).is_some() {
                count += 1;
            }
            sq = offset(sq, delta);
        }
        count
    }

    /// Is `side`'s king under attack right now?
    pub fn will_kill_king(&self, side: Side) -> bool {
        let Some(king_id) = self.player(side).king() else { return false };
        let king = self.piece(king_id);
        if !king.visible {
            return false;
        }
        for &id in self.player(side.opponent()).pieces() {
            let piece = self.piece(id);
            if piece.visible && self.kind_legal_move(piece, king.square) {
                return true;
            }
        }
        false
    }

    pub fn will_kill_self_king(&self) -> bool { self.will_kill_king(self.turn()) }

    pub fn will_kill_opponent_king(&self) -> bool { self.will_kill_king(self.turn().opponent()) }

    /// Structural validity for the side to move, self-check not considered.
    pub fn pseudo_legal(&self, mv: Move) -> bool {
        if mv.is_none() || !data::in_board(mv.end()) {
            return false;
        }
        let Some(piece) = self.piece_at(mv.start()) else { return false };
        if piece.side != self.turn() {
            return false;
        }
        if let Some(target) = self.piece_at(mv.end()) {
            if target.side == self.turn() {
                return false;
            }
        }
        self.kind_legal_move(piece, mv.end())
    }

    /// Full legality: movement rule plus the king staying safe.
    pub fn legal_move(&mut self, mv: Move) -> bool {
        if !self.pseudo_legal(mv) {
            return false;
        }
        self.make_move(mv);
        let safe = !self.will_kill_self_king();
        self.undo_move();
        safe
    }

    /// True when the side to move has no legal reply at all.
    pub fn no_way_to_move(&mut self) -> bool {
        let mut mvs = MoveList::new();
        self.generate_all_moves(&mut mvs);
        for &mv in mvs.iter() {
            self.make_move(mv);
            let safe = !self.will_kill_self_king();
            self.undo_move();
            if safe {
                return false;
            }
        }
        true
    }

    /// Capture ordering score: most valuable victim, least valuable
    /// attacker.
    pub fn mvv_lva(&self, mv: Move) -> i32 {
        let victim = self.piece_at(mv.end()).expect("capture move has a victim");
        let attacker = self.piece_at(mv.start()).expect("piece on the start square");
        MVV_VALUE[victim.kind.index()] * 10 - MVV_VALUE[attacker.kind.index()]
    }
}
