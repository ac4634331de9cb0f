//! The position: two piece rosters, a square map, the running hash and the
//! step history needed for undo and repetition detection.

use thiserror::Error;

use crate::data::{self, ADVANCED_VALUE};
use crate::moves::{board_square, mirror_square, rotate_square, Move, Square};
use crate::piece::{Piece, PieceId, PieceKind, Player, Side, MAX_PLAYER_PIECES};
use crate::zobrist::{Zobrist, ZobristTable};

pub const START_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenError {
    #[error("missing board or side-to-move field")]
    MissingField,
    #[error("expected 10 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {0} does not describe 9 files")]
    FileCount(usize),
    #[error("unknown piece letter {0:?}")]
    UnknownPiece(char),
    #[error("side-to-move field must be w or b")]
    SideToMove,
    #[error("each side needs exactly one king")]
    KingCount,
    #[error("a side has more than 16 pieces")]
    PieceCount,
}

/// One entry of the move history. `key` is the hash key of the position
/// the move was played from.
#[derive(Clone, Copy, Debug)]
pub struct Step {
    pub mv: Move,
    pub captured: Option<PieceId>,
    pub checked: bool,
    pub key: u32,
}

#[derive(Clone, Debug)]
pub struct Position {
    pieces: Vec<Piece>,
    players: [Player; 2],
    squares: [Option<PieceId>; 256],
    turn: Side,
    zobrist: Zobrist,
    steps: Vec<Step>,
}

impl Default for Position {
    fn default() -> Self { Position::new() }
}

impl Position {
    pub fn new() -> Self {
        Position {
            pieces: Vec::with_capacity(2 * MAX_PLAYER_PIECES),
            players: [Player::new(Side::Red), Player::new(Side::Black)],
            squares: [None; 256],
            turn: Side::Red,
            zobrist: Zobrist::default(),
            steps: Vec::with_capacity(2048),
        }
    }

    pub fn startpos() -> Self {
        Position::from_fen(START_FEN).expect("start position FEN parses")
    }

    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingField)?;
        let side_field = fields.next().ok_or(FenError::MissingField)?;

        let mut position = Position::new();
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 10 {
            return Err(FenError::RankCount(ranks.len()));
        }
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(d) = c.to_digit(10) {
                    col += d as usize;
                    continue;
                }
                let kind = PieceKind::from_fen_char(c).ok_or(FenError::UnknownPiece(c))?;
                let side = if c.is_ascii_uppercase() { Side::Red } else { Side::Black };
                if col >= 9 {
                    return Err(FenError::FileCount(row));
                }
                let player = &position.players[side.index()];
                if player.piece_count() == MAX_PLAYER_PIECES {
                    return Err(FenError::PieceCount);
                }
                if kind == PieceKind::King && player.king().is_some() {
                    return Err(FenError::KingCount);
                }
                position.spawn(kind, side, board_square(row, col));
                col += 1;
            }
            if col != 9 {
                return Err(FenError::FileCount(row));
            }
        }
        if position.players.iter().any(|p| p.king().is_none()) {
            return Err(FenError::KingCount);
        }
        match side_field {
            "w" | "r" => {}
            "b" => position.change_side(),
            _ => return Err(FenError::SideToMove),
        }
        Ok(position)
    }

    /// Reset to the given FEN, returning the side to move.
    pub fn load_fen(&mut self, fen: &str) -> Result<Side, FenError> {
        *self = Position::from_fen(fen)?;
        Ok(self.turn)
    }

    pub fn to_fen(&self) -> String {
        let mut ranks: Vec<String> = Vec::with_capacity(10);
        for row in 0..10 {
            let mut rank = String::new();
            let mut gap = 0u32;
            for col in 0..9 {
                match self.piece_at(board_square(row, col)) {
                    Some(piece) => {
                        if gap > 0 {
                            rank.push(char::from_digit(gap, 10).unwrap());
                            gap = 0;
                        }
                        rank.push(piece.kind.fen_char(piece.side));
                    }
                    None => gap += 1,
                }
            }
            if gap > 0 {
                rank.push(char::from_digit(gap, 10).unwrap());
            }
            ranks.push(rank);
        }
        let mut fen = ranks.join("/");
        fen.push_str(match self.turn {
            Side::Red => " w",
            Side::Black => " b",
        });
        fen
    }

    pub fn turn(&self) -> Side { self.turn }

    pub fn zobrist(&self) -> Zobrist { self.zobrist }

    pub fn checksum(&self) -> u64 { self.zobrist.checksum() }

    pub fn piece(&self, id: PieceId) -> &Piece { &self.pieces[id.0] }

    pub fn piece_id_at(&self, sq: Square) -> Option<PieceId> { self.squares[sq] }

    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.squares[sq].map(|id| &self.pieces[id.0])
    }

    pub fn player(&self, side: Side) -> &Player { &self.players[side.index()] }

    pub fn current_player(&self) -> &Player { &self.players[self.turn.index()] }

    pub fn opponent_player(&self) -> &Player { &self.players[self.turn.opponent().index()] }

    pub fn step_count(&self) -> usize { self.steps.len() }

    pub fn king_square(&self, side: Side) -> Square {
        let id = self.players[side.index()].king().expect("side has a king");
        self.pieces[id.0].square
    }

    /// One step toward the opposing home rank, decided by which half the
    /// side's own king stands on.
    pub fn forward_square(&self, side: Side, sq: Square) -> Square {
        if self.king_square(side) & 0x80 != 0 {
            sq - 16
        } else {
            sq + 16
        }
    }

    /// Whether `sq` lies across the river from `side`'s point of view.
    pub fn away_half(&self, side: Side, sq: Square) -> bool {
        !data::same_half(sq, self.king_square(side))
    }

    pub fn home_half(&self, side: Side, sq: Square) -> bool {
        data::same_half(sq, self.king_square(side))
    }

    /// New piece entering play. Construction only; moving pieces go through
    /// `add_piece`/`del_piece`.
    fn spawn(&mut self, kind: PieceKind, side: Side, sq: Square) {
        debug_assert!(self.squares[sq].is_none());
        let id = PieceId(self.pieces.len());
        self.pieces.push(Piece { kind, side, square: sq, visible: false });
        self.players[side.index()].register(id, kind);
        self.add_piece(id, sq);
    }

    /// Put a known piece (back) on the board: square map, side value and
    /// hash all updated.
    pub(crate) fn add_piece(&mut self, id: PieceId, sq: Square) {
        let piece = &mut self.pieces[id.0];
        piece.square = sq;
        piece.visible = true;
        let (side, kind) = (piece.side, piece.kind);
        let value = piece.value_at(sq);
        self.squares[sq] = Some(id);
        self.players[side.index()].value += value;
        self.zobrist ^= ZobristTable::shared().piece(side, kind, sq);
    }

    /// Lift the piece off `sq`, keeping it allocated for undo.
    pub(crate) fn del_piece(&mut self, sq: Square) -> Option<PieceId> {
        let id = self.squares[sq].take()?;
        let piece = &mut self.pieces[id.0];
        piece.visible = false;
        let (side, kind) = (piece.side, piece.kind);
        let value = piece.value_at(sq);
        self.players[side.index()].value -= value;
        self.zobrist ^= ZobristTable::shared().piece(side, kind, sq);
        Some(id)
    }

    pub fn change_side(&mut self) {
        self.turn = self.turn.opponent();
        self.zobrist ^= ZobristTable::shared().player;
    }

    /// Move a piece. Purely structural: the side to move does not change
    /// and leaving one's own king attacked is the caller's concern.
    pub fn make_move(&mut self, mv: Move) {
        let key = self.zobrist.key;
        let captured = self.del_piece(mv.end());
        let id = self.del_piece(mv.start()).expect("no piece on the start square");
        self.add_piece(id, mv.end());
        let checked = self.will_kill_opponent_king();
        self.steps.push(Step { mv, captured, checked, key });
    }

    /// Take back the last move. A no-op when the history is empty.
    pub fn undo_move(&mut self) -> bool {
        let Some(step) = self.steps.pop() else { return false };
        debug_assert!(step.mv.is_some(), "null steps are undone with undo_null_move");
        let id = self.del_piece(step.mv.end()).expect("moved piece on the end square");
        self.add_piece(id, step.mv.start());
        if let Some(captured) = step.captured {
            self.add_piece(captured, step.mv.end());
        }
        true
    }

    /// Record a pass. Like `make_move` the turn flip belongs to the caller.
    pub fn make_null_move(&mut self) {
        self.steps.push(Step {
            mv: Move::NONE,
            captured: None,
            checked: false,
            key: self.zobrist.key,
        });
    }

    pub fn undo_null_move(&mut self) { self.steps.pop(); }

    /// Full move for game hosts: legality against self-check included.
    pub fn play(&mut self, mv: Move) -> bool {
        self.make_move(mv);
        if self.will_kill_self_king() {
            self.undo_move();
            return false;
        }
        self.change_side();
        true
    }

    pub fn undo_play(&mut self) -> bool {
        if self.steps.is_empty() {
            return false;
        }
        self.change_side();
        self.undo_move()
    }

    /// Material and position difference from the mover's point of view,
    /// with a small tempo bonus.
    pub fn evaluate(&self) -> i32 {
        self.players[self.turn.index()].value - self.players[self.turn.opponent().index()].value
            + ADVANCED_VALUE
    }

    /// Scan the reversible tail of the history for repetitions of the
    /// current position. Returns 0 or a bitmask: 1 = repetition found,
    /// +2 = the mover has checked throughout, +4 = the opponent has.
    pub fn repetition_status(&self, mut recur: i32) -> i32 {
        let mut self_side = false;
        let mut perp_check = true;
        let mut opp_perp_check = true;
        for step in self.steps.iter().rev() {
            if step.mv.is_none() || step.captured.is_some() {
                break;
            }
            if self_side {
                perp_check = perp_check && step.checked;
                if step.key == self.zobrist.key {
                    recur -= 1;
                    if recur == 0 {
                        let mut status = 1;
                        if perp_check {
                            status += 2;
                        }
                        if opp_perp_check {
                            status += 4;
                        }
                        return status;
                    }
                }
            } else {
                opp_perp_check = opp_perp_check && step.checked;
            }
            self_side = !self_side;
        }
        0
    }

    /// Left-right reflection. Same side to move, history not carried over.
    pub fn mirror(&self) -> Position {
        let mut out = Position::new();
        for piece in self.pieces.iter().filter(|p| p.visible) {
            out.spawn(piece.kind, piece.side, mirror_square(piece.square));
        }
        if self.turn == Side::Black {
            out.change_side();
        }
        out
    }

    /// Swap the two armies through the board center. The mover keeps its
    /// color and now commands the other army.
    pub fn exchange_side(&self) -> Position {
        let mut out = Position::new();
        for piece in self.pieces.iter().filter(|p| p.visible) {
            out.spawn(piece.kind, piece.side.opponent(), rotate_square(piece.square));
        }
        if self.turn == Side::Black {
            out.change_side();
        }
        out
    }

    /// Hash triple of the mirrored position, computed without building it.
    pub fn mirror_zobrist(&self) -> Zobrist {
        let table = ZobristTable::shared();
        let mut zobrist = Zobrist::default();
        if self.turn == Side::Black {
            zobrist ^= table.player;
        }
        for piece in self.pieces.iter().filter(|p| p.visible) {
            zobrist ^= table.piece(piece.side, piece.kind, mirror_square(piece.square));
        }
        zobrist
    }

    pub fn mirror_checksum(&self) -> u64 { self.mirror_zobrist().checksum() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iccs::iccs_to_move;

    #[test]
    fn test_fen_round_trip() {
        let fens = [
            START_FEN,
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C2C4/9/RNBAKABNR b",
            "1rbakabr1/9/1cn3nc1/p1p1p1p1p/9/2P6/P3P1P1P/1CN1C1N2/9/R1BAKAB1R w",
            "3k5/9/9/9/9/9/9/9/9/4K4 w",
        ];
        for fen in fens {
            let position = Position::from_fen(fen).unwrap();
            assert_eq!(position.to_fen(), fen);
        }
    }

    #[test]
    fn test_fen_rejects_malformed_input() {
        assert_eq!(Position::from_fen("").unwrap_err(), FenError::MissingField);
        assert_eq!(Position::from_fen("9/9/9/9/9/9/9/9/9 w").unwrap_err(), FenError::RankCount(9));
        assert_eq!(
            Position::from_fen("rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/8/RNBAKABNR w")
                .unwrap_err(),
            FenError::FileCount(8)
        );
        assert_eq!(
            Position::from_fen("rnbaqabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w")
                .unwrap_err(),
            FenError::UnknownPiece('q')
        );
        assert_eq!(
            Position::from_fen("rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR x")
                .unwrap_err(),
            FenError::SideToMove
        );
        assert_eq!(Position::from_fen("3k5/9/9/9/9/9/9/9/9/9 w").unwrap_err(), FenError::KingCount);
        assert_eq!(
            Position::from_fen("3kk4/9/9/9/9/9/9/9/9/4K4 w").unwrap_err(),
            FenError::KingCount
        );
    }

    #[test]
    fn test_fen_aliases() {
        // E and H are accepted on input and normalized on output
        let position = Position::from_fen("rheakaehr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RHEAKAEHR w")
            .unwrap();
        assert_eq!(position.to_fen(), START_FEN);
    }

    #[test]
    fn test_make_undo_restores_hash() {
        let mut position = Position::startpos();
        let before = position.zobrist();
        let fen = position.to_fen();

        // a short opening with one capture: central cannon takes the pawn
        for iccs in ["h2e2", "h9g7", "e2e6", "b9c7"] {
            let mv = iccs_to_move(iccs).unwrap();
            assert!(position.play(mv), "move {iccs} should be legal");
        }
        assert_ne!(position.zobrist(), before);
        for _ in 0..4 {
            assert!(position.undo_play());
        }
        assert_eq!(position.zobrist(), before);
        assert_eq!(position.to_fen(), fen);
        assert!(!position.undo_play());
    }

    #[test]
    fn test_random_playout_unwinds() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(0xcc);
        let mut position = Position::startpos();
        let before = position.zobrist();
        let fen = position.to_fen();
        let mut played = 0;
        for _ in 0..60 {
            let mut mvs = crate::generate::MoveList::new();
            position.generate_all_moves_noncheck(&mut mvs);
            if mvs.is_empty() {
                break;
            }
            let mv = mvs.as_slice()[rng.gen_range(0..mvs.len())];
            assert!(position.play(mv));
            played += 1;
        }
        for _ in 0..played {
            assert!(position.undo_play());
        }
        assert_eq!(position.zobrist(), before);
        assert_eq!(position.to_fen(), fen);
    }

    #[test]
    fn test_null_move_restores_hash() {
        let mut position = Position::startpos();
        let before = position.zobrist();
        position.make_null_move();
        position.change_side();
        assert_ne!(position.zobrist(), before);
        position.change_side();
        position.undo_null_move();
        assert_eq!(position.zobrist(), before);
    }

    #[test]
    fn test_evaluate_symmetry() {
        let fens = [
            START_FEN,
            "1rbakabr1/9/1cn3nc1/p1p1p1p1p/9/2P6/P3P1P1P/1CN1C1N2/9/R1BAKAB1R w",
            "3k5/9/9/9/9/9/9/9/9/4K4 b",
        ];
        for fen in fens {
            let position = Position::from_fen(fen).unwrap();
            assert_eq!(position.evaluate(), position.mirror().evaluate(), "mirror of {fen}");
            let exchanged = position.exchange_side();
            assert_eq!(
                position.evaluate() - ADVANCED_VALUE,
                -(exchanged.evaluate() - ADVANCED_VALUE),
                "exchange of {fen}"
            );
        }
    }

    #[test]
    fn test_mirror_zobrist_matches_mirror() {
        let position =
            Position::from_fen("1rbakabr1/9/1cn3nc1/p1p1p1p1p/9/2P6/P3P1P1P/1CN1C1N2/9/R1BAKAB1R b")
                .unwrap();
        assert_eq!(position.mirror_zobrist(), position.mirror().zobrist());
        assert_eq!(position.mirror_checksum(), position.mirror().checksum());
    }

    #[test]
    fn test_repetition_perpetual_check() {
        // lone red rook chases the black king between d9 and e9, checking
        // on every move; black never checks back
        let mut position = Position::from_fen("4k4/9/9/9/9/9/9/9/7R1/5K3 w").unwrap();
        for iccs in ["h1e1", "e9d9", "e1d1", "d9e9", "d1e1", "e9d9", "e1d1", "d9e9"] {
            let mv = iccs_to_move(iccs).unwrap();
            assert!(position.play(mv), "move {iccs} should be legal");
        }
        let status = position.repetition_status(1);
        assert_eq!(status & 1, 1, "repetition detected");
        assert_eq!(status & 2, 2, "mover checks throughout");
        assert_eq!(status & 4, 0, "opponent never checks");
    }

    #[test]
    fn test_repetition_cleared_by_capture() {
        let mut position = Position::from_fen("4k4/9/9/9/9/9/9/9/7R1/5K3 w").unwrap();
        for iccs in ["h1e1", "e9d9", "e1d1", "d9e9", "d1e1", "e9d9", "e1d1", "d9e9"] {
            position.play(iccs_to_move(iccs).unwrap());
        }
        assert_ne!(position.repetition_status(1), 0);
        let fen = position.to_fen();
        let reloaded = Position::from_fen(&fen).unwrap();
        // a fresh history has nothing to repeat
        assert_eq!(reloaded.repetition_status(1), 0);
    }
}
