//! Alpha-beta search: iterative deepening with principal variation
//! search, null-move pruning, quiescence, a transposition table and
//! history/killer move ordering.

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::board::{FenError, Position};
use crate::data::{
    BAN_VALUE, DRAW_VALUE, LIMIT_DEPTH, MATE_VALUE, NULL_DEPTH, NULL_OKAY_MARGIN,
    NULL_SAFE_MARGIN, WIN_VALUE,
};
use crate::generate::MoveList;
use crate::iccs::move_to_iccs;
use crate::moves::Move;
use crate::piece::Side;

/// Narrow seam to an external opening library. `probe` gets the position
/// checksum and the checksum of its left-right mirror; the implementation
/// is responsible for orienting the returned move to the probed position.
pub trait OpeningBook {
    fn probe(&self, checksum: u64, mirror_checksum: u64) -> Option<Move>;
}

const TT_SIZE: usize = 1 << 16;
const HISTORY_SIZE: usize = 1 << 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
enum Bound {
    #[default]
    None,
    Alpha,
    Beta,
    Pv,
}

#[derive(Clone, Copy, Default)]
struct TtItem {
    depth: i32,
    flag: Bound,
    value: i32,
    mv: Move,
    lock1: u32,
    lock2: u32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    TtMove,
    KillerFirst,
    KillerSecond,
    Generate,
    Rest,
}

/// Phased move picker: hash move, killers, then the generated rest. When
/// the mover is in check it degrades to one history-sorted legal list.
struct MovePicker {
    phase: Phase,
    tt_mv: Move,
    killer1: Move,
    killer2: Move,
    list: MoveList,
    index: usize,
}

pub struct Engine {
    board: Position,
    distance: i32,
    all_nodes: u64,
    result: Move,
    hash_table: Vec<TtItem>,
    history: Vec<i32>,
    killer_table: [[Move; 2]; LIMIT_DEPTH],
    book: Option<Box<dyn OpeningBook>>,
}

impl Engine {
    pub fn new(board: Position) -> Self {
        Engine {
            board,
            distance: 0,
            all_nodes: 0,
            result: Move::NONE,
            hash_table: vec![TtItem::default(); TT_SIZE],
            history: vec![0; HISTORY_SIZE],
            killer_table: [[Move::NONE; 2]; LIMIT_DEPTH],
            book: None,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Engine, FenError> {
        Ok(Engine::new(Position::from_fen(fen)?))
    }

    pub fn set_book(&mut self, book: Box<dyn OpeningBook>) { self.book = Some(book); }

    pub fn board(&self) -> &Position { &self.board }

    pub fn board_mut(&mut self) -> &mut Position { &mut self.board }

    pub fn load_fen(&mut self, fen: &str) -> Result<Side, FenError> { self.board.load_fen(fen) }

    pub fn node_count(&self) -> u64 { self.all_nodes }

    fn in_check(&self) -> bool { self.board.will_kill_self_king() }

    fn mate_value(&self) -> i32 { self.distance - MATE_VALUE }

    fn ban_value(&self) -> i32 { self.distance - BAN_VALUE }

    /// Draw score, signed by ply parity so both sides see a repetition
    /// the same way.
    fn draw_value(&self) -> i32 {
        if self.distance & 1 == 0 {
            -DRAW_VALUE
        } else {
            DRAW_VALUE
        }
    }

    fn evaluate(&self) -> i32 {
        let vl = self.board.evaluate();
        // the exact draw score is reserved for real repetitions
        if vl == self.draw_value() {
            vl - 1
        } else {
            vl
        }
    }

    fn repetition_value(&self, rep: i32) -> i32 {
        let mut vl = 0;
        if rep & 2 != 0 {
            vl += self.ban_value();
        }
        if rep & 4 != 0 {
            vl -= self.ban_value();
        }
        if vl == 0 {
            self.draw_value()
        } else {
            vl
        }
    }

    fn null_okay(&self) -> bool { self.board.current_player().value > NULL_OKAY_MARGIN }

    fn null_safe(&self) -> bool { self.board.current_player().value > NULL_SAFE_MARGIN }

    /// Apply a move for the search: self-check filtered, turn flipped.
    fn make_move(&mut self, mv: Move) -> bool {
        self.board.make_move(mv);
        if self.board.will_kill_self_king() {
            self.board.undo_move();
            return false;
        }
        self.board.change_side();
        self.distance += 1;
        true
    }

    fn undo_move(&mut self) {
        self.distance -= 1;
        self.board.change_side();
        self.board.undo_move();
    }

    fn do_null_move(&mut self) {
        debug_assert!(!self.in_check());
        self.distance += 1;
        self.board.make_null_move();
        self.board.change_side();
    }

    fn undo_null_move(&mut self) {
        self.distance -= 1;
        self.board.change_side();
        self.board.undo_null_move();
    }

    fn probe_hash(&self, alpha: i32, beta: i32, depth: i32) -> (Move, Option<i32>) {
        let zobrist = self.board.zobrist();
        let item = &self.hash_table[zobrist.key as usize & (TT_SIZE - 1)];
        if item.lock1 != zobrist.lock1 || item.lock2 != zobrist.lock2 {
            return (Move::NONE, None);
        }
        let mv = item.mv;
        let mut value = item.value;
        let mut mate = false;
        if value > WIN_VALUE {
            if value <= BAN_VALUE {
                return (mv, None);
            }
            value -= self.distance;
            mate = true;
        } else if value < -WIN_VALUE {
            if value >= -BAN_VALUE {
                return (mv, None);
            }
            value += self.distance;
            mate = true;
        } else if value == self.draw_value() {
            // repetition scores are path-dependent; only reuse the move
            return (mv, None);
        }
        if item.depth < depth && !mate {
            return (mv, None);
        }
        match item.flag {
            Bound::Beta if value >= beta => (mv, Some(value)),
            Bound::Alpha if value <= alpha => (mv, Some(value)),
            Bound::Pv => (mv, Some(value)),
            _ => (mv, None),
        }
    }

    fn record_hash(&mut self, flag: Bound, value: i32, depth: i32, mv: Move) {
        let zobrist = self.board.zobrist();
        let index = zobrist.key as usize & (TT_SIZE - 1);
        if self.hash_table[index].depth > depth {
            return;
        }
        let stored = if value > WIN_VALUE {
            if mv.is_none() && value <= BAN_VALUE {
                return;
            }
            value + self.distance
        } else if value < -WIN_VALUE {
            if mv.is_none() && value >= -BAN_VALUE {
                return;
            }
            value - self.distance
        } else if value == self.draw_value() && mv.is_none() {
            return;
        } else {
            value
        };
        self.hash_table[index] =
            TtItem { depth, flag, value: stored, mv, lock1: zobrist.lock1, lock2: zobrist.lock2 };
    }

    fn set_best_move(&mut self, mv: Move, depth: i32) {
        self.history[mv.index()] += depth * depth;
        let killers = &mut self.killer_table[self.distance as usize];
        if killers[0] != mv {
            *killers = [mv, killers[0]];
        }
    }

    fn sort_by_history(&self, list: &mut MoveList) {
        list.as_mut_slice().sort_by_key(|mv| Reverse(self.history[mv.index()]));
    }

    fn sort_by_mvv_lva(&self, list: &mut MoveList) {
        let board = &self.board;
        list.as_mut_slice().sort_by_key(|mv| Reverse(board.mvv_lva(*mv)));
    }

    fn new_picker(&mut self, tt_mv: Move) -> MovePicker {
        let mut picker = MovePicker {
            phase: Phase::TtMove,
            tt_mv,
            killer1: Move::NONE,
            killer2: Move::NONE,
            list: MoveList::new(),
            index: 0,
        };
        if self.in_check() {
            // evasions: one legal list ordered by history, no phases
            picker.phase = Phase::Rest;
            picker.tt_mv = Move::NONE;
            let mut list = MoveList::new();
            self.board.generate_all_moves_noncheck(&mut list);
            self.sort_by_history(&mut list);
            picker.list = list;
        } else {
            let killers = self.killer_table[self.distance as usize];
            picker.killer1 = killers[0];
            picker.killer2 = killers[1];
        }
        picker
    }

    fn next_move(&mut self, picker: &mut MovePicker) -> Move {
        loop {
            match picker.phase {
                Phase::TtMove => {
                    picker.phase = Phase::KillerFirst;
                    if picker.tt_mv.is_some() {
                        return picker.tt_mv;
                    }
                }
                Phase::KillerFirst => {
                    picker.phase = Phase::KillerSecond;
                    let mv = picker.killer1;
                    if mv.is_some() && mv != picker.tt_mv && self.board.legal_move(mv) {
                        return mv;
                    }
                }
                Phase::KillerSecond => {
                    picker.phase = Phase::Generate;
                    let mv = picker.killer2;
                    if mv.is_some() && mv != picker.tt_mv && self.board.legal_move(mv) {
                        return mv;
                    }
                }
                Phase::Generate => {
                    picker.phase = Phase::Rest;
                    self.board.generate_all_moves(&mut picker.list);
                    self.sort_by_history(&mut picker.list);
                    picker.index = 0;
                }
                Phase::Rest => {
                    while picker.index < picker.list.len() {
                        let mv = picker.list.as_slice()[picker.index];
                        picker.index += 1;
                        if mv != picker.tt_mv && mv != picker.killer1 && mv != picker.killer2 {
                            return mv;
                        }
                    }
                    return Move::NONE;
                }
            }
        }
    }

    /// Capture-only search at the horizon.
    pub fn search_quiescence(&mut self, mut alpha: i32, beta: i32) -> i32 {
        self.all_nodes += 1;

        let mut vl = self.mate_value();
        if vl >= beta {
            return vl;
        }
        let rep = self.board.repetition_status(1);
        if rep > 0 {
            return self.repetition_value(rep);
        }
        if self.distance == LIMIT_DEPTH as i32 {
            return self.evaluate();
        }

        let mut best = -MATE_VALUE;
        let mut list = MoveList::new();
        if self.in_check() {
            self.board.generate_all_moves(&mut list);
            self.sort_by_history(&mut list);
        } else {
            // stand pat
            vl = self.evaluate();
            if vl > best {
                if vl >= beta {
                    return vl;
                }
                best = vl;
                alpha = alpha.max(vl);
            }
            self.board.generate_all_capture_moves(&mut list);
            self.sort_by_mvv_lva(&mut list);
        }

        for i in 0..list.len() {
            let mv = list.as_slice()[i];
            if !self.make_move(mv) {
                continue;
            }
            vl = -self.search_quiescence(-beta, -alpha);
            self.undo_move();
            if vl > best {
                if vl >= beta {
                    return vl;
                }
                best = vl;
                alpha = alpha.max(vl);
            }
        }

        if best == -MATE_VALUE {
            self.mate_value()
        } else {
            best
        }
    }

    /// Main recursive search.
    pub fn search_full(&mut self, mut alpha: i32, beta: i32, depth: i32, no_null: bool) -> i32 {
        if depth <= 0 {
            return self.search_quiescence(alpha, beta);
        }
        self.all_nodes += 1;

        let mut vl = self.mate_value();
        if vl >= beta {
            return vl;
        }
        let rep = self.board.repetition_status(1);
        if rep > 0 {
            return self.repetition_value(rep);
        }

        let (tt_mv, tt_value) = self.probe_hash(alpha, beta, depth);
        if let Some(value) = tt_value {
            return value;
        }

        if self.distance == LIMIT_DEPTH as i32 {
            return self.evaluate();
        }

        if !no_null && !self.in_check() && self.null_okay() {
            self.do_null_move();
            vl = -self.search_full(-beta, 1 - beta, depth - NULL_DEPTH - 1, true);
            self.undo_null_move();
            if vl >= beta
                && (self.null_safe()
                    || self.search_full(alpha, beta, depth - NULL_DEPTH, true) >= beta)
            {
                return vl;
            }
        }

        let mut flag = Bound::Alpha;
        let mut best = -MATE_VALUE;
        let mut mv_best = Move::NONE;
        let mut picker = self.new_picker(tt_mv);
        loop {
            let mv = self.next_move(&mut picker);
            if mv.is_none() {
                break;
            }
            if !self.make_move(mv) {
                continue;
            }
            // checks are searched one ply deeper
            let new_depth = if self.in_check() { depth } else { depth - 1 };
            if best == -MATE_VALUE {
                vl = -self.search_full(-beta, -alpha, new_depth, false);
            } else {
                vl = -self.search_full(-alpha - 1, -alpha, new_depth, false);
                if alpha < vl && vl < beta {
                    vl = -self.search_full(-beta, -alpha, new_depth, false);
                }
            }
            self.undo_move();
            if vl > best {
                best = vl;
                if vl >= beta {
                    flag = Bound::Beta;
                    mv_best = mv;
                    break;
                }
                if vl > alpha {
                    alpha = vl;
                    flag = Bound::Pv;
                    mv_best = mv;
                }
            }
        }

        if best == -MATE_VALUE {
            // no legal reply: mated here
            return self.mate_value();
        }
        self.record_hash(flag, best, depth, mv_best);
        if mv_best.is_some() {
            self.set_best_move(mv_best, depth);
        }
        best
    }

    /// One full-width iteration from the root, tracking the best move.
    pub fn search_root(&mut self, depth: i32) -> i32 {
        let mut best = -MATE_VALUE;
        let mut list = MoveList::new();
        self.board.generate_all_moves_noncheck(&mut list);
        self.sort_by_history(&mut list);

        for i in 0..list.len() {
            let mv = list.as_slice()[i];
            if !self.make_move(mv) {
                continue;
            }
            let new_depth = if self.in_check() { depth } else { depth - 1 };
            let mut vl;
            if best == -MATE_VALUE {
                vl = -self.search_full(-MATE_VALUE, MATE_VALUE, new_depth, true);
            } else {
                vl = -self.search_full(-best - 1, -best, new_depth, false);
                if vl > best {
                    vl = -self.search_full(-MATE_VALUE, -best, new_depth, true);
                }
            }
            self.undo_move();
            if vl > best {
                best = vl;
                self.result = mv;
            }
        }
        if self.result.is_some() {
            self.set_best_move(self.result, depth);
        }
        best
    }

    fn reset(&mut self) {
        self.hash_table.iter_mut().for_each(|item| *item = TtItem::default());
        self.history.iter_mut().for_each(|vl| *vl = 0);
        self.killer_table = [[Move::NONE; 2]; LIMIT_DEPTH];
        self.result = Move::NONE;
        self.all_nodes = 0;
        self.distance = 0;
    }

    /// Pick a move: book first, then iterative deepening up to
    /// `depth_limit` plies within the wall-clock budget. `None` means the
    /// side to move has no legal move at all.
    pub fn search(&mut self, depth_limit: i32, millis: u64) -> Option<Move> {
        if let Some(book) = self.book.as_deref() {
            if let Some(mv) = book.probe(self.board.checksum(), self.board.mirror_checksum()) {
                if self.board.legal_move(mv) && self.board.play(mv) {
                    let rep = self.board.repetition_status(3);
                    self.board.undo_play();
                    if rep == 0 {
                        info!("book move {}", move_to_iccs(mv));
                        return Some(mv);
                    }
                }
            }
        }

        self.reset();
        let start = Instant::now();
        let deadline = Duration::from_millis(millis);
        let depth_limit = depth_limit.clamp(1, LIMIT_DEPTH as i32);
        let mut vl = -MATE_VALUE;
        for depth in 1..=depth_limit {
            vl = self.search_root(depth);
            debug!(
                "depth {depth}: score {vl}, best {}, {} nodes",
                move_to_iccs(self.result),
                self.all_nodes
            );
            if start.elapsed() >= deadline {
                break;
            }
            // a forced result will not change with more depth
            if !(-WIN_VALUE..=WIN_VALUE).contains(&vl) {
                break;
            }
        }
        info!("searched {} nodes in {:?}, score {vl}", self.all_nodes, start.elapsed());
        if self.result.is_some() {
            Some(self.result)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;
    use crate::iccs::iccs_to_move;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_finds_mate_in_one() {
        init_logger();
        let mut engine = Engine::from_fen("4k4/R8/1R7/9/9/9/9/9/9/3K5 w").unwrap();
        let mv = engine.search(4, 10_000).unwrap();
        assert_eq!(move_to_iccs(mv), "b7b9");
        assert!(engine.board_mut().play(mv));
        assert!(engine.board_mut().no_way_to_move());
    }

    #[test]
    fn test_mated_side_has_no_move() {
        let mut engine = Engine::from_fen("3k5/9/9/9/3rrr3/9/9/9/9/4K4 w").unwrap();
        assert!(engine.board_mut().no_way_to_move());
        assert_eq!(engine.search(4, 10_000), None);
        // fixed-depth value sits in the mate band
        let vl = engine.search_full(-MATE_VALUE, MATE_VALUE, 2, true);
        assert!(vl <= -WIN_VALUE, "mate score expected, got {vl}");
    }

    #[test]
    fn test_search_is_deterministic() {
        init_logger();
        let fen = "1rbakabr1/9/1cn3nc1/p1p1p1p1p/9/2P6/P3P1P1P/1CN1C1N2/9/R1BAKAB1R w";
        let mut first = Engine::from_fen(fen).unwrap();
        let mut second = Engine::from_fen(fen).unwrap();
        let mv_first = first.search(4, 600_000);
        let mv_second = second.search(4, 600_000);
        assert_eq!(mv_first, mv_second);
        assert_eq!(first.node_count(), second.node_count());
    }

    #[test]
    fn test_search_while_in_check() {
        // the mover starts in check: evasions only, null move never tried
        let mut engine = Engine::from_fen("3k5/9/9/9/4r4/9/9/9/9/4K4 w").unwrap();
        assert!(engine.board().will_kill_self_king());
        let mv = engine.search(3, 10_000).unwrap();
        assert!(engine.board_mut().legal_move(mv));
    }

    #[test]
    fn test_hash_store_and_probe() {
        let mut engine = Engine::from_fen(START_FEN).unwrap();
        let mv = iccs_to_move("h2e2").unwrap();
        engine.record_hash(Bound::Pv, 123, 5, mv);
        let (tt_mv, value) = engine.probe_hash(-MATE_VALUE, MATE_VALUE, 5);
        assert_eq!(tt_mv, mv);
        assert_eq!(value, Some(123));
        // shallower entries do not satisfy deeper probes
        let (_, value) = engine.probe_hash(-MATE_VALUE, MATE_VALUE, 6);
        assert_eq!(value, None);
        // a different position misses
        engine.board_mut().change_side();
        let (tt_mv, value) = engine.probe_hash(-MATE_VALUE, MATE_VALUE, 5);
        assert_eq!(tt_mv, Move::NONE);
        assert_eq!(value, None);
    }

    #[test]
    fn test_hash_mate_scores_are_distance_adjusted() {
        let mut engine = Engine::from_fen(START_FEN).unwrap();
        let mv = iccs_to_move("h2e2").unwrap();
        engine.distance = 3;
        engine.record_hash(Bound::Pv, MATE_VALUE - 5, 2, mv);
        engine.distance = 7;
        let (_, value) = engine.probe_hash(-MATE_VALUE, MATE_VALUE, 2);
        // stored relative to its node, probed four plies deeper
        assert_eq!(value, Some(MATE_VALUE - 5 + 3 - 7));
    }

    struct FixedBook(Move);

    impl OpeningBook for FixedBook {
        fn probe(&self, _checksum: u64, _mirror_checksum: u64) -> Option<Move> { Some(self.0) }
    }

    #[test]
    fn test_book_move_is_used_when_legal() {
        let mut engine = Engine::from_fen(START_FEN).unwrap();
        let mv = iccs_to_move("h2e2").unwrap();
        engine.set_book(Box::new(FixedBook(mv)));
        assert_eq!(engine.search(2, 10_000), Some(mv));
        assert_eq!(engine.node_count(), 0, "no tree search behind a book hit");
    }

    #[test]
    fn test_illegal_book_move_falls_through() {
        let mut engine = Engine::from_fen(START_FEN).unwrap();
        engine.set_book(Box::new(FixedBook(iccs_to_move("a0a5").unwrap())));
        let mv = engine.search(2, 10_000).unwrap();
        assert!(engine.board_mut().legal_move(mv));
        assert_ne!(move_to_iccs(mv), "a0a5");
    }

    #[test]
    fn test_perpetual_check_scored_against_checker() {
        let mut engine = Engine::from_fen("4k4/9/9/9/9/9/9/9/7R1/5K3 w").unwrap();
        for iccs in ["h1e1", "e9d9", "e1d1", "d9e9", "d1e1", "e9d9", "e1d1", "d9e9"] {
            assert!(engine.make_move(iccs_to_move(iccs).unwrap()));
        }
        let rep = engine.board.repetition_status(1);
        assert_ne!(rep, 0);
        let vl = engine.repetition_value(rep);
        assert!(vl < -WIN_VALUE, "checking side is losing, got {vl}");
    }
}
