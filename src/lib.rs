//! A xiangqi (Chinese chess) engine: position model, legal move
//! generation, incremental hashing and an iterative-deepening alpha-beta
//! search.
//!
//! ```
//! use cchess::{Engine, Position};
//!
//! let mut engine = Engine::new(Position::startpos());
//! let mv = engine.search(6, 1000).expect("the opening has moves");
//! assert!(engine.board_mut().legal_move(mv));
//! ```

pub mod board;
pub mod data;
pub mod engine;
pub mod generate;
pub mod iccs;
pub mod moves;
pub mod piece;
pub mod zobrist;

pub use board::{FenError, Position, START_FEN};
pub use engine::{Engine, OpeningBook};
pub use generate::MoveList;
pub use moves::Move;
pub use piece::{Piece, PieceKind, Side};
