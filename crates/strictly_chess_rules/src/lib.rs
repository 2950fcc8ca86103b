//! Strictly Chess Rules - chess vocabulary and the rules oracle.
//!
//! This crate is the only place that knows how chess moves work. Sessions
//! talk to it through the [`RulesOracle`] trait and exchange plain values:
//! position encodings (FEN strings), [`MoveRequest`]s in, [`MoveRecord`]s and
//! [`PositionStatus`] out.
//!
//! # Example
//!
//! ```
//! use strictly_chess_rules::{MoveRequest, RulesOracle, ShakmatyOracle};
//!
//! let mut oracle = ShakmatyOracle::new();
//! let record = oracle.apply_move(&"e2e4".parse::<MoveRequest>()?)?;
//! assert_eq!(record.san, "e4");
//! # Ok::<(), strictly_chess_rules::RulesError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod moves;
mod oracle;
mod shakmaty_oracle;
mod status;
mod types;

pub use error::RulesError;
pub use moves::{MoveRecord, MoveRequest};
pub use oracle::RulesOracle;
pub use shakmaty_oracle::ShakmatyOracle;
pub use status::{DrawReason, PositionStatus};
pub use types::{Color, MoveFlag, PieceKind, Square};

/// Encoding of the standard chess start position.
pub const START_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
