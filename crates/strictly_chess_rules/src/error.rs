//! Errors reported by the rules oracle.

use crate::{PieceKind, Square};

/// Reasons the oracle refuses a request.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RulesError {
    /// The move is not legal in the current position.
    #[display("Illegal move {} to {}", from, to)]
    IllegalMove {
        /// Origin square.
        from: Square,
        /// Destination square.
        to: Square,
        /// Requested promotion, if any.
        promotion: Option<PieceKind>,
    },

    /// A pawn reached the last rank without a promotion choice.
    #[display("Move {}{} requires a promotion piece", _0, _1)]
    PromotionRequired(Square, Square),

    /// Text that is not a square name.
    #[display("Invalid square '{}'", _0)]
    InvalidSquare(String),

    /// Text that is not compact move notation.
    #[display("Invalid move notation '{}'", _0)]
    InvalidNotation(String),

    /// Short algebraic notation that names no legal move here.
    #[display("Move '{}' is not legal in this position", _0)]
    UnplayableSan(String),

    /// A position encoding that cannot be loaded.
    #[display("Invalid position '{}': {}", fen, reason)]
    InvalidPosition {
        /// The rejected encoding.
        fen: String,
        /// Parser or validation detail.
        reason: String,
    },
}

impl std::error::Error for RulesError {}
