//! Position status as reported by the oracle.

use serde::{Deserialize, Serialize};

/// Why a game ended in a draw.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrawReason {
    /// Same position reached three times.
    ThreefoldRepetition,
    /// Neither side can deliver mate.
    InsufficientMaterial,
    /// One hundred plies without a capture or pawn move.
    FiftyMoveRule,
}

/// Snapshot of check and game-end conditions for a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionStatus {
    /// Side to move is in check.
    pub in_check: bool,
    /// Side to move is checkmated.
    pub checkmate: bool,
    /// Side to move has no legal move and is not in check.
    pub stalemate: bool,
    /// Any automatic draw condition holds.
    pub draw: bool,
    /// Neither side has mating material.
    pub insufficient_material: bool,
    /// The current position occurred for the third time.
    pub threefold_repetition: bool,
    /// The halfmove clock reached one hundred.
    pub fifty_move_rule: bool,
}

impl PositionStatus {
    /// Whether the game cannot continue from this position.
    pub fn is_terminal(&self) -> bool {
        self.checkmate || self.stalemate || self.draw
    }

    /// The draw condition that applies, checked in a fixed order.
    pub fn draw_reason(&self) -> Option<DrawReason> {
        if self.threefold_repetition {
            Some(DrawReason::ThreefoldRepetition)
        } else if self.insufficient_material {
            Some(DrawReason::InsufficientMaterial)
        } else if self.fifty_move_rule {
            Some(DrawReason::FiftyMoveRule)
        } else {
            None
        }
    }
}
