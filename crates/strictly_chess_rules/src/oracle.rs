//! The rules oracle seam.

use crate::{Color, MoveRecord, MoveRequest, PositionStatus, RulesError, Square};

/// Authority on chess legality for one game.
///
/// The oracle holds a current position and the history needed to detect
/// repetition. Every method is synchronous and deterministic; a failed call
/// leaves the oracle exactly as it was.
pub trait RulesOracle: Send {
    /// Returns to the start position and yields its encoding.
    fn reset(&mut self) -> String;

    /// Replaces the start position with `fen` and resets to it.
    fn load_position(&mut self, fen: &str) -> Result<(), RulesError>;

    /// Encoding of the position the game started from.
    fn start_position(&self) -> String;

    /// Encoding of the current position.
    fn position(&self) -> String;

    /// Side to move in the current position.
    fn side_to_move(&self) -> Color;

    /// Validates and applies a move.
    fn apply_move(&mut self, request: &MoveRequest) -> Result<MoveRecord, RulesError>;

    /// Applies a move written in short algebraic notation, e.g. `Nf3`,
    /// `exd6` or `e8=Q+`.
    fn apply_san(&mut self, san: &str) -> Result<MoveRecord, RulesError>;

    /// Check and game-end conditions of the current position.
    fn status(&self) -> PositionStatus;

    /// Destinations reachable from `square` by the side to move.
    fn legal_destinations(&self, square: Square) -> Vec<Square>;

    /// Every legal move in the current position.
    fn legal_moves(&self) -> Vec<MoveRequest>;
}
