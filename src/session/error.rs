//! Session errors.

use super::SessionPhase;
use crate::ledger::LedgerError;
use crate::pgn::PgnError;
use strictly_chess_rules::RulesError;

/// Why a session request was refused. The session is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// The oracle rejected the move.
    #[display("{}", _0)]
    IllegalMove(RulesError),

    /// Undo at the start position.
    #[display("Nothing to undo")]
    NothingToUndo,

    /// Moves are only accepted while playing.
    #[display("Game is not in progress ({})", _0)]
    NotInProgress(SessionPhase),

    /// The session is paused.
    #[display("Game is paused")]
    Paused,

    /// Resume without a pause.
    #[display("Game is not paused")]
    NotPaused,

    /// The automated opponent is thinking.
    #[display("Waiting for the automated opponent")]
    SuggestionOutstanding,

    /// The configured start position cannot be loaded.
    #[display("Invalid start position: {}", _0)]
    InvalidStartPosition(RulesError),

    /// Rebuilding the position failed.
    #[display("{}", _0)]
    Ledger(LedgerError),

    /// A game record could not be loaded.
    #[display("Invalid game record: {}", _0)]
    Pgn(PgnError),
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::IllegalMove(e) | SessionError::InvalidStartPosition(e) => Some(e),
            SessionError::Ledger(e) => Some(e),
            SessionError::Pgn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LedgerError> for SessionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NothingToUndo => SessionError::NothingToUndo,
            other => SessionError::Ledger(other),
        }
    }
}

impl From<PgnError> for SessionError {
    fn from(err: PgnError) -> Self {
        SessionError::Pgn(err)
    }
}
