//! Game sessions: the turn loop tying together history, clocks, rules and
//! the automated opponent.

mod coordinator;
mod error;
mod types;

pub use coordinator::{PendingSuggestion, Session};
pub use error::SessionError;
pub use types::{
    GameMode, SessionEvent, SessionPhase, SessionSnapshot, SuggestionOutcome, SuggestionTicket,
};
