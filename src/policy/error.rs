//! Move suggestion errors.

use derive_more::{Display, Error};
use tracing::instrument;

/// A policy could not produce a move.
#[derive(Debug, Clone, Display, Error)]
#[display("Move suggestion error: {} at {}:{}", message, file, line)]
pub struct PolicyError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl PolicyError {
    /// Creates a new policy error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
