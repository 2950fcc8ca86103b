//! Move history with a cursor.
//!
//! The ledger is the single source of truth for the board: the displayed
//! position is always whatever replaying the moves up to the cursor produces.
//! Playing a move from a rewound cursor discards the old continuation.

use serde::{Deserialize, Serialize};
use strictly_chess_rules::{Color, MoveRecord, RulesError, RulesOracle};
use tracing::{debug, instrument, warn};

/// Errors from ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum LedgerError {
    /// The cursor is already at the start position.
    #[display("Nothing to undo")]
    NothingToUndo,

    /// A recorded move was rejected while rebuilding a position.
    #[display("Replay failed at move {}: {}", index, source)]
    Replay {
        /// Index of the move that failed.
        index: usize,
        /// The oracle's reason.
        source: RulesError,
    },
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Replay { source, .. } => Some(source),
            LedgerError::NothingToUndo => None,
        }
    }
}

/// One line of the move list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveListEntry {
    /// Position in the ledger.
    pub index: usize,
    /// Full-move number as printed in a score sheet.
    pub number: u32,
    /// Side that moved.
    pub color: Color,
    /// Short algebraic notation.
    pub san: String,
    /// Long algebraic notation.
    pub lan: String,
    /// Whether the move is on the board, i.e. at or before the cursor.
    pub active: bool,
}

/// Executed moves plus the cursor marking the displayed prefix.
///
/// A cursor of `None` is the start position; `Some(i)` means moves `0..=i`
/// are on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLedger {
    moves: Vec<MoveRecord>,
    cursor: Option<usize>,
}

impl MoveLedger {
    /// Creates an empty ledger at the start position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored move, including any beyond the cursor.
    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// Number of stored moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether no moves are stored.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The cursor; `None` is the start position.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The cursor as a signed index, `-1` for the start position.
    pub fn cursor_index(&self) -> i64 {
        self.cursor
            .and_then(|c| i64::try_from(c).ok())
            .unwrap_or(-1)
    }

    /// The move that produced the displayed position.
    pub fn current(&self) -> Option<&MoveRecord> {
        self.cursor.and_then(|c| self.moves.get(c))
    }

    /// Moves on the board at the cursor.
    pub fn active_moves(&self) -> &[MoveRecord] {
        match self.cursor {
            Some(c) => &self.moves[..=c],
            None => &[],
        }
    }

    /// Whether the cursor is on the last stored move (or the ledger is empty).
    pub fn is_at_end(&self) -> bool {
        self.active_moves().len() == self.moves.len()
    }

    /// Appends `record` after the cursor, discarding any later moves first.
    ///
    /// Returns the new cursor.
    #[instrument(skip(self, record), fields(san = %record.san))]
    pub fn record_move(&mut self, record: MoveRecord) -> usize {
        let keep = self.active_moves().len();
        if keep < self.moves.len() {
            debug!(
                discarded = self.moves.len() - keep,
                "Truncating continuation"
            );
            self.moves.truncate(keep);
        }
        self.moves.push(record);
        let cursor = self.moves.len() - 1;
        self.cursor = Some(cursor);
        cursor
    }

    /// Removes the move at the cursor (and any continuation after it) and
    /// steps the cursor back.
    ///
    /// The caller is responsible for bringing the oracle back in line, usually
    /// through [`replay`](Self::replay).
    #[instrument(skip(self))]
    pub fn undo(&mut self) -> Result<MoveRecord, LedgerError> {
        let Some(index) = self.cursor else {
            return Err(LedgerError::NothingToUndo);
        };
        let removed = self
            .moves
            .get(index)
            .cloned()
            .ok_or(LedgerError::NothingToUndo)?;
        debug!(discarded = self.moves.len() - index, "Undid move");
        self.moves.truncate(index);
        self.cursor = index.checked_sub(1);
        Ok(removed)
    }

    /// Resets the oracle and replays moves up to `target`, moving the cursor there.
    ///
    /// `None` is the start position. A target past the last move is ignored
    /// and reported as `Ok(false)`.
    #[instrument(skip(self, oracle))]
    pub fn navigate_to(
        &mut self,
        target: Option<usize>,
        oracle: &mut dyn RulesOracle,
    ) -> Result<bool, LedgerError> {
        if let Some(index) = target.filter(|&i| i >= self.moves.len()) {
            debug!(index, len = self.moves.len(), "Navigation out of range");
            return Ok(false);
        }
        if let Err(e) = replay_prefix(&self.moves, target, oracle) {
            warn!(error = %e, "Replay failed, restoring previous position");
            let _ = replay_prefix(&self.moves, self.cursor, oracle);
            return Err(e);
        }
        self.cursor = target;
        Ok(true)
    }

    /// Rebuilds the oracle's position from the moves up to the cursor.
    #[instrument(skip(self, oracle))]
    pub fn replay(&self, oracle: &mut dyn RulesOracle) -> Result<String, LedgerError> {
        replay_prefix(&self.moves, self.cursor, oracle)?;
        Ok(oracle.position())
    }

    /// Every stored move, including those past the cursor.
    ///
    /// Entries after the cursor are marked inactive so a view can show the
    /// continuation and step forward into it.
    pub fn entries(&self) -> Vec<MoveListEntry> {
        let active = self.cursor.map_or(0, |c| c + 1);
        self.moves
            .iter()
            .enumerate()
            .map(|(index, record)| entry(index, record, index < active))
            .collect()
    }

    /// Movetext of the moves up to the cursor, e.g. `1. e4 e5 2. Nf3`.
    pub fn movetext(&self) -> String {
        let mut parts = Vec::new();
        let prefix = self
            .active_moves()
            .iter()
            .enumerate()
            .map(|(index, record)| entry(index, record, true));
        for (i, entry) in prefix.enumerate() {
            match entry.color {
                Color::White => parts.push(format!("{}.", entry.number)),
                Color::Black if i == 0 => parts.push(format!("{}...", entry.number)),
                Color::Black => {}
            }
            parts.push(entry.san);
        }
        parts.join(" ")
    }
}

fn replay_prefix(
    moves: &[MoveRecord],
    target: Option<usize>,
    oracle: &mut dyn RulesOracle,
) -> Result<(), LedgerError> {
    oracle.reset();
    let count = target.map_or(0, |t| t + 1);
    for (index, record) in moves.iter().take(count).enumerate() {
        oracle
            .apply_move(&record.request())
            .map_err(|source| LedgerError::Replay { index, source })?;
    }
    debug!(replayed = count, "Replayed moves");
    Ok(())
}

fn entry(index: usize, record: &MoveRecord, active: bool) -> MoveListEntry {
    MoveListEntry {
        index,
        number: fullmove_number(&record.before),
        color: record.color,
        san: record.san.clone(),
        lan: record.lan.clone(),
        active,
    }
}

fn fullmove_number(fen: &str) -> u32 {
    fen.split_whitespace()
        .nth(5)
        .and_then(|n| n.parse().ok())
        .unwrap_or(1)
}
