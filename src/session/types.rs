//! Session state, events and snapshots.

use crate::clock::ClockSnapshot;
use crate::difficulty::DifficultyConfig;
use crate::ledger::MoveListEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strictly_chess_rules::{Color, DrawReason, PositionStatus};
use uuid::Uuid;

/// Who is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMode {
    /// Both sides are entered by people.
    HumanVsHuman,
    /// One side is played by the automated opponent.
    HumanVsAutomaton {
        /// Side the automated opponent plays.
        automaton: Color,
    },
}

impl GameMode {
    /// Side played by the automated opponent, if any.
    pub fn automaton(&self) -> Option<Color> {
        match self {
            GameMode::HumanVsHuman => None,
            GameMode::HumanVsAutomaton { automaton } => Some(*automaton),
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::HumanVsHuman => write!(f, "human vs human"),
            GameMode::HumanVsAutomaton { automaton } => {
                write!(f, "human vs automaton ({})", automaton)
            }
        }
    }
}

/// Lifecycle of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Being assembled.
    #[display("setup")]
    Setup,
    /// Moves are accepted.
    #[display("playing")]
    Playing,
    /// Clocks halted by request.
    #[display("paused")]
    Paused,
    /// The side to move was mated.
    #[display("checkmate, {} wins", winner)]
    Checkmate {
        /// Side that delivered mate.
        winner: Color,
    },
    /// The side to move has no legal move and is not in check.
    #[display("stalemate")]
    Stalemate,
    /// Drawn by rule.
    #[display("draw by {}", reason)]
    Draw {
        /// Which rule applied.
        reason: DrawReason,
    },
    /// A clock ran out.
    #[display("{} lost on time", loser)]
    Timeout {
        /// Side whose clock ran out.
        loser: Color,
    },
}

impl SessionPhase {
    /// Whether the game has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Checkmate { .. }
                | SessionPhase::Stalemate
                | SessionPhase::Draw { .. }
                | SessionPhase::Timeout { .. }
        )
    }

    /// Score sheet result token.
    pub fn result_token(&self) -> &'static str {
        match self {
            SessionPhase::Checkmate {
                winner: Color::White,
            }
            | SessionPhase::Timeout {
                loser: Color::Black,
            } => "1-0",
            SessionPhase::Checkmate {
                winner: Color::Black,
            }
            | SessionPhase::Timeout {
                loser: Color::White,
            } => "0-1",
            SessionPhase::Stalemate | SessionPhase::Draw { .. } => "1/2-1/2",
            SessionPhase::Setup | SessionPhase::Playing | SessionPhase::Paused => "*",
        }
    }
}

/// Token identifying one outstanding move suggestion.
///
/// A response is applied only if its ticket still equals the session's
/// outstanding ticket; any change of turn replaces or clears it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionTicket {
    /// Session that issued the request.
    pub session: Uuid,
    /// Per-session request counter.
    pub serial: u64,
    /// Side the suggestion is for.
    pub side: Color,
    /// Position encoding the request was made for.
    pub position: String,
}

/// What happened to a suggestion response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// The move was played.
    Applied(strictly_chess_rules::MoveRecord),
    /// The turn had moved on; the response was dropped.
    Stale,
    /// The policy failed or proposed something unplayable.
    Failed(String),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A running clock advanced.
    ClockTick {
        /// Clock owner.
        player: Color,
        /// Time left.
        remaining_ms: u64,
    },
    /// A clock ran out.
    Timeout {
        /// Side whose clock ran out.
        loser: Color,
    },
    /// A move was applied.
    MovePlayed {
        /// Ledger index of the move.
        index: usize,
        /// Side that moved.
        color: Color,
        /// Short algebraic notation.
        san: String,
        /// Position after the move.
        position: String,
    },
    /// Undo or navigation changed the displayed position.
    PositionChanged {
        /// New cursor, `-1` for the start position.
        cursor: i64,
        /// Displayed position.
        position: String,
    },
    /// The session moved to a new phase.
    PhaseChanged {
        /// The new phase.
        phase: SessionPhase,
    },
    /// The game ended.
    GameOver {
        /// Terminal phase.
        phase: SessionPhase,
    },
    /// The automated opponent started thinking.
    AutomatonThinking {
        /// Side it is thinking for.
        side: Color,
    },
    /// The automated opponent could not produce a move.
    SuggestionFailed {
        /// Failure detail.
        message: String,
    },
    /// Clocks were reconfigured.
    ClocksReset {
        /// New clock state, absent when clocks are disabled.
        clocks: Option<ClockSnapshot>,
    },
    /// A fresh session replaced the previous one.
    NewGame {
        /// Id of the new session.
        id: Uuid,
        /// Its mode.
        mode: GameMode,
    },
}

/// Everything the presentation layer shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session id.
    pub id: Uuid,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
    /// Who is playing.
    pub mode: GameMode,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Displayed position encoding.
    pub position: String,
    /// Position the game started from.
    pub start_position: String,
    /// Side to move in the displayed position.
    pub side_to_move: Color,
    /// Check and game-end flags for the displayed position.
    pub status: PositionStatus,
    /// Every stored move; `cursor` marks the one on the board.
    pub moves: Vec<MoveListEntry>,
    /// Stored moves, including any beyond the cursor.
    pub total_moves: usize,
    /// Cursor, `-1` for the start position.
    pub cursor: i64,
    /// Clock state, absent when clocks are disabled.
    pub clocks: Option<ClockSnapshot>,
    /// Automated opponent parameters.
    pub difficulty: DifficultyConfig,
    /// Whether a move suggestion is outstanding.
    pub awaiting_suggestion: bool,
}
