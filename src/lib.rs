//! Strictly Chess library - chess game sessions with history and clocks.
//!
//! This library runs one game of chess at a time: it keeps the move history,
//! lets players step back and forth through it, runs both players' clocks
//! with Fischer increment, and asks an automated opponent for moves when it
//! is that opponent's turn.
//!
//! # Architecture
//!
//! - **Clock**: single countdown clocks driven by an injected time source
//! - **Clock Coordinator**: two clocks, at most one running, atomic switch
//! - **Ledger**: move history with a cursor and replay-based navigation
//! - **PGN**: reading game records into the ledger
//! - **Session**: the turn loop and game state machine
//! - **Policy**: async move suggestions for the automated opponent
//! - **Driver**: tokio task owning a session, ticking clocks and awaiting suggestions
//!
//! Chess rules live in the `strictly_chess_rules` crate behind the
//! [`RulesOracle`] trait.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_chess::{
//!     Session, SessionConfig, SessionDriver, SkillPolicy, TokioTimeSource,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let session: Session = Session::new(
//!     SessionConfig::default(),
//!     Arc::new(SkillPolicy::new()),
//!     Arc::new(TokioTimeSource::new()),
//! )?;
//! let (handle, mut events, _task) = SessionDriver::spawn(session);
//! handle.submit_move("e2e4".parse()?).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod clock;
mod config;
mod difficulty;
mod driver;
mod ledger;
mod pgn;
mod policy;
mod session;
mod time_source;

// Crate-level exports - Clocks
pub use clock::{
    Clock, ClockCoordinator, ClockEvent, ClockSnapshot, TICK_INTERVAL, TimeControl,
    TimeControlPreset, format_clock,
};

// Crate-level exports - Configuration
pub use config::{ConfigError, Opponent, SessionConfig};
pub use difficulty::{DifficultyConfig, DifficultyLevel};

// Crate-level exports - History
pub use ledger::{LedgerError, MoveLedger, MoveListEntry};
pub use pgn::{PgnError, PgnGame};

// Crate-level exports - Automated opponent
pub use policy::{MovePolicy, PolicyError, SkillPolicy};

// Crate-level exports - Sessions
pub use driver::{DriverError, SessionDriver, SessionHandle};
pub use session::{
    GameMode, PendingSuggestion, Session, SessionError, SessionEvent, SessionPhase,
    SessionSnapshot, SuggestionOutcome, SuggestionTicket,
};
pub use time_source::{ManualTimeSource, TimeSource, TokioTimeSource};

// Crate-level exports - Rules vocabulary
pub use strictly_chess_rules::{
    Color, DrawReason, MoveFlag, MoveRecord, MoveRequest, PieceKind, PositionStatus, RulesError,
    RulesOracle, START_POSITION, ShakmatyOracle, Square,
};
