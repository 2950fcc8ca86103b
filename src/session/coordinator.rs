//! The session coordinator: one game, its history, its clocks and its
//! automated opponent.

use super::{
    GameMode, SessionError, SessionEvent, SessionPhase, SessionSnapshot, SuggestionOutcome,
    SuggestionTicket,
};
use crate::clock::{ClockCoordinator, ClockEvent, TimeControl};
use crate::config::SessionConfig;
use crate::difficulty::{DifficultyConfig, DifficultyLevel};
use crate::ledger::MoveLedger;
use crate::pgn::{PgnError, PgnGame};
use crate::policy::{MovePolicy, PolicyError};
use crate::TimeSource;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use strictly_chess_rules::{
    Color, MoveRecord, MoveRequest, PositionStatus, RulesOracle, START_POSITION, ShakmatyOracle,
    Square,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A move suggestion that has been requested but not yet answered.
pub struct PendingSuggestion {
    /// Token to hand back with the answer.
    pub ticket: SuggestionTicket,
    /// The policy's work. Dropping it abandons the request.
    pub future: BoxFuture<'static, Result<String, PolicyError>>,
}

impl std::fmt::Debug for PendingSuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSuggestion")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// One game of chess.
///
/// The session owns the ledger and the clocks outright. The displayed
/// position is always the oracle's position after replaying the ledger up to
/// its cursor. All methods are synchronous; the only asynchronous work is the
/// suggestion future handed out by [`begin_suggestion`](Self::begin_suggestion),
/// whose answer comes back through [`complete_suggestion`](Self::complete_suggestion).
///
/// Every mutating call first advances the clocks, so a timeout that is due
/// wins over the request being processed.
#[derive(Debug)]
pub struct Session<O: RulesOracle = ShakmatyOracle> {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: SessionConfig,
    mode: GameMode,
    difficulty: DifficultyConfig,
    oracle: O,
    ledger: MoveLedger,
    time_control: TimeControl,
    clocks: Option<ClockCoordinator>,
    clock_started: bool,
    paused_clock: Option<Color>,
    phase: SessionPhase,
    status: PositionStatus,
    time_source: Arc<dyn TimeSource>,
    policy: Arc<dyn MovePolicy>,
    pending: Option<SuggestionTicket>,
    next_serial: u64,
    suggestion_failed: bool,
    events: Vec<SessionEvent>,
}

impl<O: RulesOracle + Default> Session<O> {
    /// Creates a session with a fresh oracle.
    pub fn new(
        config: SessionConfig,
        policy: Arc<dyn MovePolicy>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, SessionError> {
        Self::with_oracle(O::default(), config, policy, time_source)
    }

    /// Replaces this session with a fresh one, keeping the collaborators.
    ///
    /// `mode` overrides the configured mode. The difficulty and the time
    /// control in force carry over; the moves and clocks start afresh.
    #[instrument(skip(self), fields(old_id = %self.id))]
    pub fn new_game(&mut self, mode: Option<GameMode>) -> Result<(), SessionError> {
        let mut config = self.config.clone();
        if let Some(mode) = mode {
            config = config.with_mode(mode);
        }
        config = config.with_difficulty(*self.difficulty.level());
        let fresh = Self::assemble(
            O::default(),
            config,
            self.time_control.clone(),
            self.policy.clone(),
            self.time_source.clone(),
        )?;
        let mut events = std::mem::take(&mut self.events);
        *self = fresh;
        events.push(SessionEvent::NewGame {
            id: self.id,
            mode: self.mode,
        });
        events.append(&mut self.events);
        self.events = events;
        Ok(())
    }

    /// Replaces the history with the mainline of a PGN game record.
    ///
    /// A `FEN` header sets the start position. The cursor lands on the last
    /// move, the clocks are re-primed as at the start of a game, and play
    /// resumes unless the final position has ended the game. On any error the
    /// session is left untouched. Returns the number of moves loaded.
    #[instrument(skip(self, text), fields(session_id = %self.id))]
    pub fn load_pgn(&mut self, text: &str) -> Result<usize, SessionError> {
        self.poll_clocks();
        self.ensure_not_paused()?;
        let game = PgnGame::parse(text)?;

        let mut oracle = O::default();
        match game.header("FEN") {
            Some(fen) => oracle
                .load_position(fen)
                .map_err(PgnError::InvalidPosition)?,
            None => {
                oracle.reset();
            }
        }
        let mut ledger = MoveLedger::new();
        for (index, san) in game.moves.iter().enumerate() {
            let record = oracle.apply_san(san).map_err(|source| PgnError::Move {
                ply: index + 1,
                san: san.clone(),
                source,
            })?;
            ledger.record_move(record);
        }

        let count = ledger.len();
        self.oracle = oracle;
        self.ledger = ledger;
        self.invalidate_suggestion();
        self.suggestion_failed = false;
        self.status = self.oracle.status();
        if let Some(clocks) = self.clocks.as_mut() {
            clocks.reset();
        }
        self.clock_started = false;
        self.paused_clock = None;
        info!(moves = count, "Game record loaded");
        self.events.push(SessionEvent::PositionChanged {
            cursor: self.ledger.cursor_index(),
            position: self.oracle.position(),
        });
        self.events.push(SessionEvent::ClocksReset {
            clocks: self.clocks.as_ref().map(ClockCoordinator::snapshot),
        });
        self.set_phase(SessionPhase::Playing);
        self.check_game_end();
        Ok(count)
    }
}

impl<O: RulesOracle> Session<O> {
    /// Creates a session around an injected oracle.
    ///
    /// The oracle is reset to the configured start position. Clocks are
    /// primed but stay stopped until the first move.
    pub fn with_oracle(
        oracle: O,
        config: SessionConfig,
        policy: Arc<dyn MovePolicy>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, SessionError> {
        let control = config.resolved_time_control();
        Self::assemble(oracle, config, control, policy, time_source)
    }

    #[instrument(skip(oracle, policy, time_source))]
    fn assemble(
        mut oracle: O,
        config: SessionConfig,
        control: TimeControl,
        policy: Arc<dyn MovePolicy>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, SessionError> {
        match config.start_fen() {
            Some(fen) => oracle
                .load_position(fen)
                .map_err(SessionError::InvalidStartPosition)?,
            None => {
                oracle.reset();
            }
        }

        let clocks = control
            .is_active()
            .then(|| ClockCoordinator::new(control.clone(), time_source.clone()));

        let mut session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            mode: config.mode(),
            difficulty: config.difficulty_config(*config.difficulty()),
            status: oracle.status(),
            config,
            oracle,
            ledger: MoveLedger::new(),
            time_control: control,
            clocks,
            clock_started: false,
            paused_clock: None,
            phase: SessionPhase::Setup,
            time_source,
            policy,
            pending: None,
            next_serial: 0,
            suggestion_failed: false,
            events: Vec::new(),
        };
        info!(session_id = %session.id, mode = %session.mode, "Creating new game session");
        session.set_phase(SessionPhase::Playing);
        session.check_game_end();
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────
    //  Accessors
    // ─────────────────────────────────────────────────────────────

    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Who is playing.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Displayed position encoding.
    pub fn position(&self) -> String {
        self.oracle.position()
    }

    /// Side to move in the displayed position.
    pub fn side_to_move(&self) -> Color {
        self.oracle.side_to_move()
    }

    /// Check and game-end flags for the displayed position.
    pub fn status(&self) -> PositionStatus {
        self.status
    }

    /// The move history.
    pub fn ledger(&self) -> &MoveLedger {
        &self.ledger
    }

    /// The clocks, absent when the time control is inactive.
    pub fn clocks(&self) -> Option<&ClockCoordinator> {
        self.clocks.as_ref()
    }

    /// The time control in force, active or not.
    pub fn time_control(&self) -> &TimeControl {
        &self.time_control
    }

    /// Current automated opponent parameters.
    pub fn difficulty(&self) -> &DifficultyConfig {
        &self.difficulty
    }

    /// The outstanding suggestion ticket, if any.
    pub fn pending_ticket(&self) -> Option<&SuggestionTicket> {
        self.pending.as_ref()
    }

    /// Whether `ticket` is still the outstanding request.
    pub fn is_ticket_current(&self, ticket: &SuggestionTicket) -> bool {
        self.pending.as_ref() == Some(ticket)
    }

    /// Takes the notifications produced since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────────
    //  Clocks
    // ─────────────────────────────────────────────────────────────

    /// Advances the running clock and ends the game if it ran out.
    pub fn poll_clocks(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        let Some(clocks) = self.clocks.as_mut() else {
            return;
        };
        for event in clocks.tick() {
            match event {
                ClockEvent::Tick {
                    player,
                    remaining_ms,
                } => self.events.push(SessionEvent::ClockTick {
                    player,
                    remaining_ms,
                }),
                ClockEvent::Timeout { player } => {
                    self.events.push(SessionEvent::Timeout { loser: player });
                    self.finish(SessionPhase::Timeout { loser: player });
                }
            }
        }
    }

    /// Replaces the time control. Clocks are reset and stay stopped until the
    /// next move, as at the start of a game.
    #[instrument(skip(self), fields(session_id = %self.id, control = %control))]
    pub fn set_time_control(&mut self, control: TimeControl) {
        self.poll_clocks();
        self.time_control = control.clone();
        self.clocks = match (self.clocks.take(), control.is_active()) {
            (Some(mut clocks), true) => {
                clocks.set_time_control(control);
                Some(clocks)
            }
            (Some(mut clocks), false) => {
                clocks.stop_all();
                None
            }
            (None, true) => Some(ClockCoordinator::new(control, self.time_source.clone())),
            (None, false) => None,
        };
        self.clock_started = false;
        self.paused_clock = None;
        self.events.push(SessionEvent::ClocksReset {
            clocks: self.clocks.as_ref().map(ClockCoordinator::snapshot),
        });
    }

    /// Sets the automated opponent's strength for future requests.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn set_difficulty(&mut self, level: DifficultyLevel) {
        self.difficulty = self.config.difficulty_config(level);
        info!(level = %level, "Difficulty changed");
    }

    // ─────────────────────────────────────────────────────────────
    //  Moves and history
    // ─────────────────────────────────────────────────────────────

    /// Plays a move for the side to move.
    ///
    /// Refused while paused, after the game ended, or while a suggestion is
    /// outstanding. A rejected move changes nothing.
    #[instrument(skip(self), fields(session_id = %self.id, request = %request))]
    pub fn submit_move(&mut self, request: MoveRequest) -> Result<MoveRecord, SessionError> {
        self.poll_clocks();
        self.ensure_playing()?;
        if self.pending.is_some() {
            warn!("Move submitted while the automated opponent is thinking");
            return Err(SessionError::SuggestionOutstanding);
        }
        self.play(request)
    }

    /// Takes back the move at the cursor.
    ///
    /// Allowed after the game ended for inspection; the game stays over.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn undo(&mut self) -> Result<MoveRecord, SessionError> {
        self.poll_clocks();
        self.ensure_not_paused()?;
        let removed = self.ledger.undo()?;
        self.ledger.replay(&mut self.oracle)?;
        info!(san = %removed.san, "Move taken back");
        self.after_history_change();
        Ok(removed)
    }

    /// Moves the cursor to `index` (`-1` for the start position) by replaying
    /// the ledger.
    ///
    /// Out-of-range indices are ignored and reported as `Ok(false)`.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn navigate_to(&mut self, index: i64) -> Result<bool, SessionError> {
        self.poll_clocks();
        self.ensure_not_paused()?;
        let target = match index {
            -1 => None,
            i => match usize::try_from(i) {
                Ok(i) => Some(i),
                Err(_) => {
                    debug!(index, "Navigation out of range");
                    return Ok(false);
                }
            },
        };
        if !self.ledger.navigate_to(target, &mut self.oracle)? {
            return Ok(false);
        }
        self.after_history_change();
        Ok(true)
    }

    /// Destinations for the piece on `square`, empty if it cannot move.
    pub fn legal_destinations(&self, square: Square) -> Vec<Square> {
        if self.phase.is_terminal() {
            return Vec::new();
        }
        self.oracle.legal_destinations(square)
    }

    // ─────────────────────────────────────────────────────────────
    //  Pause
    // ─────────────────────────────────────────────────────────────

    /// Halts the clocks. Any outstanding suggestion is abandoned.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.poll_clocks();
        self.ensure_playing()?;
        self.paused_clock = self.clocks.as_ref().and_then(ClockCoordinator::active);
        if let Some(clocks) = self.clocks.as_mut() {
            clocks.stop_all();
        }
        self.invalidate_suggestion();
        self.set_phase(SessionPhase::Paused);
        Ok(())
    }

    /// Restarts the clock that was running at pause time.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Paused {
            return Err(SessionError::NotPaused);
        }
        if let (Some(clocks), Some(player)) = (self.clocks.as_mut(), self.paused_clock.take()) {
            clocks.start(player);
        }
        self.set_phase(SessionPhase::Playing);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Automated opponent
    // ─────────────────────────────────────────────────────────────

    /// Whether the automated opponent should be asked for a move now.
    pub fn automated_turn_due(&self) -> bool {
        self.phase == SessionPhase::Playing
            && self.pending.is_none()
            && !self.suggestion_failed
            && !self.status.is_terminal()
            && self.mode.automaton() == Some(self.oracle.side_to_move())
    }

    /// Issues the single outstanding suggestion request for this turn.
    ///
    /// Returns `None` when no request is due. The caller drives the returned
    /// future and hands its output to
    /// [`complete_suggestion`](Self::complete_suggestion).
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn begin_suggestion(&mut self) -> Option<PendingSuggestion> {
        if !self.automated_turn_due() {
            return None;
        }
        let side = self.oracle.side_to_move();
        let position = self.oracle.position();
        let ticket = SuggestionTicket {
            session: self.id,
            serial: self.next_serial,
            side,
            position: position.clone(),
        };
        self.next_serial += 1;
        self.pending = Some(ticket.clone());
        self.events.push(SessionEvent::AutomatonThinking { side });
        debug!(serial = ticket.serial, policy = self.policy.name(), "Requesting move");

        let policy = self.policy.clone();
        let difficulty = self.difficulty.clone();
        let future = Box::pin(async move { policy.propose(&position, &difficulty).await });
        Some(PendingSuggestion { ticket, future })
    }

    /// Applies a suggestion response if `ticket` is still outstanding.
    #[instrument(skip(self, result), fields(session_id = %self.id, serial = ticket.serial))]
    pub fn complete_suggestion(
        &mut self,
        ticket: &SuggestionTicket,
        result: Result<String, PolicyError>,
    ) -> SuggestionOutcome {
        self.poll_clocks();
        if !self.is_ticket_current(ticket) {
            debug!("Discarding stale suggestion");
            return SuggestionOutcome::Stale;
        }
        self.pending = None;

        let outcome = result
            .map_err(|e| e.message)
            .and_then(|text| {
                text.parse::<MoveRequest>()
                    .map_err(|e| format!("Unplayable suggestion: {}", e))
            })
            .and_then(|request| self.play(request).map_err(|e| e.to_string()));

        match outcome {
            Ok(record) => SuggestionOutcome::Applied(record),
            Err(message) => {
                warn!(%message, "Automated opponent failed to move");
                self.suggestion_failed = true;
                self.events.push(SessionEvent::SuggestionFailed {
                    message: message.clone(),
                });
                SuggestionOutcome::Failed(message)
            }
        }
    }

    /// Allows a new request after a failed one.
    pub fn retry_suggestion(&mut self) {
        self.suggestion_failed = false;
    }

    // ─────────────────────────────────────────────────────────────
    //  Views
    // ─────────────────────────────────────────────────────────────

    /// Everything the presentation layer shows.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            started_at: self.started_at,
            mode: self.mode,
            phase: self.phase,
            position: self.oracle.position(),
            start_position: self.oracle.start_position(),
            side_to_move: self.oracle.side_to_move(),
            status: self.status,
            moves: self.ledger.entries(),
            total_moves: self.ledger.len(),
            cursor: self.ledger.cursor_index(),
            clocks: self.clocks.as_ref().map(ClockCoordinator::snapshot),
            difficulty: self.difficulty.clone(),
            awaiting_suggestion: self.pending.is_some(),
        }
    }

    /// The game up to the cursor as PGN.
    pub fn pgn(&self) -> String {
        let player = |color: Color| {
            if self.mode.automaton() == Some(color) {
                format!("Automaton ({})", self.difficulty.label())
            } else {
                "Human".to_string()
            }
        };
        let result = self.phase.result_token();
        let mut pgn = String::new();
        pgn.push_str("[Event \"Casual game\"]\n");
        pgn.push_str("[Site \"?\"]\n");
        pgn.push_str(&format!(
            "[Date \"{}\"]\n",
            self.started_at.format("%Y.%m.%d")
        ));
        pgn.push_str(&format!("[White \"{}\"]\n", player(Color::White)));
        pgn.push_str(&format!("[Black \"{}\"]\n", player(Color::Black)));
        pgn.push_str(&format!("[Result \"{}\"]\n", result));
        if let Some(clocks) = &self.clocks {
            let control = clocks.time_control();
            pgn.push_str(&format!(
                "[TimeControl \"{}+{}\"]\n",
                control.initial_secs(),
                control.increment_secs()
            ));
        }
        if self.oracle.start_position() != START_POSITION {
            pgn.push_str("[SetUp \"1\"]\n");
            pgn.push_str(&format!("[FEN \"{}\"]\n", self.oracle.start_position()));
        }
        pgn.push('\n');
        let movetext = self.ledger.movetext();
        if movetext.is_empty() {
            pgn.push_str(result);
        } else {
            pgn.push_str(&format!("{} {}", movetext, result));
        }
        pgn.push('\n');
        pgn
    }

    // ─────────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────────

    /// The one path every move takes, whoever proposed it.
    fn play(&mut self, request: MoveRequest) -> Result<MoveRecord, SessionError> {
        let record = self
            .oracle
            .apply_move(&request)
            .map_err(SessionError::IllegalMove)?;
        let index = self.ledger.record_move(record.clone());
        let mover = record.color;

        if let Some(clocks) = self.clocks.as_mut() {
            if self.clock_started {
                clocks.switch(mover, mover.opponent());
            } else {
                clocks.start(mover.opponent());
                self.clock_started = true;
            }
        }

        self.suggestion_failed = false;
        self.status = self.oracle.status();
        info!(index, san = %record.san, color = %mover, "Move played");
        self.events.push(SessionEvent::MovePlayed {
            index,
            color: mover,
            san: record.san.clone(),
            position: record.after.clone(),
        });
        self.check_game_end();
        Ok(record)
    }

    /// Brings status, clocks and any outstanding request in line with a
    /// position reached by undo or navigation.
    fn after_history_change(&mut self) {
        self.invalidate_suggestion();
        self.suggestion_failed = false;
        self.status = self.oracle.status();
        self.events.push(SessionEvent::PositionChanged {
            cursor: self.ledger.cursor_index(),
            position: self.oracle.position(),
        });
        if self.phase != SessionPhase::Playing {
            return;
        }
        if !self.clock_started {
            return;
        }
        let side = self.oracle.side_to_move();
        let at_start = self.ledger.cursor().is_none();
        if let Some(clocks) = self.clocks.as_mut() {
            if at_start {
                clocks.stop_all();
                self.clock_started = false;
            } else {
                clocks.start(side);
            }
        }
    }

    fn check_game_end(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        let side = self.oracle.side_to_move();
        let terminal = if self.status.checkmate {
            Some(SessionPhase::Checkmate {
                winner: side.opponent(),
            })
        } else if self.status.stalemate {
            Some(SessionPhase::Stalemate)
        } else {
            self.status
                .draw_reason()
                .map(|reason| SessionPhase::Draw { reason })
        };
        if let Some(phase) = terminal {
            self.finish(phase);
        }
    }

    fn finish(&mut self, phase: SessionPhase) {
        if let Some(clocks) = self.clocks.as_mut() {
            clocks.stop_all();
        }
        self.invalidate_suggestion();
        self.set_phase(phase);
        info!(session_id = %self.id, result = phase.result_token(), "Game over: {}", phase);
        self.events.push(SessionEvent::GameOver { phase });
    }

    fn invalidate_suggestion(&mut self) {
        if let Some(ticket) = self.pending.take() {
            debug!(serial = ticket.serial, "Outstanding suggestion abandoned");
        }
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase == phase {
            return;
        }
        debug!(from = %self.phase, to = %phase, "Phase change");
        self.phase = phase;
        self.events.push(SessionEvent::PhaseChanged { phase });
    }

    fn ensure_playing(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Playing => Ok(()),
            SessionPhase::Paused => Err(SessionError::Paused),
            other => Err(SessionError::NotInProgress(other)),
        }
    }

    fn ensure_not_paused(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Paused => Err(SessionError::Paused),
            _ => Ok(()),
        }
    }
}
