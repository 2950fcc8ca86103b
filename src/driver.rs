//! Async driver running a session on tokio.
//!
//! The driver task owns the [`Session`] and is the only code that touches it.
//! It multiplexes three sources of work: the clock tick interval, commands
//! from [`SessionHandle`]s, and the single in-flight move suggestion. Because
//! all three are handled one at a time on one task, a move and a timeout can
//! never interleave; whichever the loop picks first decides the outcome.

use crate::clock::{TICK_INTERVAL, TimeControl};
use crate::difficulty::DifficultyLevel;
use crate::policy::PolicyError;
use crate::session::{
    GameMode, PendingSuggestion, Session, SessionError, SessionEvent, SessionSnapshot,
};
use derive_more::{Display, From};
use strictly_chess_rules::{MoveRecord, MoveRequest, RulesOracle, Square};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

/// Errors returned through a [`SessionHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum DriverError {
    /// The session refused the request.
    #[display("{}", _0)]
    Session(SessionError),

    /// The driver task has stopped.
    #[display("Session driver is not running")]
    #[from(ignore)]
    Closed,
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Session(e) => Some(e),
            DriverError::Closed => None,
        }
    }
}

type Reply<T> = oneshot::Sender<T>;

/// Requests sent to the driver task.
#[derive(Debug)]
enum Command {
    SubmitMove(MoveRequest, Reply<Result<MoveRecord, SessionError>>),
    Undo(Reply<Result<MoveRecord, SessionError>>),
    NavigateTo(i64, Reply<Result<bool, SessionError>>),
    NewGame(Option<GameMode>, Reply<Result<(), SessionError>>),
    LoadPgn(String, Reply<Result<usize, SessionError>>),
    Pause(Reply<Result<(), SessionError>>),
    Resume(Reply<Result<(), SessionError>>),
    SetTimeControl(TimeControl, Reply<()>),
    SetDifficulty(DifficultyLevel, Reply<()>),
    RetrySuggestion(Reply<()>),
    LegalDestinations(Square, Reply<Vec<Square>>),
    Snapshot(Reply<SessionSnapshot>),
    Pgn(Reply<String>),
    Shutdown,
}

/// Cloneable front end to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, DriverError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| DriverError::Closed)?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    /// Plays a move for the side to move.
    #[instrument(skip(self))]
    pub async fn submit_move(&self, request: MoveRequest) -> Result<MoveRecord, DriverError> {
        Ok(self
            .request(|tx| Command::SubmitMove(request, tx))
            .await??)
    }

    /// Takes back the move at the cursor.
    #[instrument(skip(self))]
    pub async fn undo(&self) -> Result<MoveRecord, DriverError> {
        Ok(self.request(Command::Undo).await??)
    }

    /// Moves the cursor; `-1` is the start position.
    #[instrument(skip(self))]
    pub async fn navigate_to(&self, index: i64) -> Result<bool, DriverError> {
        Ok(self.request(|tx| Command::NavigateTo(index, tx)).await??)
    }

    /// Replaces the session with a fresh game.
    #[instrument(skip(self))]
    pub async fn new_game(&self, mode: Option<GameMode>) -> Result<(), DriverError> {
        Ok(self.request(|tx| Command::NewGame(mode, tx)).await??)
    }

    /// Replaces the history with a PGN game record; returns the move count.
    #[instrument(skip(self, pgn))]
    pub async fn load_pgn(&self, pgn: String) -> Result<usize, DriverError> {
        Ok(self.request(|tx| Command::LoadPgn(pgn, tx)).await??)
    }

    /// Halts the clocks.
    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<(), DriverError> {
        Ok(self.request(Command::Pause).await??)
    }

    /// Restarts the clocks.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> Result<(), DriverError> {
        Ok(self.request(Command::Resume).await??)
    }

    /// Replaces the time control.
    #[instrument(skip(self))]
    pub async fn set_time_control(&self, control: TimeControl) -> Result<(), DriverError> {
        self.request(|tx| Command::SetTimeControl(control, tx)).await
    }

    /// Changes the automated opponent's strength.
    #[instrument(skip(self))]
    pub async fn set_difficulty(&self, level: DifficultyLevel) -> Result<(), DriverError> {
        self.request(|tx| Command::SetDifficulty(level, tx)).await
    }

    /// Asks the automated opponent again after a failure.
    #[instrument(skip(self))]
    pub async fn retry_suggestion(&self) -> Result<(), DriverError> {
        self.request(Command::RetrySuggestion).await
    }

    /// Destinations for the piece on `square`.
    #[instrument(skip(self))]
    pub async fn legal_destinations(&self, square: Square) -> Result<Vec<Square>, DriverError> {
        self.request(|tx| Command::LegalDestinations(square, tx))
            .await
    }

    /// Current state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, DriverError> {
        self.request(Command::Snapshot).await
    }

    /// The game as PGN.
    pub async fn pgn(&self) -> Result<String, DriverError> {
        self.request(Command::Pgn).await
    }

    /// Stops the driver task.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| DriverError::Closed)
    }
}

/// Owns a session and runs its event loop.
pub struct SessionDriver<O: RulesOracle + Default> {
    session: Session<O>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    in_flight: Option<PendingSuggestion>,
}

impl<O> SessionDriver<O>
where
    O: RulesOracle + Default + 'static,
{
    /// Spawns the driver for `session` on the current tokio runtime.
    ///
    /// Returns the handle, the event stream and the task handle.
    #[instrument(skip(session), fields(session_id = %session.id()))]
    pub fn spawn(
        session: Session<O>,
    ) -> (
        SessionHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
        JoinHandle<()>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let driver = Self {
            session,
            commands: command_rx,
            events: event_tx,
            in_flight: None,
        };
        let task = tokio::spawn(driver.run());
        (
            SessionHandle {
                commands: command_tx,
            },
            event_rx,
            task,
        )
    }

    /// Runs until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!(session_id = %self.session.id(), "Session driver started");
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.in_flight.is_none() {
                self.in_flight = self.session.begin_suggestion();
            }
            self.flush_events();

            tokio::select! {
                _ = interval.tick() => {
                    self.session.poll_clocks();
                }
                command = self.commands.recv() => {
                    match command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => self.handle(command),
                    }
                }
                result = await_suggestion(&mut self.in_flight), if self.in_flight.is_some() => {
                    if let Some(pending) = self.in_flight.take() {
                        let outcome = self.session.complete_suggestion(&pending.ticket, result);
                        debug!(?outcome, "Suggestion answered");
                    }
                }
            }

            self.drop_abandoned_suggestion();
        }

        self.flush_events();
        info!(session_id = %self.session.id(), "Session driver stopped");
    }

    fn handle(&mut self, command: Command) {
        let session = &mut self.session;
        match command {
            Command::SubmitMove(request, reply) => {
                let _ = reply.send(session.submit_move(request));
            }
            Command::Undo(reply) => {
                let _ = reply.send(session.undo());
            }
            Command::NavigateTo(index, reply) => {
                let _ = reply.send(session.navigate_to(index));
            }
            Command::NewGame(mode, reply) => {
                let _ = reply.send(session.new_game(mode));
            }
            Command::LoadPgn(pgn, reply) => {
                let _ = reply.send(session.load_pgn(&pgn));
            }
            Command::Pause(reply) => {
                let _ = reply.send(session.pause());
            }
            Command::Resume(reply) => {
                let _ = reply.send(session.resume());
            }
            Command::SetTimeControl(control, reply) => {
                session.set_time_control(control);
                let _ = reply.send(());
            }
            Command::SetDifficulty(level, reply) => {
                session.set_difficulty(level);
                let _ = reply.send(());
            }
            Command::RetrySuggestion(reply) => {
                session.retry_suggestion();
                let _ = reply.send(());
            }
            Command::LegalDestinations(square, reply) => {
                let _ = reply.send(session.legal_destinations(square));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(session.snapshot());
            }
            Command::Pgn(reply) => {
                let _ = reply.send(session.pgn());
            }
            Command::Shutdown => {}
        }
    }

    /// Cancels the in-flight suggestion once the session no longer wants it.
    fn drop_abandoned_suggestion(&mut self) {
        let abandoned = self
            .in_flight
            .as_ref()
            .is_some_and(|p| !self.session.is_ticket_current(&p.ticket));
        if abandoned {
            debug!("Cancelling abandoned suggestion");
            self.in_flight = None;
        }
    }

    fn flush_events(&mut self) {
        for event in self.session.drain_events() {
            // A dropped receiver just means nobody is listening.
            let _ = self.events.send(event);
        }
    }
}

async fn await_suggestion(
    in_flight: &mut Option<PendingSuggestion>,
) -> Result<String, PolicyError> {
    match in_flight {
        Some(pending) => pending.future.as_mut().await,
        None => std::future::pending().await,
    }
}
