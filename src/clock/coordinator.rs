//! Two clocks with at most one running.

use super::{Clock, ClockEvent, TimeControl};
use crate::TimeSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strictly_chess_rules::Color;
use tracing::{debug, info, instrument};

/// Read-only view of both clocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// The control both clocks were configured from.
    pub control: TimeControl,
    /// White's remaining time.
    pub white_ms: u64,
    /// Black's remaining time.
    pub black_ms: u64,
    /// The running clock, if any.
    pub active: Option<Color>,
}

/// Owns one clock per player and keeps at most one of them running.
///
/// Every operation reads the time source once, so a switch stops one clock
/// and starts the other at the same instant.
#[derive(Debug)]
pub struct ClockCoordinator {
    control: TimeControl,
    white: Clock,
    black: Clock,
    source: Arc<dyn TimeSource>,
}

impl ClockCoordinator {
    /// Creates two stopped clocks at the control's allotment.
    #[instrument(skip(source))]
    pub fn new(control: TimeControl, source: Arc<dyn TimeSource>) -> Self {
        let initial = control.initial_ms();
        Self {
            control,
            white: Clock::new(Color::White, initial),
            black: Clock::new(Color::Black, initial),
            source,
        }
    }

    /// The current configuration.
    pub fn time_control(&self) -> &TimeControl {
        &self.control
    }

    /// The clock belonging to `player`.
    pub fn clock(&self, player: Color) -> &Clock {
        match player {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn clock_mut(&mut self, player: Color) -> &mut Clock {
        match player {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Stops the other clock, then starts `player`'s.
    #[instrument(skip(self))]
    pub fn start(&mut self, player: Color) {
        let now = self.source.now_ms();
        self.clock_mut(player.opponent()).stop(now);
        self.clock_mut(player).start(now);
        debug!(active = ?self.active(), "Clock started");
    }

    /// Hands the turn from `from` to `to`: stop `from`, credit its increment,
    /// start `to`.
    #[instrument(skip(self))]
    pub fn switch(&mut self, from: Color, to: Color) {
        let now = self.source.now_ms();
        let increment = *self.control.increment_secs();
        let mover = self.clock_mut(from);
        mover.stop(now);
        mover.add_increment(increment);
        if from != to {
            self.clock_mut(to).start(now);
        }
        debug!(
            from = %from,
            to = %to,
            from_ms = self.clock(from).remaining_ms(),
            "Clocks switched"
        );
    }

    /// Stops both clocks.
    #[instrument(skip(self))]
    pub fn stop_all(&mut self) {
        let now = self.source.now_ms();
        self.white.stop(now);
        self.black.stop(now);
    }

    /// Advances whichever clock is running.
    ///
    /// On timeout both clocks end up stopped and nothing restarts them.
    pub fn tick(&mut self) -> Vec<ClockEvent> {
        let now = self.source.now_ms();
        let mut events = self.white.tick(now);
        events.extend(self.black.tick(now));
        if events
            .iter()
            .any(|e| matches!(e, ClockEvent::Timeout { .. }))
        {
            self.stop_all();
        }
        events
    }

    /// Stops everything and reconfigures both clocks for `control`.
    #[instrument(skip(self), fields(control = %control))]
    pub fn set_time_control(&mut self, control: TimeControl) {
        self.stop_all();
        let initial = control.initial_ms();
        self.white = Clock::new(Color::White, initial);
        self.black = Clock::new(Color::Black, initial);
        self.control = control;
        info!("Time control changed");
    }

    /// Stops both clocks and restores the allotment.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.white.reset();
        self.black.reset();
    }

    /// Remaining time for `player`.
    pub fn remaining_ms(&self, player: Color) -> u64 {
        self.clock(player).remaining_ms()
    }

    /// The running clock, if any.
    pub fn active(&self) -> Option<Color> {
        if self.white.is_running() {
            Some(Color::White)
        } else if self.black.is_running() {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// The player whose clock ran out, if any.
    pub fn flagged(&self) -> Option<Color> {
        [&self.white, &self.black]
            .into_iter()
            .find(|c| c.is_flagged())
            .map(Clock::owner)
    }

    /// Both clocks' state.
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            control: self.control.clone(),
            white_ms: self.white.remaining_ms(),
            black_ms: self.black.remaining_ms(),
            active: self.active(),
        }
    }
}
