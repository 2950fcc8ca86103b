//! A single player's countdown clock.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use strictly_chess_rules::Color;
use tracing::{debug, info, instrument};

/// Granularity at which running clocks are ticked.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Notification produced by advancing a running clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClockEvent {
    /// The clock advanced.
    Tick {
        /// Owner of the clock.
        player: Color,
        /// Time left after the tick.
        remaining_ms: u64,
    },
    /// The clock ran out. Fired once per reset.
    Timeout {
        /// Owner of the clock.
        player: Color,
    },
}

impl ClockEvent {
    /// Owner of the clock that produced the event.
    pub fn player(&self) -> Color {
        match self {
            ClockEvent::Tick { player, .. } | ClockEvent::Timeout { player } => *player,
        }
    }
}

/// Countdown state for one player.
///
/// The clock does not own a timer. Whoever drives it passes the current
/// time from a [`TimeSource`](crate::TimeSource); remaining time drops by
/// the elapsed delta since the previous reading, so late ticks lose nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    owner: Color,
    initial_ms: u64,
    remaining_ms: u64,
    running: bool,
    last_tick_ms: u64,
    flagged: bool,
}

impl Clock {
    /// Creates a stopped clock holding `initial_ms`.
    pub fn new(owner: Color, initial_ms: u64) -> Self {
        Self {
            owner,
            initial_ms,
            remaining_ms: initial_ms,
            running: false,
            last_tick_ms: 0,
            flagged: false,
        }
    }

    /// Player this clock belongs to.
    pub fn owner(&self) -> Color {
        self.owner
    }

    /// Time left as of the last tick or stop.
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Whether the clock is counting down.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the clock has run out since the last reset.
    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// Starts counting down from `now_ms`.
    ///
    /// A running clock is stopped first so only one tick source exists.
    /// A flagged clock stays stopped until [`reset`](Self::reset).
    #[instrument(skip(self), fields(player = %self.owner))]
    pub fn start(&mut self, now_ms: u64) {
        if self.flagged {
            debug!("Ignoring start on a flagged clock");
            return;
        }
        if self.running {
            self.stop(now_ms);
        }
        self.running = true;
        self.last_tick_ms = now_ms;
    }

    /// Stops counting down, charging time used since the last tick. Idempotent.
    #[instrument(skip(self), fields(player = %self.owner))]
    pub fn stop(&mut self, now_ms: u64) {
        if !self.running {
            return;
        }
        self.settle(now_ms);
        self.running = false;
    }

    /// Advances the clock to `now_ms`.
    ///
    /// Nothing when stopped, a single tick while time remains. When remaining
    /// time first reaches zero the clock stops itself and reports the timeout
    /// followed by a final tick at zero.
    pub fn tick(&mut self, now_ms: u64) -> Vec<ClockEvent> {
        if !self.running {
            return Vec::new();
        }
        self.settle(now_ms);
        let tick = ClockEvent::Tick {
            player: self.owner,
            remaining_ms: self.remaining_ms,
        };
        if self.remaining_ms == 0 {
            self.running = false;
            self.flagged = true;
            info!(player = %self.owner, "Clock ran out");
            return vec![ClockEvent::Timeout { player: self.owner }, tick];
        }
        vec![tick]
    }

    /// Adds `secs` seconds. Zero is a no-op.
    #[instrument(skip(self), fields(player = %self.owner))]
    pub fn add_increment(&mut self, secs: u64) {
        if secs == 0 {
            return;
        }
        self.remaining_ms = self.remaining_ms.saturating_add(secs.saturating_mul(1_000));
    }

    /// Stops and restores the initial allotment.
    #[instrument(skip(self), fields(player = %self.owner))]
    pub fn reset(&mut self) {
        self.running = false;
        self.flagged = false;
        self.remaining_ms = self.initial_ms;
    }

    fn settle(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_tick_ms);
        self.last_tick_ms = now_ms;
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
    }
}
