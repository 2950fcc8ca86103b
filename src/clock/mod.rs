//! Countdown clocks and the coordinator that enforces a single running clock.

mod coordinator;
mod time_control;
mod timer;

pub use coordinator::{ClockCoordinator, ClockSnapshot};
pub use time_control::{TimeControl, TimeControlPreset, format_clock};
pub use timer::{Clock, ClockEvent, TICK_INTERVAL};
