//! Time controls and their presets.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Initial allotment and per-move increment for both players.
///
/// A control with zero allotment is inactive: sessions using it run
/// without clocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, new)]
pub struct TimeControl {
    /// Display name.
    name: String,
    /// Starting time per player, in seconds.
    initial_secs: u64,
    /// Seconds added to the mover's clock after each move.
    increment_secs: u64,
}

impl TimeControl {
    /// The control that disables clocks.
    pub fn inactive() -> Self {
        TimeControlPreset::None.time_control()
    }

    /// Whether clocks participate at all.
    pub fn is_active(&self) -> bool {
        self.initial_secs > 0
    }

    /// Starting time per player, in milliseconds.
    pub fn initial_ms(&self) -> u64 {
        self.initial_secs.saturating_mul(1_000)
    }

    /// Increment, in milliseconds.
    pub fn increment_ms(&self) -> u64 {
        self.increment_secs.saturating_mul(1_000)
    }
}

impl std::fmt::Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_active() {
            write!(
                f,
                "{} ({}+{})",
                self.name,
                format_clock(self.initial_ms()),
                self.increment_secs
            )
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Named time controls.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimeControlPreset {
    /// One minute, no increment.
    Bullet,
    /// Three minutes plus two seconds.
    Blitz,
    /// Ten minutes.
    #[default]
    Rapid,
    /// Thirty minutes.
    Classical,
    /// Five minutes plus three seconds.
    Fischer,
    /// Ten minutes unless configured otherwise.
    Custom,
    /// No clocks.
    None,
}

impl TimeControlPreset {
    /// The control this preset stands for.
    #[instrument]
    pub fn time_control(self) -> TimeControl {
        let (name, initial, increment) = match self {
            Self::Bullet => ("Bullet", 60, 0),
            Self::Blitz => ("Blitz", 180, 2),
            Self::Rapid => ("Rapid", 600, 0),
            Self::Classical => ("Classical", 1_800, 0),
            Self::Fischer => ("Fischer", 300, 3),
            Self::Custom => ("Custom", 600, 0),
            Self::None => ("No clock", 0, 0),
        };
        TimeControl::new(name.to_string(), initial, increment)
    }
}

/// Renders milliseconds as `M:SS`, rounding down.
pub fn format_clock(ms: u64) -> String {
    let total_secs = ms / 1_000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
