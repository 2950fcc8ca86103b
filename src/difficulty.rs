//! Difficulty levels for the automated opponent.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Named strength settings.
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
pub enum DifficultyLevel {
    /// Plays almost at random, answers fast.
    Beginner,
    /// Default level.
    #[default]
    Casual,
    /// Mid-range.
    Intermediate,
    /// Prefers forcing moves.
    Advanced,
    /// Prefers forcing moves and takes its time.
    Expert,
}

/// Parameters handed to a move suggestion policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct DifficultyConfig {
    /// The level these parameters came from.
    level: DifficultyLevel,
    /// Display label.
    label: String,
    /// Approximate playing strength.
    elo: u32,
    /// Nominal search depth.
    depth: u32,
    /// Simulated thinking time, in milliseconds.
    move_time_ms: u64,
    /// Skill on a 0..=20 scale; above 10 the policy favours forcing moves.
    skill: u8,
}

impl DifficultyConfig {
    /// Simulated thinking time.
    pub fn move_time(&self) -> Duration {
        Duration::from_millis(self.move_time_ms)
    }

    /// Whether the policy should prefer captures and checks.
    pub fn prefers_forcing_moves(&self) -> bool {
        self.skill > 10
    }

    /// Same parameters with a different thinking time.
    pub fn with_move_time_ms(mut self, move_time_ms: u64) -> Self {
        self.move_time_ms = move_time_ms;
        self
    }
}

impl DifficultyLevel {
    /// The parameters for this level.
    #[instrument]
    pub fn config(self) -> DifficultyConfig {
        let (label, elo, depth, move_time_ms, skill) = match self {
            Self::Beginner => ("Beginner", 800, 5, 100, 1),
            Self::Casual => ("Casual", 1_200, 8, 500, 5),
            Self::Intermediate => ("Intermediate", 1_600, 12, 1_000, 10),
            Self::Advanced => ("Advanced", 2_000, 16, 2_000, 15),
            Self::Expert => ("Expert", 2_400, 20, 3_000, 20),
        };
        DifficultyConfig {
            level: self,
            label: label.to_string(),
            elo,
            depth,
            move_time_ms,
            skill,
        }
    }
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        DifficultyLevel::default().config()
    }
}
