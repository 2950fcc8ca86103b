//! Session configuration loaded from TOML.

use crate::clock::{TimeControl, TimeControlPreset};
use crate::difficulty::{DifficultyConfig, DifficultyLevel};
use crate::session::GameMode;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strictly_chess_rules::Color;
use tracing::{debug, info, instrument};

/// Who sits across the board from the human.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Opponent {
    /// Two humans share the board.
    Human,
    /// The automated opponent.
    #[default]
    Automaton,
}

/// Settings for a new session. Every field has a default, so an empty file
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct SessionConfig {
    /// Human or automated opponent.
    opponent: Opponent,

    /// Side played by the automated opponent.
    automaton_color: Color,

    /// Strength of the automated opponent.
    difficulty: DifficultyLevel,

    /// Named time control.
    time_control: TimeControlPreset,

    /// Allotment used by the `custom` preset, in seconds.
    custom_initial_secs: u64,

    /// Increment used by the `custom` preset, in seconds.
    custom_increment_secs: u64,

    /// Start position encoding; the standard start when absent.
    start_fen: Option<String>,

    /// Overrides the difficulty's thinking time, in milliseconds.
    move_time_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            opponent: Opponent::default(),
            automaton_color: Color::Black,
            difficulty: DifficultyLevel::default(),
            time_control: TimeControlPreset::default(),
            custom_initial_secs: 600,
            custom_increment_secs: 0,
            start_fen: None,
            move_time_ms: None,
        }
    }
}

impl SessionConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(
            opponent = %config.opponent,
            time_control = %config.time_control,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// The game mode these settings describe.
    pub fn mode(&self) -> GameMode {
        match self.opponent {
            Opponent::Human => GameMode::HumanVsHuman,
            Opponent::Automaton => GameMode::HumanVsAutomaton {
                automaton: self.automaton_color,
            },
        }
    }

    /// Same settings playing `mode`.
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        match mode {
            GameMode::HumanVsHuman => self.opponent = Opponent::Human,
            GameMode::HumanVsAutomaton { automaton } => {
                self.opponent = Opponent::Automaton;
                self.automaton_color = automaton;
            }
        }
        self
    }

    /// The configured time control, with the custom preset filled in.
    pub fn resolved_time_control(&self) -> TimeControl {
        self.control_for(self.time_control)
    }

    /// The control `preset` stands for under this config; `custom` takes its
    /// allotment and increment from here.
    pub fn control_for(&self, preset: TimeControlPreset) -> TimeControl {
        match preset {
            TimeControlPreset::Custom => TimeControl::new(
                "Custom".to_string(),
                self.custom_initial_secs,
                self.custom_increment_secs,
            ),
            preset => preset.time_control(),
        }
    }

    /// Difficulty parameters for `level`, honouring the thinking-time override.
    pub fn difficulty_config(&self, level: DifficultyLevel) -> DifficultyConfig {
        let config = level.config();
        match self.move_time_ms {
            Some(ms) => config.with_move_time_ms(ms),
            None => config,
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new config error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_preset_uses_configured_seconds() {
        let config = SessionConfig::default()
            .with_time_control(TimeControlPreset::Custom)
            .with_custom_initial_secs(90)
            .with_custom_increment_secs(5);
        let control = config.resolved_time_control();
        assert_eq!(control.initial_ms(), 90_000);
        assert_eq!(control.increment_ms(), 5_000);
    }

    #[test]
    fn mode_round_trips_through_settings() {
        let config = SessionConfig::default().with_mode(GameMode::HumanVsAutomaton {
            automaton: Color::White,
        });
        assert_eq!(*config.opponent(), Opponent::Automaton);
        assert_eq!(
            config.mode(),
            GameMode::HumanVsAutomaton {
                automaton: Color::White
            }
        );
        assert_eq!(
            config.with_mode(GameMode::HumanVsHuman).mode(),
            GameMode::HumanVsHuman
        );
    }

    #[test]
    fn move_time_override_applies() {
        let config = SessionConfig::default().with_move_time_ms(Some(0));
        let difficulty = config.difficulty_config(DifficultyLevel::Expert);
        assert_eq!(*difficulty.move_time_ms(), 0);
        assert_eq!(*difficulty.skill(), 20);
    }
}
