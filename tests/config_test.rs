//! Tests for loading session configuration from TOML.

use std::io::Write;
use strictly_chess::{
    Color, DifficultyLevel, GameMode, Opponent, SessionConfig, TimeControlPreset,
};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
opponent = "automaton"
automaton_color = "white"
difficulty = "expert"
time_control = "custom"
custom_initial_secs = 900
custom_increment_secs = 10
move_time_ms = 50
"#,
    );
    let config = SessionConfig::from_file(file.path()).unwrap();

    assert_eq!(*config.opponent(), Opponent::Automaton);
    assert_eq!(
        config.mode(),
        GameMode::HumanVsAutomaton {
            automaton: Color::White
        }
    );
    assert_eq!(*config.time_control(), TimeControlPreset::Custom);
    let control = config.resolved_time_control();
    assert_eq!(control.initial_ms(), 900_000);
    assert_eq!(control.increment_ms(), 10_000);

    let difficulty = config.difficulty_config(*config.difficulty());
    assert_eq!(*difficulty.level(), DifficultyLevel::Expert);
    assert_eq!(*difficulty.move_time_ms(), 50);
}

#[test]
fn test_empty_file_gives_defaults() {
    let file = write_config("");
    let config = SessionConfig::from_file(file.path()).unwrap();
    assert_eq!(config, SessionConfig::default());
    assert_eq!(config.resolved_time_control().initial_ms(), 600_000);
}

#[test]
fn test_start_position_from_file() {
    let file = write_config(
        r#"
opponent = "human"
time_control = "none"
start_fen = "8/8/8/8/8/8/8/K1k5 w - - 0 1"
"#,
    );
    let config = SessionConfig::from_file(file.path()).unwrap();
    assert_eq!(config.mode(), GameMode::HumanVsHuman);
    assert!(!config.resolved_time_control().is_active());
    assert_eq!(
        config.start_fen().as_deref(),
        Some("8/8/8/8/8/8/8/K1k5 w - - 0 1")
    );
}

#[test]
fn test_unknown_preset_is_rejected() {
    let file = write_config("time_control = \"hourglass\"\n");
    let err = SessionConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_missing_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = SessionConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.message.contains("Failed to read config file"));
}

#[test]
fn test_custom_preset_resolves_from_config_when_switched_later() {
    let file = write_config("time_control = \"blitz\"\ncustom_initial_secs = 45\ncustom_increment_secs = 5\n");
    let config = SessionConfig::from_file(file.path()).unwrap();
    assert_eq!(config.resolved_time_control().initial_ms(), 180_000);

    let custom = config.control_for(TimeControlPreset::Custom);
    assert_eq!(custom.initial_ms(), 45_000);
    assert_eq!(custom.increment_ms(), 5_000);
    assert_eq!(
        config.control_for(TimeControlPreset::Bullet),
        TimeControlPreset::Bullet.time_control()
    );
}
