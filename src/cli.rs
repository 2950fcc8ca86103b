//! Command-line interface for strictly_chess.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strictly_chess::{Color, DifficultyLevel, Opponent, TimeControlPreset};

/// Strictly Chess - chess sessions with history navigation and Fischer clocks
#[derive(Parser, Debug)]
#[command(name = "strictly_chess")]
#[command(about = "Play chess in the terminal against a person or the automaton", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game on the terminal
    Play {
        /// Path to a session config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Opponent: human or automaton
        #[arg(long)]
        opponent: Option<Opponent>,

        /// Side played by the automaton
        #[arg(long)]
        automaton: Option<Color>,

        /// Time control preset (bullet, blitz, rapid, classical, fischer, custom, none)
        #[arg(short, long)]
        time_control: Option<TimeControlPreset>,

        /// Automaton strength (beginner, casual, intermediate, advanced, expert)
        #[arg(short, long)]
        difficulty: Option<DifficultyLevel>,

        /// Start position (FEN)
        #[arg(long)]
        fen: Option<String>,

        /// Seed for the automaton's random choices
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List time control presets and difficulty levels
    Presets,
}
