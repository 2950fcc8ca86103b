//! Strictly Chess - terminal front end
//!
//! Line-oriented play against another person or the automated opponent.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use std::sync::Arc;
use strictly_chess::{
    Color, DifficultyLevel, GameMode, MovePolicy, MoveRequest, Opponent, Session, SessionConfig,
    SessionDriver, SessionEvent, SessionHandle, SkillPolicy, Square, TimeControlPreset,
    TokioTimeSource, format_clock,
};
use strum::IntoEnumIterator;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Commands:
  e2e4 / e7e8q        play a move
  undo                take back the last move
  goto N              show position after move N (-1 = start)
  moves SQUARE        list destinations for the piece on SQUARE
  pause | resume      stop or restart the clocks
  new [human|white|black]
                      start over (optionally vs human, or automaton playing white/black)
  load FILE           replace the game with a PGN file's mainline
  time PRESET         change the time control
  level LEVEL         change the automaton's strength
  retry               ask the automaton again after a failure
  show | json | pgn   print the game
  help | quit";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            opponent,
            automaton,
            time_control,
            difficulty,
            fen,
            seed,
        } => {
            let config = build_config(config, opponent, automaton, time_control, difficulty, fen)?;
            run_play(config, seed).await
        }
        Command::Presets => {
            print_presets();
            Ok(())
        }
    }
}

/// Merges the config file with command-line overrides.
#[instrument]
fn build_config(
    path: Option<PathBuf>,
    opponent: Option<Opponent>,
    automaton: Option<Color>,
    time_control: Option<TimeControlPreset>,
    difficulty: Option<DifficultyLevel>,
    fen: Option<String>,
) -> Result<SessionConfig> {
    let mut config = match path {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(opponent) = opponent {
        config = config.with_opponent(opponent);
    }
    if let Some(color) = automaton {
        config = config.with_automaton_color(color);
    }
    if let Some(preset) = time_control {
        config = config.with_time_control(preset);
    }
    if let Some(level) = difficulty {
        config = config.with_difficulty(level);
    }
    if fen.is_some() {
        config = config.with_start_fen(fen);
    }
    Ok(config)
}

fn print_presets() {
    println!("Time controls:");
    for preset in TimeControlPreset::iter() {
        println!("  {:<10} {}", preset.to_string(), preset.time_control());
    }
    println!("Difficulty levels:");
    for level in DifficultyLevel::iter() {
        let config = level.config();
        println!(
            "  {:<13} elo {:>4}, thinks {} ms",
            level.to_string(),
            config.elo(),
            config.move_time_ms()
        );
    }
}

/// Runs an interactive game on stdin/stdout.
async fn run_play(config: SessionConfig, seed: Option<u64>) -> Result<()> {
    let policy: Arc<dyn MovePolicy> = Arc::new(match seed {
        Some(seed) => SkillPolicy::with_seed(seed),
        None => SkillPolicy::new(),
    });
    let session: Session =
        Session::new(config.clone(), policy, Arc::new(TokioTimeSource::new()))?;
    info!(session_id = %session.id(), "Starting game");

    let (handle, mut events, task) = SessionDriver::spawn(session);
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    println!("{HELP}");
    print_summary(&handle).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }
        if let Err(e) = run_command(&handle, &config, line).await {
            println!("! {e}");
        }
    }

    handle.shutdown().await.ok();
    task.await?;
    printer.await?;
    Ok(())
}

/// Executes one line of input.
async fn run_command(handle: &SessionHandle, config: &SessionConfig, line: &str) -> Result<()> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(());
    };
    let arg = words.next();

    match (verb, arg) {
        ("help", _) => println!("{HELP}"),
        ("undo", _) => {
            let removed = handle.undo().await?;
            println!("took back {}", removed.san);
        }
        ("goto", Some(n)) => {
            if !handle.navigate_to(n.parse()?).await? {
                println!("no such move");
            }
            print_summary(handle).await?;
        }
        ("moves", Some(sq)) => {
            let square: Square = sq.parse()?;
            let destinations = handle.legal_destinations(square).await?;
            let names: Vec<String> = destinations.iter().map(ToString::to_string).collect();
            println!("{square}: {}", names.join(" "));
        }
        ("pause", _) => handle.pause().await?,
        ("resume", _) => handle.resume().await?,
        ("new", mode) => {
            let mode = match mode {
                None => None,
                Some("human") => Some(GameMode::HumanVsHuman),
                Some(color) => Some(GameMode::HumanVsAutomaton {
                    automaton: color.parse()?,
                }),
            };
            handle.new_game(mode).await?;
            print_summary(handle).await?;
        }
        ("time", Some(preset)) => {
            let preset: TimeControlPreset = preset.parse()?;
            handle.set_time_control(config.control_for(preset)).await?;
        }
        ("level", Some(level)) => handle.set_difficulty(level.parse()?).await?,
        ("load", Some(path)) => {
            let pgn = tokio::fs::read_to_string(path).await?;
            let count = handle.load_pgn(pgn).await?;
            println!("loaded {count} moves");
            print_summary(handle).await?;
        }
        ("retry", _) => handle.retry_suggestion().await?,
        ("show", _) => print_summary(handle).await?,
        ("json", _) => println!("{}", serde_json::to_string_pretty(&handle.snapshot().await?)?),
        ("pgn", _) => print!("{}", handle.pgn().await?),
        _ => {
            let request: MoveRequest = line.parse()?;
            handle.submit_move(request).await?;
        }
    }
    Ok(())
}

async fn print_summary(handle: &SessionHandle) -> Result<()> {
    let snapshot = handle.snapshot().await?;
    println!("{} | {}", snapshot.mode, snapshot.phase);
    println!("{}", snapshot.position);
    if let Some(clocks) = &snapshot.clocks {
        let marker = |c: Color| if clocks.active == Some(c) { "*" } else { " " };
        println!(
            "{}white {}  {}black {}",
            marker(Color::White),
            format_clock(clocks.white_ms),
            marker(Color::Black),
            format_clock(clocks.black_ms)
        );
    }
    let movetext: Vec<String> = snapshot
        .moves
        .iter()
        .map(|m| {
            if m.active {
                m.san.clone()
            } else {
                format!("({})", m.san)
            }
        })
        .collect();
    if !movetext.is_empty() {
        println!("moves: {}", movetext.join(" "));
    }
    println!("{} to move", snapshot.side_to_move);
    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::MovePlayed {
            index, color, san, ..
        } => println!("{}. {} plays {}", index + 1, color, san),
        SessionEvent::PositionChanged { cursor, .. } => println!("at move {}", cursor + 1),
        SessionEvent::Timeout { loser } => println!("{loser} ran out of time"),
        SessionEvent::GameOver { phase } => println!("game over: {phase}"),
        SessionEvent::AutomatonThinking { side } => println!("automaton ({side}) is thinking..."),
        SessionEvent::SuggestionFailed { message } => {
            warn!(%message, "Automaton failed");
            println!("automaton could not move: {message}");
        }
        SessionEvent::NewGame { mode, .. } => println!("new game: {mode}"),
        SessionEvent::ClocksReset { clocks } => match clocks {
            Some(c) => println!("clocks set to {}", c.control),
            None => println!("clocks off"),
        },
        SessionEvent::PhaseChanged { .. } | SessionEvent::ClockTick { .. } => {}
    }
}
