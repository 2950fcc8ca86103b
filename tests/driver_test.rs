//! Tests for the tokio session driver.

use std::sync::Arc;
use std::time::Duration;
use strictly_chess::{
    Color, DriverError, GameMode, MoveRequest, Opponent, START_POSITION, Session, SessionConfig,
    SessionDriver, SessionError, SessionEvent, SessionPhase, SkillPolicy, TimeControlPreset,
    TokioTimeSource,
};
use tokio::sync::mpsc::UnboundedReceiver;

fn mv(s: &str) -> MoveRequest {
    s.parse().unwrap()
}

fn session(config: SessionConfig) -> Session {
    Session::new(
        config,
        Arc::new(SkillPolicy::with_seed(5)),
        Arc::new(TokioTimeSource::new()),
    )
    .unwrap()
}

async fn next_move(events: &mut UnboundedReceiver<SessionEvent>) -> (Color, String) {
    loop {
        match events.recv().await {
            Some(SessionEvent::MovePlayed { color, san, .. }) => return (color, san),
            Some(_) => continue,
            None => panic!("event stream closed"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_automaton_answers_human_move() {
    let config = SessionConfig::default()
        .with_opponent(Opponent::Automaton)
        .with_time_control(TimeControlPreset::Blitz)
        .with_move_time_ms(Some(250));
    let (handle, mut events, _task) = SessionDriver::spawn(session(config));

    handle.submit_move(mv("e2e4")).await.unwrap();
    assert_eq!(next_move(&mut events).await.0, Color::White);
    assert_eq!(next_move(&mut events).await.0, Color::Black);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.total_moves, 2);
    assert_eq!(snapshot.side_to_move, Color::White);
    assert!(!snapshot.awaiting_suggestion);
    let clocks = snapshot.clocks.unwrap();
    assert_eq!(clocks.active, Some(Color::White));
    // Black thought for about 250 ms and gained the 2 s increment.
    assert!(clocks.black_ms > 180_000 && clocks.black_ms <= 182_000);
}

#[tokio::test(start_paused = true)]
async fn test_clock_runs_out_without_moves() {
    let config = SessionConfig::default()
        .with_opponent(Opponent::Human)
        .with_time_control(TimeControlPreset::Bullet);
    let (handle, mut events, _task) = SessionDriver::spawn(session(config));

    handle.submit_move(mv("e2e4")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(61)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(
        snapshot.phase,
        SessionPhase::Timeout {
            loser: Color::Black
        }
    );
    let err = handle.submit_move(mv("e7e5")).await.unwrap_err();
    assert!(matches!(
        err,
        DriverError::Session(SessionError::NotInProgress(_))
    ));

    let mut timeouts = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::Timeout { .. }) {
            timeouts += 1;
        }
    }
    assert_eq!(timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_undo_cancels_slow_suggestion() {
    let config = SessionConfig::default()
        .with_opponent(Opponent::Automaton)
        .with_time_control(TimeControlPreset::None)
        .with_move_time_ms(Some(10_000));
    let (handle, mut events, _task) = SessionDriver::spawn(session(config));

    handle.submit_move(mv("e2e4")).await.unwrap();
    assert!(handle.snapshot().await.unwrap().awaiting_suggestion);
    handle.undo().await.unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.total_moves, 0);
    assert_eq!(snapshot.position, START_POSITION);
    assert!(!snapshot.awaiting_suggestion);
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, SessionEvent::MovePlayed { color: Color::Black, .. }),
            "abandoned suggestion was applied"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_new_game_through_handle() {
    let config = SessionConfig::default()
        .with_opponent(Opponent::Human)
        .with_time_control(TimeControlPreset::Rapid);
    let (handle, mut events, _task) = SessionDriver::spawn(session(config));
    handle.submit_move(mv("d2d4")).await.unwrap();
    let first = handle.snapshot().await.unwrap().id;

    handle
        .new_game(Some(GameMode::HumanVsAutomaton {
            automaton: Color::Black,
        }))
        .await
        .unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_ne!(snapshot.id, first);
    assert_eq!(snapshot.total_moves, 0);

    let mut saw_new_game = false;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::NewGame { id, .. } = event {
            assert_eq!(id, snapshot.id);
            saw_new_game = true;
        }
    }
    assert!(saw_new_game);
}

#[tokio::test(start_paused = true)]
async fn test_pause_through_handle_freezes_clock() {
    let config = SessionConfig::default()
        .with_opponent(Opponent::Human)
        .with_time_control(TimeControlPreset::Rapid);
    let (handle, _events, _task) = SessionDriver::spawn(session(config));
    handle.submit_move(mv("e2e4")).await.unwrap();
    handle.pause().await.unwrap();
    let frozen = handle.snapshot().await.unwrap().clocks.unwrap().black_ms;

    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    assert_eq!(snapshot.clocks.unwrap().black_ms, frozen);

    let err = handle.submit_move(mv("e7e5")).await.unwrap_err();
    assert_eq!(err, DriverError::Session(SessionError::Paused));
    handle.resume().await.unwrap();
    handle.submit_move(mv("e7e5")).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_handle_reports_closed_after_shutdown() {
    let config = SessionConfig::default().with_opponent(Opponent::Human);
    let (handle, _events, task) = SessionDriver::spawn(session(config));

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(handle.snapshot().await.unwrap_err(), DriverError::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_load_pgn_through_handle() {
    let config = SessionConfig::default().with_opponent(Opponent::Human);
    let (handle, _events, _task) = SessionDriver::spawn(session(config));

    let count = handle
        .load_pgn("1. d4 d5 2. c4 *".to_string())
        .await
        .unwrap();
    assert_eq!(count, 3);
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.cursor, 2);
    assert_eq!(snapshot.side_to_move, Color::Black);

    let err = handle.load_pgn("1. e5".to_string()).await.unwrap_err();
    assert!(matches!(err, DriverError::Session(SessionError::Pgn(_))));
    assert_eq!(handle.snapshot().await.unwrap().total_moves, 3);
}
