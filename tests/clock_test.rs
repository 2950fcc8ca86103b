//! Tests for the clock coordinator's exclusivity, increment and timeout rules.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use strictly_chess::{
    ClockCoordinator, ClockEvent, Color, ManualTimeSource, TimeControl, TimeControlPreset,
};

fn coordinator(preset: TimeControlPreset) -> (ClockCoordinator, ManualTimeSource) {
    let time = ManualTimeSource::new();
    let clocks = ClockCoordinator::new(preset.time_control(), Arc::new(time.clone()));
    (clocks, time)
}

fn both_running(clocks: &ClockCoordinator) -> bool {
    clocks.clock(Color::White).is_running() && clocks.clock(Color::Black).is_running()
}

#[test]
fn test_start_stops_the_other_clock() {
    let (mut clocks, _) = coordinator(TimeControlPreset::Rapid);
    clocks.start(Color::White);
    assert_eq!(clocks.active(), Some(Color::White));
    clocks.start(Color::Black);
    assert_eq!(clocks.active(), Some(Color::Black));
    assert!(!clocks.clock(Color::White).is_running());
}

#[test]
fn test_never_two_clocks_running() {
    let (mut clocks, time) = coordinator(TimeControlPreset::Blitz);
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..2_000 {
        let color = if rng.random_bool(0.5) {
            Color::White
        } else {
            Color::Black
        };
        match rng.random_range(0..4) {
            0 => clocks.start(color),
            1 => clocks.switch(color, color.opponent()),
            2 => clocks.stop_all(),
            _ => {
                time.advance(rng.random_range(0..250));
                clocks.tick();
            }
        }
        assert!(!both_running(&clocks));
    }
}

#[test]
fn test_increment_goes_to_the_mover() {
    let (mut clocks, time) = coordinator(TimeControlPreset::Fischer);
    clocks.start(Color::White);
    time.advance(4_000);
    clocks.tick();
    let white_before = clocks.remaining_ms(Color::White);
    let black_before = clocks.remaining_ms(Color::Black);

    clocks.switch(Color::White, Color::Black);

    assert_eq!(clocks.remaining_ms(Color::White), white_before + 3_000);
    assert_eq!(clocks.remaining_ms(Color::Black), black_before);
    assert_eq!(clocks.active(), Some(Color::Black));
}

#[test]
fn test_switch_charges_untracked_time_before_increment() {
    let (mut clocks, time) = coordinator(TimeControlPreset::Fischer);
    clocks.start(Color::White);
    time.advance(1_050);
    clocks.switch(Color::White, Color::Black);
    assert_eq!(clocks.remaining_ms(Color::White), 300_000 - 1_050 + 3_000);
}

#[test]
fn test_zero_increment_leaves_mover_unchanged() {
    let (mut clocks, time) = coordinator(TimeControlPreset::Bullet);
    clocks.start(Color::White);
    time.advance(2_000);
    clocks.switch(Color::White, Color::Black);
    assert_eq!(clocks.remaining_ms(Color::White), 58_000);
}

#[test]
fn test_single_timeout_then_all_stopped() {
    let (mut clocks, time) = coordinator(TimeControlPreset::Bullet);
    clocks.start(Color::Black);

    let mut timeouts = Vec::new();
    for _ in 0..700 {
        time.advance(100);
        for event in clocks.tick() {
            if let ClockEvent::Timeout { player } = event {
                timeouts.push(player);
            }
        }
    }

    assert_eq!(timeouts, vec![Color::Black]);
    assert_eq!(clocks.active(), None);
    assert_eq!(clocks.flagged(), Some(Color::Black));
    assert_eq!(clocks.remaining_ms(Color::Black), 0);
    assert_eq!(clocks.remaining_ms(Color::White), 60_000);

    clocks.start(Color::Black);
    assert_eq!(clocks.active(), None);
}

#[test]
fn test_set_time_control_resets_everything() {
    let (mut clocks, time) = coordinator(TimeControlPreset::Bullet);
    clocks.start(Color::White);
    time.advance(5_000);
    clocks.tick();

    clocks.set_time_control(TimeControl::new("Two minutes".to_string(), 120, 1));
    assert_eq!(clocks.active(), None);
    assert_eq!(clocks.remaining_ms(Color::White), 120_000);
    assert_eq!(clocks.remaining_ms(Color::Black), 120_000);
    assert_eq!(*clocks.time_control().increment_secs(), 1);

    let snapshot = clocks.snapshot();
    assert_eq!(snapshot.white_ms, 120_000);
    assert_eq!(snapshot.active, None);
}

#[test]
fn test_ticks_report_the_running_clock_only() {
    let (mut clocks, time) = coordinator(TimeControlPreset::Rapid);
    assert!(clocks.tick().is_empty());
    clocks.start(Color::White);
    time.advance(100);
    assert_eq!(
        clocks.tick(),
        vec![ClockEvent::Tick {
            player: Color::White,
            remaining_ms: 599_900
        }]
    );
}

#[test]
fn test_timeout_is_followed_by_a_zero_tick() {
    let (mut clocks, time) = coordinator(TimeControlPreset::Bullet);
    clocks.start(Color::White);
    time.advance(60_250);

    assert_eq!(
        clocks.tick(),
        vec![
            ClockEvent::Timeout {
                player: Color::White
            },
            ClockEvent::Tick {
                player: Color::White,
                remaining_ms: 0
            },
        ]
    );
    assert!(clocks.tick().is_empty());
}
