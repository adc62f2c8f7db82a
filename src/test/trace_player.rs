use crate::play::{PlayerState, TracePlayer, SPEEDS};
use crate::trace::{PacketEvent, TraceEventKind, TraceParseError};
use std::time::Duration;

fn event_at(time_ns: u64) -> PacketEvent {
    PacketEvent {
        time_ns,
        kind: TraceEventKind::Tx,
        node: 0,
        device: 0,
        size: 100,
        source: None,
        target: None,
        link_id: "link_0".to_string(),
        protocol: "ppp".to_string(),
    }
}

fn player_with_millis(times_ms: &[u64]) -> TracePlayer {
    let events = times_ms.iter().map(|ms| event_at(ms * 1_000_000)).collect();
    TracePlayer::load_events(events).expect("load")
}

#[test]
fn empty_trace_is_rejected() {
    let err = TracePlayer::load_events(Vec::new()).expect_err("empty");
    assert!(matches!(err, TraceParseError::Empty));
}

#[test]
fn advance_delivers_due_events_in_order() {
    let mut player = player_with_millis(&[0, 1, 2, 3]);
    player.play();
    assert_eq!(player.state(), PlayerState::Playing);

    let mut seen = Vec::new();
    player.advance(Duration::from_millis(1), |e| seen.push(e.time_ns));
    assert_eq!(seen, vec![0, 1_000_000]);

    player.advance(Duration::from_millis(1), |e| seen.push(e.time_ns));
    assert_eq!(seen.len(), 3);

    player.advance(Duration::from_millis(1), |e| seen.push(e.time_ns));
    assert_eq!(seen.len(), 4);
    assert_eq!(player.state(), PlayerState::Finished);
    assert_eq!(player.progress(), 1.0);
}

#[test]
fn advance_scales_by_speed() {
    let mut player = player_with_millis(&[0, 1, 2, 3]);
    player.set_speed(2.0);
    player.play();

    let mut count = 0;
    player.advance(Duration::from_millis(1), |_| count += 1);
    // virtual clock moved 2ms
    assert_eq!(count, 3);
}

#[test]
fn paused_player_does_not_advance() {
    let mut player = player_with_millis(&[0, 1]);
    player.play();
    player.pause();
    let mut count = 0;
    player.advance(Duration::from_millis(10), |_| count += 1);
    assert_eq!(count, 0);
    assert_eq!(player.state(), PlayerState::Paused);
}

#[test]
fn speed_is_clamped_to_supported_range() {
    let mut player = player_with_millis(&[0, 1]);
    player.set_speed(1000.0);
    assert_eq!(player.speed(), 100.0);
    player.set_speed(0.001);
    assert_eq!(player.speed(), 0.1);
    // every preset speed survives the clamp
    for speed in SPEEDS {
        player.set_speed(speed);
        assert_eq!(player.speed(), speed);
    }
}

#[test]
fn seek_skips_already_played_window() {
    let mut player = player_with_millis(&[0, 1, 2, 3]);
    player.play();
    player.seek(1_500_000);

    let mut seen = Vec::new();
    player.advance(Duration::from_millis(1), |e| seen.push(e.time_ns));
    // only the 2ms event falls in (1.5ms, 2.5ms]
    assert_eq!(seen, vec![2_000_000]);
}

#[test]
fn seek_clamps_to_trace_bounds() {
    let mut player = player_with_millis(&[1, 2, 3]);
    player.seek(u64::MAX);
    assert_eq!(player.current_time_ns(), 3_000_000);
    player.seek(0);
    assert_eq!(player.current_time_ns(), 1_000_000);
}

#[test]
fn seeking_back_from_finished_resumes_paused() {
    let mut player = player_with_millis(&[0, 1]);
    player.play();
    player.advance(Duration::from_secs(1), |_| {});
    assert_eq!(player.state(), PlayerState::Finished);

    player.seek_progress(0.0);
    assert_eq!(player.state(), PlayerState::Paused);
    player.play();
    let mut count = 0;
    player.advance(Duration::from_millis(2), |_| count += 1);
    assert_eq!(count, 1, "only the 1ms event is ahead of the seek point");
}

#[test]
fn stop_rewinds_to_the_start() {
    let mut player = player_with_millis(&[0, 1]);
    player.play();
    player.advance(Duration::from_secs(1), |_| {});
    player.stop();
    assert_eq!(player.state(), PlayerState::Idle);
    assert_eq!(player.current_time_ns(), 0);

    player.play();
    let mut count = 0;
    player.advance(Duration::from_secs(1), |_| count += 1);
    assert_eq!(count, 2, "a stopped player replays from the beginning");
}

#[test]
fn events_in_range_uses_inclusive_bounds() {
    let player = player_with_millis(&[0, 1, 2, 3]);
    let window = player.events_in_range(1_000_000, 2_000_000);
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].time_ns, 1_000_000);
    assert_eq!(window[1].time_ns, 2_000_000);
    assert_eq!(player.event_count(), 4);
    assert_eq!(player.duration_ns(), 3_000_000);
}
