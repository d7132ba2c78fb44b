//! Governor timelines on a real tokio timer service
//!
//! Runs with tokio's paused clock so offsets are deterministic.

use parking_lot::Mutex;
use quench_core_governor::{Governor, GovernorConfig, GovernorState, TokioScheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};

type Log = Arc<Mutex<Vec<(u64, u64)>>>;

fn recording_action(start: Instant) -> (Log, impl Fn(u64) + Send + Sync + 'static) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let action = move |args: u64| {
        let at = Instant::now().duration_since(start).as_millis() as u64;
        sink.lock().push((at, args));
    };
    (log, action)
}

/// Trigger with the offset as argument at each offset, then let timers drain
async fn replay(governor: &Governor<u64>, start: Instant, offsets: &[u64]) {
    for &t in offsets {
        sleep_until(start + Duration::from_millis(t)).await;
        governor.trigger(t);
    }
    sleep(Duration::from_millis(1_000)).await;
}

fn assert_timeline(actual: &[(u64, u64)], expected: &[(u64, u64)]) {
    assert_eq!(actual.len(), expected.len(), "timeline {:?}", actual);
    for ((at, args), (want_at, want_args)) in actual.iter().zip(expected) {
        assert_eq!(args, want_args, "timeline {:?}", actual);
        assert!(
            *at >= *want_at && *at <= want_at + 2,
            "invocation at {}ms, expected ~{}ms (timeline {:?})",
            at,
            want_at,
            actual
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_debounce_burst_fires_after_quiet() {
    let start = Instant::now();
    let (log, action) = recording_action(start);
    let governor = Governor::debounce(
        Duration::from_millis(100),
        TokioScheduler::current().unwrap(),
        action,
    )
    .unwrap();

    replay(&governor, start, &[0, 30, 60]).await;

    assert_timeline(&log.lock(), &[(160, 60)]);
    assert_eq!(governor.state(), GovernorState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_immediate_fires_synchronously() {
    let start = Instant::now();
    let (log, action) = recording_action(start);
    let config = GovernorConfig::debounce(Duration::from_millis(100)).with_immediate(true);
    let governor = Governor::new(config, TokioScheduler::current().unwrap(), action).unwrap();

    governor.trigger(0);
    // No await in between: the leading call already happened
    assert_eq!(*log.lock(), vec![(0, 0)]);

    sleep_until(start + Duration::from_millis(40)).await;
    governor.trigger(40);
    assert_eq!(log.lock().len(), 1);

    sleep(Duration::from_millis(1_000)).await;
    assert_timeline(&log.lock(), &[(0, 0), (140, 40)]);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_spacing() {
    let start = Instant::now();
    let (log, action) = recording_action(start);
    let governor = Governor::throttle(
        Duration::from_millis(100),
        TokioScheduler::current().unwrap(),
        action,
    )
    .unwrap();

    replay(&governor, start, &[0, 30, 60, 90, 130]).await;

    let log = log.lock();
    assert_timeline(&log, &[(0, 0), (100, 90), (200, 130)]);
    for pair in log.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= 100, "timeline {:?}", *log);
    }
}

#[tokio::test(start_paused = true)]
async fn test_throttle_zero_interval_passes_through() {
    let start = Instant::now();
    let (log, action) = recording_action(start);
    let governor = Governor::throttle(Duration::ZERO, TokioScheduler::current().unwrap(), action)
        .unwrap();

    replay(&governor, start, &[0, 1, 2, 3]).await;
    assert_eq!(governor.invocations(), 4);
    assert_eq!(log.lock().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_prevents_invocation() {
    let start = Instant::now();
    let (log, action) = recording_action(start);
    let governor = Governor::debounce(
        Duration::from_millis(100),
        TokioScheduler::current().unwrap(),
        action,
    )
    .unwrap();

    governor.trigger(1);
    sleep(Duration::from_millis(50)).await;
    assert!(governor.cancel());
    sleep(Duration::from_millis(500)).await;

    assert!(log.lock().is_empty());
    // Cancel with nothing scheduled is a no-op
    assert!(!governor.cancel());
}

#[tokio::test(start_paused = true)]
async fn test_throttle_cancel_drops_trailing() {
    let start = Instant::now();
    let (log, action) = recording_action(start);
    let governor = Governor::throttle(
        Duration::from_millis(100),
        TokioScheduler::current().unwrap(),
        action,
    )
    .unwrap();

    governor.trigger(0);
    sleep_until(start + Duration::from_millis(20)).await;
    governor.trigger(20);
    assert!(governor.is_pending());
    assert!(governor.cancel());

    sleep(Duration::from_millis(500)).await;
    assert_timeline(&log.lock(), &[(0, 0)]);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_survives_panicking_trailing_invocation() {
    let start = Instant::now();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let governor = Governor::throttle(
        Duration::from_millis(100),
        TokioScheduler::current().unwrap(),
        move |args: u64| {
            let at = Instant::now().duration_since(start).as_millis() as u64;
            sink.lock().push((at, args));
            if args == 1 {
                panic!("trailing failure");
            }
        },
    )
    .unwrap();

    governor.trigger(0);
    sleep_until(start + Duration::from_millis(20)).await;
    governor.trigger(1);

    // The trailing call panics inside the spawned timer task at t=100
    sleep_until(start + Duration::from_millis(250)).await;
    assert_eq!(governor.state(), GovernorState::Idle);
    assert!(!governor.is_pending());

    governor.trigger(2);
    sleep_until(start + Duration::from_millis(260)).await;
    governor.trigger(3);
    sleep(Duration::from_millis(1_000)).await;

    assert_timeline(&log.lock(), &[(0, 0), (100, 1), (250, 2), (350, 3)]);
    assert_eq!(governor.invocations(), 4);
}
