// Monitor scheduling: steady interval after success, retry interval after
// failure. All tests run on a paused clock.

mod common;

use common::*;
use omniwatch::engine::Platform;
use omniwatch::error::ReconcileError;
use omniwatch::monitor::Monitor;
use omniwatch::state::Dimension;
use tokio::time::{timeout, Duration};

const STEADY: Duration = Duration::from_secs(30);
const RETRY: Duration = Duration::from_secs(10);

#[tokio::test(start_paused = true)]
async fn test_not_installed_schedules_retry() {
    let runner = FakeRunner::new();
    let (reconciler, _rx) = build(&test_config(), runner, FakeProbe::healthy(), Platform::Linux);
    let mut monitor = Monitor::new(reconciler, STEADY, RETRY);

    assert_eq!(monitor.startup().await, RETRY);
    let outcome = monitor.last_outcome().expect("outcome recorded");
    assert_eq!(outcome.failed_dimension, Some(Dimension::EngineInstalled));
}

#[tokio::test(start_paused = true)]
async fn test_killed_compose_schedules_retry() {
    let runner = FakeRunner::new();
    engine_ready(&runner);
    runner.on(COMPOSE_UP, Script::code(137));
    let (reconciler, _rx) = build(&test_config(), runner, FakeProbe::down(), Platform::Linux);
    let mut monitor = Monitor::new(reconciler, STEADY, RETRY);

    assert_eq!(monitor.startup().await, RETRY);
    assert_eq!(
        monitor.last_outcome().and_then(|o| o.error.clone()),
        Some(ReconcileError::ComposeFailed(137))
    );
}

#[tokio::test(start_paused = true)]
async fn test_healthy_steps_skip_reconcile() {
    let runner = FakeRunner::new();
    engine_ready(&runner);
    runner.on(COMPOSE_RESTART, Script::ok());
    let (reconciler, _rx) = build(&test_config(), runner.clone(), FakeProbe::healthy(), Platform::Linux);
    let mut monitor = Monitor::new(reconciler, STEADY, RETRY);

    assert_eq!(monitor.startup().await, STEADY);
    let commands = runner.commands().len();

    for _ in 0..3 {
        assert_eq!(monitor.step().await, STEADY);
    }
    assert_eq!(runner.commands().len(), commands);
}

#[tokio::test(start_paused = true)]
async fn test_unhealthy_step_reconciles() {
    let runner = FakeRunner::new();
    engine_ready(&runner);
    runner
        .on(COMPOSE_RESTART, Script::ok())
        .on(COMPOSE_UP, Script::code(137));
    let probe = FakeProbe::healthy();
    let (reconciler, _rx) = build(&test_config(), runner.clone(), probe.clone(), Platform::Linux);
    let mut monitor = Monitor::new(reconciler, STEADY, RETRY);

    assert_eq!(monitor.startup().await, STEADY);

    probe.set_healthy(false);
    assert_eq!(monitor.step().await, RETRY);
    assert_eq!(runner.count(VERSION), 2);
    assert_eq!(runner.count(COMPOSE_UP), 1);

    probe.set_healthy(true);
    assert_eq!(monitor.step().await, STEADY);
    assert_eq!(runner.count(VERSION), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_platform_keeps_retrying() {
    let runner = FakeRunner::new();
    runner
        .on(VERSION, Script::stdout("Docker version 27.3.1\n"))
        .on(INFO, Script::failing(1, "Cannot connect to the Docker daemon"));
    let (reconciler, _rx) = build(&test_config(), runner, FakeProbe::down(), Platform::Windows);
    let mut monitor = Monitor::new(reconciler, STEADY, RETRY);

    assert_eq!(monitor.startup().await, RETRY);
    assert_eq!(monitor.step().await, RETRY);
    assert_eq!(
        monitor.last_outcome().and_then(|o| o.error.clone()),
        Some(ReconcileError::UnsupportedPlatform("windows".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_spaces_failed_passes_by_retry_interval() {
    let runner = FakeRunner::new();
    engine_ready(&runner);
    runner.on(COMPOSE_UP, Script::code(137));
    let (reconciler, _rx) = build(&test_config(), runner.clone(), FakeProbe::down(), Platform::Linux);
    let mut monitor = Monitor::new(reconciler, STEADY, RETRY);

    // run() never returns; stop it after three retries
    let _ = timeout(Duration::from_secs(35), monitor.run()).await;

    let times = runner.call_times(VERSION);
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], RETRY);
    }
}
