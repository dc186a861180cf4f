mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Call, FakeGateway, FakeSink, Journal, cycle, record};
use notipoll_client::{Monitor, MonitorSettings};
use tokio::time::{Instant, sleep};

fn settings(project: &str, secs: u64) -> MonitorSettings {
    MonitorSettings {
        project: project.into(),
        interval: Duration::from_secs(secs),
    }
}

fn monitor(gw: &Arc<FakeGateway>, journal: &Arc<Journal>, s: MonitorSettings) -> Monitor {
    Monitor::new(cycle(gw.clone(), FakeSink::new(journal.clone())), s)
}

async fn wait_for_exit(m: &Monitor) {
    while m.active_loops() > 0 {
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn polls_immediately_then_once_per_interval() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()));
    let m = monitor(&gw, &journal, settings("demo", 5));

    assert!(m.start().await);
    sleep(Duration::from_secs(12)).await;

    // t = 0, 5, 10
    assert_eq!(journal.fetches(), 3);
    assert!(m.is_running().await);
    m.stop().await;
}

#[tokio::test(start_paused = true)]
async fn concurrent_starts_spawn_one_loop() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()));
    let m = monitor(&gw, &journal, settings("", 5));

    let (a, b) = tokio::join!(m.start(), m.start());
    assert!(a ^ b, "exactly one start should win");
    assert_eq!(m.active_loops(), 1);

    sleep(Duration::from_secs(12)).await;
    assert_eq!(journal.fetches(), 3);
    assert!(m.stop().await);
    wait_for_exit(&m).await;
}

#[tokio::test(start_paused = true)]
async fn repeated_start_is_ignored() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()));
    let m = monitor(&gw, &journal, settings("", 5));

    assert!(m.start().await);
    assert!(!m.start().await);
    assert!(!m.start().await);
    assert_eq!(m.active_loops(), 1);

    sleep(Duration::from_secs(7)).await;
    assert_eq!(journal.fetches(), 2);
    m.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_when_idle_is_a_no_op() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()));
    let m = monitor(&gw, &journal, settings("", 5));

    assert!(!m.stop().await);
    assert!(!m.is_running().await);
    assert_eq!(m.active_loops(), 0);
    assert!(journal.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_ends_the_loop_without_waiting_out_the_interval() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()));
    let m = monitor(&gw, &journal, settings("", 60));

    assert!(m.start().await);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(journal.fetches(), 1);

    let t0 = Instant::now();
    assert!(m.stop().await);
    wait_for_exit(&m).await;
    assert!(t0.elapsed() < Duration::from_secs(1));
    assert!(!m.is_running().await);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(journal.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn start_then_stop_immediately_terminates() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()));
    let m = monitor(&gw, &journal, settings("", 60));

    assert!(m.start().await);
    assert!(m.stop().await);
    let t0 = Instant::now();
    wait_for_exit(&m).await;
    assert!(t0.elapsed() < Duration::from_secs(60));
    assert!(journal.fetches() <= 1);
}

#[tokio::test(start_paused = true)]
async fn cycle_in_flight_completes_after_stop() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(
        FakeGateway::new(journal.clone())
            .with_records(vec![record("7", "deploy", "done")])
            .slow_fetch(Duration::from_secs(2)),
    );
    let m = monitor(&gw, &journal, settings("", 60));

    assert!(m.start().await);
    sleep(Duration::from_millis(500)).await;
    assert_eq!(gw.in_flight(), 1);

    assert!(m.stop().await);
    assert!(!m.is_running().await);
    assert_eq!(m.active_loops(), 1, "loop still finishing its cycle");

    wait_for_exit(&m).await;
    assert_eq!(journal.acks(), vec!["7"]);
    assert_eq!(journal.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn restart_waits_for_the_stopped_loop_to_drain() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(
        FakeGateway::new(journal.clone())
            .with_records(vec![record("7", "deploy", "done")])
            .slow_fetch(Duration::from_secs(2)),
    );
    let m = monitor(&gw, &journal, settings("", 60));

    assert!(m.start().await);
    sleep(Duration::from_millis(500)).await;
    assert!(m.stop().await);
    let restart = {
        let m = m.clone();
        tokio::spawn(async move { m.start().await })
    };

    sleep(Duration::from_millis(500)).await;
    assert_eq!(m.active_loops(), 1);
    assert_eq!(gw.in_flight(), 1);

    assert!(restart.await.unwrap());
    assert_eq!(journal.acks(), vec!["7"]);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(journal.fetches(), 2);
    assert_eq!(m.active_loops(), 1);
    assert_eq!(gw.peak_in_flight(), 1);
    m.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test(start_paused = true)]
async fn fetch_errors_do_not_stop_the_loop() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()).failing_fetch(500));
    let m = monitor(&gw, &journal, settings("", 5));

    assert!(m.start().await);
    sleep(Duration::from_secs(12)).await;
    assert_eq!(journal.fetches(), 3);
    assert!(m.is_running().await);
    m.stop().await;
}

#[tokio::test(start_paused = true)]
async fn manual_test_leaves_run_state_alone() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()).with_records(vec![record("1", "t", "b")]));
    let m = monitor(&gw, &journal, settings("demo", 5));

    let outcome = m.trigger_test().await.unwrap();
    assert_eq!(outcome.acknowledged(), 1);
    assert!(!m.is_running().await);
    assert_eq!(m.active_loops(), 0);
    assert_eq!(journal.calls()[0], Call::Fetch("demo".into()));
}

#[tokio::test(start_paused = true)]
async fn concurrent_manual_tests_both_finish() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(
        FakeGateway::new(journal.clone())
            .with_records(vec![record("1", "t", "b")])
            .slow_fetch(Duration::from_millis(100)),
    );
    let m = monitor(&gw, &journal, settings("", 5));

    let (a, b) = tokio::join!(m.trigger_test(), m.trigger_test());
    assert_eq!(a.unwrap().acknowledged(), 1);
    assert_eq!(b.unwrap().acknowledged(), 1);
    // Both fetched before either acknowledged, so the record is shown twice.
    assert_eq!(journal.shows(), 2);
}

#[tokio::test(start_paused = true)]
async fn manual_test_may_overlap_a_scheduled_cycle() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()).slow_fetch(Duration::from_secs(2)));
    let m = monitor(&gw, &journal, settings("", 60));

    assert!(m.start().await);
    let test = m.trigger_test();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(gw.in_flight(), 2);

    test.await.unwrap();
    m.shutdown(Duration::from_secs(5)).await;
    assert_eq!(m.active_loops(), 0);
}

#[tokio::test(start_paused = true)]
async fn reconfigure_applies_on_next_start() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()));
    let m = monitor(&gw, &journal, settings("alpha", 5));

    assert!(m.start().await);
    sleep(Duration::from_secs(1)).await;
    m.reconfigure(
        settings("beta", 5),
        cycle(gw.clone(), FakeSink::new(journal.clone())),
    );
    assert_eq!(m.settings().project, "beta");

    // The running loop keeps what it started with.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(
        journal.calls(),
        vec![Call::Fetch("alpha".into()), Call::Fetch("alpha".into())]
    );

    assert!(m.stop().await);
    wait_for_exit(&m).await;
    assert!(m.start().await);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(journal.calls().last(), Some(&Call::Fetch("beta".into())));
    m.stop().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_the_current_cycle() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(
        FakeGateway::new(journal.clone())
            .with_records(vec![record("9", "t", "b")])
            .slow_fetch(Duration::from_secs(2)),
    );
    let m = monitor(&gw, &journal, settings("", 60));

    assert!(m.start().await);
    sleep(Duration::from_millis(500)).await;
    m.shutdown(Duration::from_secs(3)).await;

    assert_eq!(m.active_loops(), 0);
    assert!(!m.is_running().await);
    assert_eq!(journal.acks(), vec!["9"]);
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_runs_a_fresh_loop() {
    let journal = Arc::new(Journal::default());
    let gw = Arc::new(FakeGateway::new(journal.clone()));
    let m = monitor(&gw, &journal, settings("", 5));

    assert!(m.start().await);
    sleep(Duration::from_secs(1)).await;
    assert!(m.stop().await);
    wait_for_exit(&m).await;

    assert!(m.start().await);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(m.active_loops(), 1);
    assert_eq!(journal.fetches(), 2);
    m.stop().await;
}
