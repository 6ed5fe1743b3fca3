//! Cache-status polling on tokio's paused clock.

mod common;

use std::time::Duration;

use common::FakeGateway;
use polyadmin_workflow::{CachePoller, PollEnd, PollerConfig};
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn stops_after_done_and_tracks_percentage() {
    let gateway = FakeGateway::new();
    gateway.push_status(r#"{"k": {"state": "PROCESSING", "percent": 40}}"#);
    gateway.push_status(r#"{"k": {"state": "PROCESSING", "percent": 75}}"#);
    gateway.push_status(r#"{"k": {"state": "DONE", "percent": 100}}"#);

    let root = CancellationToken::new();
    let poller = CachePoller::start(gateway.clone(), PollerConfig::default(), &root);
    let mut progress = poller.progress();

    let mut seen = Vec::new();
    for _ in 0..3 {
        progress.changed().await.unwrap();
        seen.push(progress.borrow_and_update().percentage);
    }
    assert_eq!(seen, [Some(40.0), Some(75.0), Some(100.0)]);

    assert_eq!(poller.finished().await, Some(PollEnd::Done));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(gateway.count("get_event_cache_status"), 3);
    assert_eq!(poller.progress().borrow().state_class(), "done");
}

#[tokio::test(start_paused = true)]
async fn first_query_waits_one_interval() {
    let gateway = FakeGateway::new();
    gateway.push_status(r#"{"k": {"state": "DONE", "percent": 100}}"#);

    let root = CancellationToken::new();
    let poller = CachePoller::start(gateway.clone(), PollerConfig::default(), &root);

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert_eq!(gateway.count("get_event_cache_status"), 0);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(gateway.count("get_event_cache_status"), 1);
    assert_eq!(poller.finished().await, Some(PollEnd::Done));
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_polling() {
    let gateway = FakeGateway::new();
    for _ in 0..10 {
        gateway.push_status(r#"{"k": {"state": "PROCESSING", "percent": 10}}"#);
    }

    let root = CancellationToken::new();
    let poller = CachePoller::start(gateway.clone(), PollerConfig::default(), &root);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    root.cancel();

    assert_eq!(poller.finished().await, Some(PollEnd::Cancelled));
    assert_eq!(gateway.count("get_event_cache_status"), 2);
}

#[tokio::test(start_paused = true)]
async fn errors_back_off_and_eventually_give_up() {
    let gateway = FakeGateway::new();
    // an empty script answers every query with a transport failure
    let config = PollerConfig {
        max_failures: 4,
        ..Default::default()
    };

    let root = CancellationToken::new();
    let poller = CachePoller::start(gateway.clone(), config, &root);

    // queries at t = 1, 3, 7 and 15 seconds
    tokio::time::sleep(Duration::from_millis(7500)).await;
    assert_eq!(gateway.count("get_event_cache_status"), 3);

    assert_eq!(poller.finished().await, Some(PollEnd::GaveUp));
    assert_eq!(gateway.count("get_event_cache_status"), 4);
    assert_eq!(poller.percentage(), None);
}

#[tokio::test(start_paused = true)]
async fn a_good_answer_resets_the_backoff() {
    let gateway = FakeGateway::new();
    gateway.push_status_failure();
    gateway.push_status_failure();
    gateway.push_status(r#"{"k": {"state": "PROCESSING", "percent": 5}}"#);
    gateway.push_status(r#"{"k": {"state": "DONE", "percent": 100}}"#);

    let root = CancellationToken::new();
    let poller = CachePoller::start(gateway.clone(), PollerConfig::default(), &root);

    // failures at t = 1 and 3, success at t = 7, done one interval later
    tokio::time::sleep(Duration::from_millis(7500)).await;
    assert_eq!(poller.percentage(), Some(5.0));

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(poller.finished().await, Some(PollEnd::Done));
    assert_eq!(gateway.count("get_event_cache_status"), 4);
}
