use super::*;
use crate::config::ProfilerConfig;
use crate::phase::CommitInfo;
use std::time::Duration;
use tokio::time::{advance, sleep};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn bundle() -> Rc<ProfileBundle> {
    ProfileBundle::new("Feed", ProfilerConfig::default())
}

#[tokio::test(start_paused = true)]
async fn burst_of_renders_settles_after_debounce() {
    let bundle = bundle();
    let started = Instant::now();
    let wait = bundle
        .wait_for_stabilization(StabilizationOptions::new(ms(20), ms(200)))
        .expect("valid options");

    let driver = async {
        let commits = [CommitInfo::mount(), CommitInfo::update(), CommitInfo::update()];
        for commit in commits {
            sleep(ms(5)).await;
            bundle.record(commit).expect("record");
        }
    };
    let (result, ()) = tokio::join!(wait, driver);

    let result = result.expect("stabilized");
    assert_eq!(
        result,
        StabilizationResult {
            render_count: 3,
            last_phase: Some(RenderPhase::Update),
        }
    );
    assert!(started.elapsed() >= ms(35));
    assert!(started.elapsed() < ms(200));
    assert!(!bundle.has_listeners());
}

#[tokio::test(start_paused = true)]
async fn quiet_component_settles_with_nothing_observed() {
    let bundle = bundle();
    bundle.record(CommitInfo::mount()).expect("mount");
    let started = Instant::now();

    let result = bundle
        .wait_for_stabilization(StabilizationOptions::new(ms(30), ms(500)))
        .expect("valid options")
        .await
        .expect("stabilized");

    assert_eq!(result.render_count, 0);
    assert_eq!(result.last_phase, None);
    assert!(started.elapsed() >= ms(30));
}

#[tokio::test(start_paused = true)]
async fn continuous_renders_hit_the_timeout() {
    let bundle = bundle();
    bundle.record(CommitInfo::mount()).expect("mount");
    let wait = bundle
        .wait_for_stabilization(StabilizationOptions::new(ms(20), ms(100)))
        .expect("valid options");

    let driver = async {
        for _ in 0..30 {
            sleep(ms(10)).await;
            bundle.record(CommitInfo::update()).expect("update");
        }
    };
    let (result, ()) = tokio::join!(wait, driver);

    let err = result.expect_err("never quiet for 20ms");
    assert!(matches!(
        err,
        ProfilerError::Timeout {
            operation: "wait for stabilization",
            ..
        }
    ));
    assert!(err.to_string().contains("100ms"), "{err}");
    assert!(!bundle.has_listeners());
}

#[tokio::test(start_paused = true)]
async fn timeout_holds_when_first_polled_after_the_deadline() {
    let bundle = bundle();
    bundle.record(CommitInfo::mount()).expect("mount");
    let wait = bundle
        .wait_for_stabilization(StabilizationOptions::new(ms(20), ms(100)))
        .expect("valid options");

    for _ in 0..15 {
        advance(ms(10)).await;
        bundle.record(CommitInfo::update()).expect("update");
    }
    advance(ms(250)).await;

    let err = wait.await.expect_err("renders never paused for 20ms before 100ms");
    assert!(matches!(
        err,
        ProfilerError::Timeout {
            render_count: 9,
            ..
        }
    ));
    assert!(!bundle.has_listeners());
}

#[tokio::test(start_paused = true)]
async fn quiet_window_before_the_deadline_counts_when_polled_late() {
    let bundle = bundle();
    bundle.record(CommitInfo::mount()).expect("mount");
    let wait = bundle
        .wait_for_stabilization(StabilizationOptions::new(ms(20), ms(100)))
        .expect("valid options");

    advance(ms(10)).await;
    bundle.record(CommitInfo::update()).expect("update");
    advance(ms(50)).await;
    bundle.record(CommitInfo::nested_update()).expect("nested");
    advance(ms(200)).await;

    let result = wait.await.expect("quiet from 10ms to 60ms");
    assert_eq!(
        result,
        StabilizationResult {
            render_count: 1,
            last_phase: Some(RenderPhase::Update),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_stabilization_waits_agree() {
    let bundle = bundle();
    let options = StabilizationOptions::new(ms(15), ms(300));
    let first = bundle.wait_for_stabilization(options).expect("first");
    let second = bundle.wait_for_stabilization(options).expect("second");

    let driver = async {
        sleep(ms(5)).await;
        bundle.record(CommitInfo::mount()).expect("mount");
        sleep(ms(5)).await;
        bundle.record(CommitInfo::nested_update()).expect("nested");
    };
    let (first, second, ()) = tokio::join!(first, second, driver);

    assert_eq!(first.expect("first"), second.expect("second"));
}

#[test]
fn invalid_options_are_rejected_before_subscribing() {
    let bundle = bundle();

    let err = bundle
        .wait_for_stabilization(StabilizationOptions::new(ms(100), ms(100)))
        .expect_err("debounce equal to timeout");
    assert_eq!(
        err.to_string(),
        "debounce (100ms) must be less than timeout (100ms)"
    );

    let err = bundle
        .wait_for_stabilization(StabilizationOptions::new(Duration::ZERO, ms(100)))
        .expect_err("zero debounce");
    assert!(matches!(err, ProfilerError::InvalidOption { name: "debounce", .. }));

    let err = bundle
        .wait_for_stabilization(StabilizationOptions::new(ms(10), Duration::MAX))
        .expect_err("unbounded timeout");
    assert!(matches!(err, ProfilerError::InvalidOption { name: "timeout", .. }));

    assert!(!bundle.has_listeners());
}

#[test]
fn dropping_the_wait_unsubscribes() {
    let bundle = bundle();
    let wait = bundle
        .wait_for_stabilization(StabilizationOptions::default())
        .expect("valid options");
    assert_eq!(bundle.listener_count(), 1);

    drop(wait);
    assert_eq!(bundle.listener_count(), 0);
}
