use super::*;
use cranpose_profiler::{CommitInfo, ComponentRegistry};
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{sleep, Instant};

struct Feed;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn mounted_feed() -> ProfiledComponent {
    let feed = ProfiledComponent::new_in(Rc::new(ComponentRegistry::new()), Rc::new(Feed));
    feed.record_commit(CommitInfo::mount()).expect("mount");
    feed
}

#[test]
fn satisfied_condition_resolves_on_first_poll() {
    let feed = mounted_feed();
    let mut cx = Context::from_waker(futures_task::noop_waker_ref());

    let matcher = pin!(to_eventually_render_times(&feed, 1, WaitOptions::default()));
    match matcher.poll(&mut cx) {
        Poll::Ready(result) => assert!(result.pass, "{}", result.message),
        Poll::Pending => panic!("already satisfied condition should not wait"),
    }
}

#[test]
fn overshoot_fails_without_waiting() {
    let feed = mounted_feed();
    feed.record_commit(CommitInfo::update()).expect("update");
    feed.record_commit(CommitInfo::update()).expect("update");
    let mut cx = Context::from_waker(futures_task::noop_waker_ref());

    let matcher = pin!(to_eventually_render_times(&feed, 2, WaitOptions::default()));
    match matcher.poll(&mut cx) {
        Poll::Ready(result) => {
            assert!(!result.pass);
            assert!(result.message.contains("past the target"), "{}", result.message);
            assert_eq!(result.actual.as_deref(), Some("it rendered 3 times"));
        }
        Poll::Pending => panic!("overshoot should fail immediately"),
    }
}

#[test]
fn invalid_timeout_is_an_invalid_result() {
    let feed = mounted_feed();
    let mut cx = Context::from_waker(futures_task::noop_waker_ref());

    let matcher = pin!(to_eventually_render_times(
        &feed,
        5,
        WaitOptions::with_timeout(Duration::ZERO)
    ));
    match matcher.poll(&mut cx) {
        Poll::Ready(result) => {
            assert!(result.invalid);
            assert!(result.message.contains("timeout"), "{}", result.message);
        }
        Poll::Pending => panic!("validation happens before waiting"),
    }
}

#[test]
fn non_profiled_value_is_rejected() {
    let mut cx = Context::from_waker(futures_task::noop_waker_ref());
    let not_a_component = "Feed";

    let matcher = pin!(to_eventually_reach_phase(
        &not_a_component,
        RenderPhase::Mount,
        WaitOptions::default()
    ));
    match matcher.poll(&mut cx) {
        Poll::Ready(result) => assert!(result.invalid),
        Poll::Pending => panic!("capability check happens before waiting"),
    }
}

#[tokio::test(start_paused = true)]
async fn waits_for_renders_to_arrive() {
    let feed = mounted_feed();
    let driver = async {
        for _ in 0..3 {
            sleep(ms(20)).await;
            feed.record_commit(CommitInfo::update()).expect("update");
        }
    };

    let (result, ()) = tokio::join!(
        to_eventually_render_at_least(&feed, 3, WaitOptions::with_timeout(ms(500))),
        driver
    );

    assert!(result.pass, "{}", result.message);
}

#[tokio::test(start_paused = true)]
async fn timeout_message_includes_history() {
    let feed = mounted_feed();
    let started = Instant::now();

    let result = to_eventually_render_times(&feed, 4, WaitOptions::with_timeout(ms(300))).await;

    assert!(started.elapsed() >= ms(300));
    assert!(!result.pass);
    assert!(
        result.message.contains("to render 4 times within 300ms, but it rendered 1 time"),
        "{}",
        result.message
    );
    assert!(result.message.contains("#1 mount"), "{}", result.message);
}

#[tokio::test(start_paused = true)]
async fn rerender_counts_from_the_snapshot() {
    let feed = mounted_feed();
    feed.snapshot();
    let driver = async {
        sleep(ms(10)).await;
        feed.record_commit(CommitInfo::update()).expect("update");
        sleep(ms(10)).await;
        feed.record_commit(CommitInfo::nested_update()).expect("nested");
    };

    let (result, ()) = tokio::join!(
        to_eventually_rerender(&feed, 2, WaitOptions::with_timeout(ms(200))),
        driver
    );

    assert!(result.pass, "{}", result.message);
}

#[tokio::test(start_paused = true)]
async fn reaching_a_phase() {
    let feed = mounted_feed();
    let driver = async {
        sleep(ms(10)).await;
        feed.record_commit(CommitInfo::update()).expect("update");
        sleep(ms(10)).await;
        feed.record_commit(CommitInfo::nested_update()).expect("nested");
    };

    let (result, ()) = tokio::join!(
        to_eventually_reach_phase(&feed, RenderPhase::NestedUpdate, WaitOptions::default()),
        driver
    );

    assert!(result.pass, "{}", result.message);
    assert_eq!(result.actual.as_deref(), Some("its last render was #3 nested-update"));
}
