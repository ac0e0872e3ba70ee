//! End-to-end render tracking through the public API.

use cranpose_profiler::prelude::*;
use cranpose_profiler::{ProfilerConfig, RenderEvent};
use std::cell::RefCell;
use std::rc::Rc;

struct Counter;

fn profiled_counter() -> ProfiledComponent {
    ProfiledComponent::new_in(Rc::new(ComponentRegistry::new()), Rc::new(Counter))
}

#[test]
fn mount_then_updates_are_counted_per_phase() {
    let counter = profiled_counter();
    counter.record_commit(CommitInfo::mount()).expect("mount");
    for _ in 0..3 {
        counter.record_commit(CommitInfo::update()).expect("update");
    }

    assert_eq!(counter.render_count(), 4);
    assert_eq!(counter.renders_by_phase(RenderPhase::Mount).len(), 1);
    assert_eq!(counter.renders_by_phase(RenderPhase::Update).len(), 3);
    assert_eq!(
        counter.last_render().map(|record| record.phase),
        Some(RenderPhase::Update)
    );
}

#[test]
fn listener_subscribed_after_mount_sees_later_renders_only() {
    let counter = profiled_counter();
    counter.record_commit(CommitInfo::mount()).expect("mount");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let _subscription = {
        let seen = Rc::clone(&seen);
        counter
            .on_render(move |event: &RenderEvent| seen.borrow_mut().push(event.count))
            .expect("subscribe")
    };
    counter.record_commit(CommitInfo::update()).expect("update");
    counter.record_commit(CommitInfo::update()).expect("update");

    assert_eq!(*seen.borrow(), vec![2, 3]);
}

#[test]
fn runaway_component_trips_the_render_ceiling() {
    let registry = Rc::new(ComponentRegistry::with_config(
        ProfilerConfig::default().with_max_renders(50),
    ));
    let looping = ProfiledComponent::new_in(registry, Rc::new(Counter));
    looping.record_commit(CommitInfo::mount()).expect("mount");

    let mut accepted = 1;
    let err = loop {
        match looping.record_commit(CommitInfo::update()) {
            Ok(()) => accepted += 1,
            Err(err) => break err,
        }
    };

    assert_eq!(accepted, 50);
    assert!(err.is_fatal());
    assert!(err.to_string().contains("infinite render loop"));
    assert_eq!(looping.render_count(), 50);
}

#[test]
fn views_stay_consistent_with_the_ledger() {
    let counter = profiled_counter();
    let phases = [
        RenderPhase::Mount,
        RenderPhase::Update,
        RenderPhase::NestedUpdate,
        RenderPhase::Update,
        RenderPhase::Update,
        RenderPhase::NestedUpdate,
    ];

    for phase in phases {
        counter
            .record_commit(CommitInfo::new(phase))
            .expect("record");

        let history = counter.render_history();
        assert_eq!(history.len(), counter.render_count());
        let per_phase: usize = RenderPhase::ALL
            .iter()
            .map(|phase| counter.renders_by_phase(*phase).len())
            .sum();
        assert_eq!(per_phase, counter.render_count());
        for phase in RenderPhase::ALL {
            let filtered: Vec<_> = history
                .iter()
                .filter(|record| record.phase == phase)
                .cloned()
                .collect();
            assert_eq!(&*counter.renders_by_phase(phase), filtered.as_slice());
        }
        assert!(Rc::ptr_eq(&history, &counter.render_history()));
    }
}

#[tokio::test(start_paused = true)]
async fn stabilization_after_a_burst() {
    let counter = profiled_counter();
    let wait = counter
        .wait_for_stabilization(StabilizationOptions::new(
            std::time::Duration::from_millis(20),
            std::time::Duration::from_millis(200),
        ))
        .expect("valid options");

    let driver = async {
        for commit in [CommitInfo::mount(), CommitInfo::update(), CommitInfo::nested_update()] {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            counter.record_commit(commit).expect("record");
        }
    };
    let (result, ()) = tokio::join!(wait, driver);

    let result = result.expect("stabilized");
    assert_eq!(result.render_count, 3);
    assert_eq!(result.last_phase, Some(RenderPhase::NestedUpdate));
}
