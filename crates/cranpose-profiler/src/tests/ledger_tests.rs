use super::*;
use crate::cache::ViewCache;
use std::time::Duration;

fn ledger_with(phases: &[RenderPhase]) -> RenderLedger {
    let mut ledger = RenderLedger::new("Counter", 10_000);
    for phase in phases {
        ledger
            .append(&CommitInfo::new(*phase))
            .expect("append within ceiling");
    }
    ledger
}

#[test]
fn append_tracks_count_phases_and_mount() {
    let ledger = ledger_with(&[
        RenderPhase::Mount,
        RenderPhase::Update,
        RenderPhase::Update,
        RenderPhase::NestedUpdate,
    ]);

    assert_eq!(ledger.component(), "Counter");
    assert_eq!(ledger.count(), 4);
    assert!(ledger.has_mounted());
    assert_eq!(ledger.phase_count(RenderPhase::Mount), 1);
    assert_eq!(ledger.phase_count(RenderPhase::Update), 2);
    assert_eq!(ledger.phase_count(RenderPhase::NestedUpdate), 1);
    assert_eq!(ledger.last_phase(), Some(RenderPhase::NestedUpdate));
    let ordinals: Vec<usize> = ledger.records().iter().map(|r| r.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4]);
}

#[test]
fn count_matches_history_and_phase_sum_after_every_append() {
    let cache = ViewCache::new();
    let mut ledger = RenderLedger::new("Counter", 10_000);
    let phases = [
        RenderPhase::Mount,
        RenderPhase::Update,
        RenderPhase::NestedUpdate,
        RenderPhase::Update,
        RenderPhase::NestedUpdate,
        RenderPhase::NestedUpdate,
    ];
    for phase in phases {
        ledger.append(&CommitInfo::new(phase)).expect("append");
        cache.invalidate(phase);

        assert_eq!(ledger.count(), ledger.history(&cache).len());
        let by_phase: usize = RenderPhase::ALL
            .iter()
            .map(|phase| ledger.renders_by_phase(*phase, &cache).len())
            .sum();
        assert_eq!(by_phase, ledger.count());
    }
}

#[test]
fn phase_view_matches_naive_filter() {
    let cache = ViewCache::new();
    let ledger = ledger_with(&[
        RenderPhase::Mount,
        RenderPhase::Update,
        RenderPhase::NestedUpdate,
        RenderPhase::Update,
    ]);

    let naive: Vec<RenderRecord> = ledger
        .records()
        .iter()
        .filter(|record| record.phase == RenderPhase::Update)
        .cloned()
        .collect();
    assert_eq!(&*ledger.renders_by_phase(RenderPhase::Update, &cache), naive.as_slice());
}

#[test]
fn render_at_out_of_range_is_none() {
    let ledger = ledger_with(&[RenderPhase::Mount, RenderPhase::Update]);

    assert_eq!(ledger.render_at(0).map(|r| r.phase), Some(RenderPhase::Mount));
    assert_eq!(ledger.render_at(1).map(|r| r.phase), Some(RenderPhase::Update));
    assert!(ledger.render_at(2).is_none());
    assert!(ledger.render_at(usize::MAX).is_none());
}

#[test]
fn clear_is_idempotent() {
    let mut ledger = ledger_with(&[RenderPhase::Mount, RenderPhase::Update]);

    ledger.clear();
    assert_eq!(ledger.count(), 0);
    assert!(!ledger.has_mounted());
    assert!(ledger.last_record().is_none());

    ledger.clear();
    assert_eq!(ledger.count(), 0);

    ledger
        .append(&CommitInfo::mount())
        .expect("mount allowed again after clear");
    assert!(ledger.has_mounted());
}

#[test]
fn rejects_mount_after_history_and_update_before_mount() {
    let mut ledger = RenderLedger::new("Counter", 10);

    let err = ledger
        .append(&CommitInfo::update())
        .expect_err("update before mount");
    assert!(matches!(err, ProfilerError::PhaseOrder { count: 0, .. }));

    ledger.append(&CommitInfo::mount()).expect("mount");
    let err = ledger
        .append(&CommitInfo::mount())
        .expect_err("second mount");
    assert!(matches!(
        err,
        ProfilerError::PhaseOrder {
            phase: RenderPhase::Mount,
            count: 1,
            ..
        }
    ));
    assert_eq!(ledger.count(), 1);
}

#[test]
fn ceiling_allows_exactly_max_renders() {
    let mut ledger = RenderLedger::new("Looping", 5);
    ledger.append(&CommitInfo::mount()).expect("mount");
    for _ in 0..4 {
        ledger.append(&CommitInfo::update()).expect("below ceiling");
    }
    assert_eq!(ledger.count(), 5);

    let err = ledger
        .append(&CommitInfo::update())
        .expect_err("ceiling exceeded");
    assert_eq!(
        err,
        ProfilerError::InfiniteLoop {
            component: "Looping".to_string(),
            limit: 5,
        }
    );
    let message = err.to_string();
    assert!(message.contains("5"), "{message}");
    assert!(message.contains("effect"), "{message}");
    assert_eq!(ledger.count(), 5);
}

#[test]
fn records_keep_reported_measurements() {
    let mut ledger = RenderLedger::new("Counter", 10);
    let commit = CommitInfo::mount()
        .with_durations(Duration::from_millis(4), Duration::from_millis(6))
        .with_timestamps(Duration::from_millis(100), Duration::from_millis(104));
    let record = ledger.append(&commit).expect("mount").clone();

    assert_eq!(record.actual_duration, Duration::from_millis(4));
    assert_eq!(record.base_duration, Duration::from_millis(6));
    assert_eq!(record.start_time, Duration::from_millis(100));
    assert_eq!(record.commit_time, Duration::from_millis(104));
}
