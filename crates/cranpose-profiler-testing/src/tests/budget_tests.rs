use super::*;
use cranpose_profiler::{CommitInfo, ComponentRegistry, ProfiledComponent};
use std::rc::Rc;

struct Sidebar;

fn sidebar_with_updates(updates: usize) -> ProfiledComponent {
    let sidebar = ProfiledComponent::new_in(Rc::new(ComponentRegistry::new()), Rc::new(Sidebar));
    sidebar.record_commit(CommitInfo::mount()).expect("mount");
    for _ in 0..updates {
        sidebar.record_commit(CommitInfo::update()).expect("update");
    }
    sidebar
}

#[test]
fn within_budget_passes_with_summary() {
    let sidebar = sidebar_with_updates(2);
    let result = to_meet_render_count_budget(&sidebar, &RenderBudget::new().max_renders(3));

    assert!(result.pass);
    assert!(result.message.contains("Total renders: 3 (budget: 3)"), "{}", result.message);
    assert_eq!(result.expected.as_deref(), Some("Total renders: at most 3"));
}

#[test]
fn every_violation_is_listed() {
    let sidebar = sidebar_with_updates(4);
    sidebar
        .record_commit(CommitInfo::nested_update())
        .expect("nested");
    let budget = RenderBudget::new()
        .max_renders(3)
        .max_mounts(1)
        .max_updates(2);

    let result = to_meet_render_count_budget(&sidebar, &budget);

    assert!(!result.pass);
    assert!(result.message.contains("Total renders: 6 (budget: 3)"), "{}", result.message);
    assert!(result.message.contains("Updates: 5 (budget: 2)"), "{}", result.message);
    assert!(!result.message.contains("Mounts: 1"), "{}", result.message);
    assert_eq!(
        result.expected.as_deref(),
        Some("Total renders: at most 3, Mounts: at most 1, Updates: at most 2")
    );
}

#[test]
fn component_name_overrides_the_type_name() {
    let sidebar = sidebar_with_updates(1);
    let budget = RenderBudget::new().max_updates(0).component_name("NavSidebar");

    let result = to_meet_render_count_budget(&sidebar, &budget);

    assert!(!result.pass);
    assert!(result.message.starts_with("expected NavSidebar"), "{}", result.message);
}

#[test]
fn empty_budget_is_invalid() {
    let sidebar = sidebar_with_updates(0);
    let result = to_meet_render_count_budget(&sidebar, &RenderBudget::new());

    assert!(result.invalid);
    assert!(!result.clone().negate().pass);
    assert!(result.message.contains("at least one"));
}
