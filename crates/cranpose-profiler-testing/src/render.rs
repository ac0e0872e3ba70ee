//! Synchronous render-count and phase matchers.

use crate::format::{millis, times, with_history};
use crate::matcher::{profiled, MatchResult};
use cranpose_profiler::{RenderPhase, RenderQuery};
use std::any::Any;
use std::time::Duration;

pub fn to_have_rendered(received: &dyn Any) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let count = component.render_count();
    let result = if count > 0 {
        MatchResult::pass(with_history(
            format!("expected {name} not to have rendered, but it rendered {}", times(count)),
            component,
        ))
    } else {
        MatchResult::fail(format!("expected {name} to have rendered, but it never rendered"))
    };
    result.with_actual(count)
}

pub fn to_have_rendered_times(received: &dyn Any, expected: usize) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let count = component.render_count();
    let message = if count == expected {
        format!("expected {name} not to have rendered {}, but it did", times(expected))
    } else {
        format!(
            "expected {name} to have rendered {}, but it rendered {}",
            times(expected),
            times(count)
        )
    };
    MatchResult::from_check(count == expected, with_history(message, component))
        .with_actual(count)
        .with_expected(expected)
}

pub fn to_have_mounted_once(received: &dyn Any) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let mounts = component.phase_count(RenderPhase::Mount);
    let message = if mounts == 1 {
        format!("expected {name} not to have mounted exactly once, but it did")
    } else {
        format!("expected {name} to have mounted once, but it mounted {}", times(mounts))
    };
    MatchResult::from_check(mounts == 1, with_history(message, component))
        .with_actual(mounts)
        .with_expected(1)
}

pub fn to_have_never_mounted(received: &dyn Any) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let mounted = component.has_mounted();
    let message = if mounted {
        format!("expected {name} never to have mounted, but it mounted")
    } else {
        format!("expected {name} to have mounted, but it never did")
    };
    MatchResult::from_check(!mounted, with_history(message, component))
}

/// Passes when the only render so far is the mount.
pub fn to_have_only_mounted(received: &dyn Any) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let count = component.render_count();
    let pass = count == 1 && component.has_mounted();
    let message = if pass {
        format!("expected {name} to have rendered beyond its mount, but it only mounted")
    } else if count == 0 {
        format!("expected {name} to have only mounted, but it never rendered")
    } else {
        let updates = count - component.phase_count(RenderPhase::Mount);
        format!(
            "expected {name} to have only mounted, but it also updated {}",
            times(updates)
        )
    };
    MatchResult::from_check(pass, with_history(message, component))
}

/// Passes when every render since the last snapshot is an update.
///
/// A component always mounts first, so take the snapshot after the mount;
/// without one the whole history is checked and the mount makes it fail.
pub fn to_have_only_updated(received: &dyn Any) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let history = component.render_history();
    let since = component.checkpoint().unwrap_or(0).min(history.len());
    let recent = &history[since..];
    let mounts = recent
        .iter()
        .filter(|record| record.phase == RenderPhase::Mount)
        .count();
    let pass = !recent.is_empty() && mounts == 0;
    let message = if pass {
        format!(
            "expected {name} not to have only updated, but all {} renders since the snapshot \
             were updates",
            recent.len()
        )
    } else if recent.is_empty() {
        format!("expected {name} to have updated, but it has not rendered since the snapshot")
    } else {
        format!(
            "expected {name} to have only updated, but it mounted {} since the snapshot",
            times(mounts)
        )
    };
    MatchResult::from_check(pass, with_history(message, component))
}

pub fn to_have_last_rendered_with_phase(received: &dyn Any, phase: RenderPhase) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let last = component.last_render().map(|record| record.phase);
    let actual = last.map_or_else(|| "no render".to_string(), |phase| phase.to_string());
    let pass = last == Some(phase);
    let message = if pass {
        format!("expected {name} not to have last rendered with phase {phase}, but it did")
    } else {
        format!("expected {name} to have last rendered with phase {phase}, but got {actual}")
    };
    MatchResult::from_check(pass, with_history(message, component))
        .with_actual(actual)
        .with_expected(phase)
}

/// Passes when at least one render happened since the last snapshot.
pub fn to_have_rerendered(received: &dyn Any) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let since = component.renders_since_snapshot();
    let message = if since > 0 {
        format!(
            "expected {name} not to have rerendered, but it rendered {} since the snapshot",
            times(since)
        )
    } else {
        format!("expected {name} to have rerendered, but it has not rendered since the snapshot")
    };
    MatchResult::from_check(since > 0, with_history(message, component)).with_actual(since)
}

pub fn to_have_rerendered_times(received: &dyn Any, expected: usize) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let since = component.renders_since_snapshot();
    let message = if since == expected {
        format!(
            "expected {name} not to have rerendered {} since the snapshot, but it did",
            times(expected)
        )
    } else {
        format!(
            "expected {name} to have rerendered {} since the snapshot, but it rerendered {}",
            times(expected),
            times(since)
        )
    };
    MatchResult::from_check(since == expected, with_history(message, component))
        .with_actual(since)
        .with_expected(expected)
}

/// Passes when every recorded render's actual duration is at most `max`.
///
/// A component that never rendered fails: there is nothing to bound.
pub fn to_render_within(received: &dyn Any, max: Duration) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let Some(slowest) = component.slowest_render() else {
        return MatchResult::fail(format!(
            "expected {name} to render within {}, but it never rendered",
            millis(max)
        ))
        .with_expected(millis(max));
    };
    let pass = slowest.actual_duration <= max;
    let message = if pass {
        format!(
            "expected {name} to exceed {} on some render, but the slowest render #{} took {}",
            millis(max),
            slowest.ordinal,
            millis(slowest.actual_duration)
        )
    } else {
        let over = component
            .render_history()
            .iter()
            .filter(|record| record.actual_duration > max)
            .count();
        format!(
            "expected {name} to render within {}, but {} over budget; slowest was render #{} \
             ({}) at {}",
            millis(max),
            if over == 1 { "1 render was".to_string() } else { format!("{over} renders were") },
            slowest.ordinal,
            slowest.phase,
            millis(slowest.actual_duration)
        )
    };
    MatchResult::from_check(pass, with_history(message, component))
        .with_actual(millis(slowest.actual_duration))
        .with_expected(millis(max))
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
