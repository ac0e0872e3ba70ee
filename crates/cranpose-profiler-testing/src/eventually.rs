//! Asynchronous matchers that wait for a render condition.
//!
//! Each one checks its condition immediately, then re-checks after every
//! render until it holds, overshoots, or `options.timeout` elapses. An
//! overshoot fails at once instead of waiting out the timeout.

use crate::format::{millis, times, with_history};
use crate::matcher::{profiled, MatchResult};
use cranpose_profiler::{
    ProfileBundle, ProfiledComponent, Progress, RenderPhase, RenderQuery, WaitOptions, WaitOutcome,
};
use std::any::Any;
use std::cmp::Ordering;

fn exactly(actual: usize, target: usize) -> Progress {
    match actual.cmp(&target) {
        Ordering::Less => Progress::Pending,
        Ordering::Equal => Progress::Met,
        Ordering::Greater => Progress::Exceeded,
    }
}

async fn eventually(
    received: &dyn Any,
    options: WaitOptions,
    operation: &'static str,
    goal: String,
    observed: impl Fn(&ProfiledComponent) -> String,
    check: impl Fn(&ProfileBundle) -> Progress + 'static,
) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component.clone(),
        Err(result) => return result,
    };
    let name = component.name();
    let wait = match component.wait_for(options.timeout, operation, check) {
        Ok(wait) => wait,
        Err(err) => return MatchResult::invalid(format!("cannot wait for {name} to {goal}: {err}")),
    };

    let outcome = wait.await;
    let actual = observed(&component);
    let result = match outcome {
        WaitOutcome::Met(_) => MatchResult::pass(with_history(
            format!("expected {name} not to eventually {goal}, but {actual}"),
            &component,
        )),
        WaitOutcome::Exceeded(_) => MatchResult::fail(with_history(
            format!("expected {name} to eventually {goal}, but {actual}, past the target"),
            &component,
        )),
        WaitOutcome::TimedOut(_) => MatchResult::fail(with_history(
            format!(
                "expected {name} to {goal} within {}, but {actual}",
                millis(options.timeout)
            ),
            &component,
        )),
    };
    log::debug!("{operation} for {name} finished (pass: {})", result.pass);
    result.with_actual(actual).with_expected(goal)
}

fn rendered(component: &ProfiledComponent) -> String {
    format!("it rendered {}", times(component.render_count()))
}

pub async fn to_eventually_render_times(
    received: &dyn Any,
    target: usize,
    options: WaitOptions,
) -> MatchResult {
    eventually(
        received,
        options,
        "wait for render count",
        format!("render {}", times(target)),
        rendered,
        move |bundle| exactly(bundle.render_count(), target),
    )
    .await
}

pub async fn to_eventually_render_at_least(
    received: &dyn Any,
    target: usize,
    options: WaitOptions,
) -> MatchResult {
    eventually(
        received,
        options,
        "wait for minimum render count",
        format!("render at least {}", times(target)),
        rendered,
        move |bundle| {
            if bundle.render_count() >= target {
                Progress::Met
            } else {
                Progress::Pending
            }
        },
    )
    .await
}

/// Waits for exactly `target` renders after the last snapshot.
pub async fn to_eventually_rerender(
    received: &dyn Any,
    target: usize,
    options: WaitOptions,
) -> MatchResult {
    eventually(
        received,
        options,
        "wait for rerenders",
        format!("rerender {} since the snapshot", times(target)),
        |component| {
            format!(
                "it rerendered {} since the snapshot",
                times(component.renders_since_snapshot())
            )
        },
        move |bundle| exactly(bundle.renders_since_snapshot(), target),
    )
    .await
}

/// Waits until a render with `phase` has been recorded.
pub async fn to_eventually_reach_phase(
    received: &dyn Any,
    phase: RenderPhase,
    options: WaitOptions,
) -> MatchResult {
    eventually(
        received,
        options,
        "wait for render phase",
        format!("reach phase {phase}"),
        |component| match component.last_render() {
            Some(record) => format!("its last render was #{} {}", record.ordinal, record.phase),
            None => "it never rendered".to_string(),
        },
        move |bundle| {
            if bundle.phase_count(phase) > 0 {
                Progress::Met
            } else {
                Progress::Pending
            }
        },
    )
    .await
}

#[cfg(test)]
#[path = "tests/eventually_tests.rs"]
mod tests;
