use crate::phase::RenderPhase;
use std::time::Duration;

/// Errors raised by the profiler core.
///
/// Assertion mismatches are not errors; they are reported through the
/// matcher results of `cranpose-profiler-testing`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfilerError {
    #[error("invalid {name}: {value} ({reason})")]
    InvalidOption {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error(
        "debounce ({}ms) must be less than timeout ({}ms)",
        .debounce.as_millis(),
        .timeout.as_millis()
    )]
    DebounceNotBelowTimeout { debounce: Duration, timeout: Duration },

    #[error(
        "{component}: {phase} reported as render #{} but {}",
        .count + 1,
        phase_order_reason(.phase, .count)
    )]
    PhaseOrder {
        component: String,
        phase: RenderPhase,
        count: usize,
    },

    #[error(
        "infinite render loop detected in {component}: exceeded {limit} renders. \
         This usually means an effect updates state unconditionally on every render."
    )]
    InfiniteLoop { component: String, limit: usize },

    #[error(
        "memory leak detected in {component}: more than {limit} render listeners registered. \
         Unsubscribe listeners that are no longer needed."
    )]
    MemoryLeak { component: String, limit: usize },

    #[error(
        "{operation} timed out after {}ms ({render_count} renders: {history})",
        .timeout.as_millis()
    )]
    Timeout {
        operation: &'static str,
        timeout: Duration,
        render_count: usize,
        history: String,
    },
}

fn phase_order_reason(phase: &RenderPhase, count: &usize) -> &'static str {
    match (*phase, *count) {
        (RenderPhase::Mount, _) => "the component already mounted",
        (_, 0) => "the first render must be a mount",
        _ => "the phase sequence is invalid",
    }
}

impl ProfilerError {
    /// True for the circuit-breaker errors that signal a bug in the component.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProfilerError::InfiniteLoop { .. } | ProfilerError::MemoryLeak { .. }
        )
    }
}
