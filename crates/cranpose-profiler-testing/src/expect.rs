//! Assertion harness that panics with the matcher message on failure.
//!
//! ```ignore
//! expect(&counter).to_have_rendered_times(2);
//! expect(&counter).not().to_have_never_mounted();
//! expect(&counter).not_to_have_render_loops(LoopOptions::default());
//! ```

use crate::budget::{to_meet_render_count_budget, RenderBudget};
use crate::eventually;
use crate::loops::{not_to_have_render_loops, LoopOptions};
use crate::matcher::MatchResult;
use crate::render;
use cranpose_profiler::{RenderPhase, WaitOptions};
use std::any::Any;
use std::time::Duration;

pub fn expect(received: &dyn Any) -> Expectation<'_> {
    Expectation {
        received,
        negated: false,
    }
}

/// Pending assertion on one received value.
#[derive(Clone, Copy)]
pub struct Expectation<'a> {
    received: &'a dyn Any,
    negated: bool,
}

impl Expectation<'_> {
    /// Inverts the next assertion. Invalid input still fails.
    pub fn not(self) -> Self {
        Self {
            negated: !self.negated,
            ..self
        }
    }

    /// Applies negation and returns the result without panicking.
    pub fn evaluate(&self, result: MatchResult) -> MatchResult {
        if self.negated {
            result.negate()
        } else {
            result
        }
    }

    #[track_caller]
    fn assert(&self, result: MatchResult) {
        let result = self.evaluate(result);
        if !result.pass {
            panic!("{result}");
        }
    }

    #[track_caller]
    pub fn to_have_rendered(&self) {
        self.assert(render::to_have_rendered(self.received));
    }

    #[track_caller]
    pub fn to_have_rendered_times(&self, expected: usize) {
        self.assert(render::to_have_rendered_times(self.received, expected));
    }

    #[track_caller]
    pub fn to_have_mounted_once(&self) {
        self.assert(render::to_have_mounted_once(self.received));
    }

    #[track_caller]
    pub fn to_have_never_mounted(&self) {
        self.assert(render::to_have_never_mounted(self.received));
    }

    #[track_caller]
    pub fn to_have_only_mounted(&self) {
        self.assert(render::to_have_only_mounted(self.received));
    }

    #[track_caller]
    pub fn to_have_only_updated(&self) {
        self.assert(render::to_have_only_updated(self.received));
    }

    #[track_caller]
    pub fn to_have_last_rendered_with_phase(&self, phase: RenderPhase) {
        self.assert(render::to_have_last_rendered_with_phase(self.received, phase));
    }

    #[track_caller]
    pub fn to_have_rerendered(&self) {
        self.assert(render::to_have_rerendered(self.received));
    }

    #[track_caller]
    pub fn to_have_rerendered_times(&self, expected: usize) {
        self.assert(render::to_have_rerendered_times(self.received, expected));
    }

    #[track_caller]
    pub fn to_render_within(&self, max: Duration) {
        self.assert(render::to_render_within(self.received, max));
    }

    #[track_caller]
    pub fn not_to_have_render_loops(&self, options: LoopOptions) {
        self.assert(not_to_have_render_loops(self.received, options));
    }

    #[track_caller]
    pub fn to_meet_render_count_budget(&self, budget: &RenderBudget) {
        self.assert(to_meet_render_count_budget(self.received, budget));
    }

    pub async fn to_eventually_render_times(&self, target: usize, options: WaitOptions) {
        let result = eventually::to_eventually_render_times(self.received, target, options).await;
        self.assert(result);
    }

    pub async fn to_eventually_render_at_least(&self, target: usize, options: WaitOptions) {
        let result =
            eventually::to_eventually_render_at_least(self.received, target, options).await;
        self.assert(result);
    }

    pub async fn to_eventually_rerender(&self, target: usize, options: WaitOptions) {
        let result = eventually::to_eventually_rerender(self.received, target, options).await;
        self.assert(result);
    }

    pub async fn to_eventually_reach_phase(&self, phase: RenderPhase, options: WaitOptions) {
        let result = eventually::to_eventually_reach_phase(self.received, phase, options).await;
        self.assert(result);
    }
}

impl std::fmt::Debug for Expectation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expectation")
            .field("negated", &self.negated)
            .finish_non_exhaustive()
    }
}
