//! Render assertions for profiled Cranpose components.
//!
//! Every matcher takes the received value as `&dyn Any`, checks that it is a
//! [`ProfiledComponent`](cranpose_profiler::ProfiledComponent) and returns a
//! [`MatchResult`] instead of panicking. [`expect`] wraps them for direct use
//! in tests.

pub mod budget;
pub mod eventually;
mod expect;
mod format;
pub mod loops;
pub mod matcher;
pub mod render;

pub use budget::{to_meet_render_count_budget, RenderBudget};
pub use eventually::{
    to_eventually_reach_phase, to_eventually_render_at_least, to_eventually_render_times,
    to_eventually_rerender,
};
pub use expect::{expect, Expectation};
pub use loops::{not_to_have_render_loops, scan_for_loops, LoopOptions, LoopScan, RenderLoop};
pub use matcher::{profiled, MatchResult};
pub use render::{
    to_have_last_rendered_with_phase, to_have_mounted_once, to_have_never_mounted,
    to_have_only_mounted, to_have_only_updated, to_have_rendered, to_have_rendered_times,
    to_have_rerendered, to_have_rerendered_times, to_render_within,
};

pub mod prelude {
    pub use crate::budget::RenderBudget;
    pub use crate::expect::expect;
    pub use crate::loops::LoopOptions;
    pub use cranpose_profiler::prelude::*;
}
