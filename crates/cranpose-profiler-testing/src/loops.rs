//! Render-loop detection over a phase history.
//!
//! A loop is a run of consecutive renders of the same update phase that is
//! strictly longer than the threshold for that phase. Runs restart on a mount
//! and whenever the phase switches between `Update` and `NestedUpdate`.

use crate::format::with_history;
use crate::matcher::{profiled, MatchResult};
use cranpose_profiler::{RenderPhase, RenderQuery, RenderRecord};
use std::any::Any;

pub const DEFAULT_MAX_CONSECUTIVE: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoopOptions {
    pub max_consecutive_updates: usize,
    pub max_consecutive_nested: usize,
    /// Leading non-mount renders excluded from the scan, for intentional
    /// initialization updates.
    pub ignore_initial_updates: usize,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_consecutive_updates: DEFAULT_MAX_CONSECUTIVE,
            max_consecutive_nested: DEFAULT_MAX_CONSECUTIVE,
            ignore_initial_updates: 0,
        }
    }
}

impl LoopOptions {
    pub fn with_max_consecutive_updates(mut self, max: usize) -> Self {
        self.max_consecutive_updates = max;
        self
    }

    pub fn with_max_consecutive_nested(mut self, max: usize) -> Self {
        self.max_consecutive_nested = max;
        self
    }

    pub fn with_ignore_initial_updates(mut self, count: usize) -> Self {
        self.ignore_initial_updates = count;
        self
    }

    fn threshold(&self, phase: RenderPhase) -> usize {
        match phase {
            RenderPhase::NestedUpdate => self.max_consecutive_nested,
            _ => self.max_consecutive_updates,
        }
    }
}

/// A run that went past its threshold.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderLoop {
    pub phase: RenderPhase,
    pub run_length: usize,
    pub threshold: usize,
    /// Ordinal of the first render of the run.
    pub first_ordinal: usize,
}

/// What a scan found. Longest runs cover the scanned prefix only when a loop
/// cut the scan short.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopScan {
    pub longest_update_run: usize,
    pub longest_nested_run: usize,
    pub scanned: usize,
    pub detected: Option<RenderLoop>,
}

/// Single pass over `history`, stopping at the first loop.
pub fn scan_for_loops(history: &[RenderRecord], options: &LoopOptions) -> LoopScan {
    let mut scan = LoopScan::default();
    let mut skipped = 0;
    let mut run: Option<(RenderPhase, usize, usize)> = None;

    for record in history {
        scan.scanned += 1;
        if record.phase == RenderPhase::Mount {
            run = None;
            continue;
        }
        if skipped < options.ignore_initial_updates {
            skipped += 1;
            continue;
        }

        let (phase, length, first) = match run {
            Some((phase, length, first)) if phase == record.phase => (phase, length + 1, first),
            _ => (record.phase, 1, record.ordinal),
        };
        run = Some((phase, length, first));

        let longest = match phase {
            RenderPhase::NestedUpdate => &mut scan.longest_nested_run,
            _ => &mut scan.longest_update_run,
        };
        *longest = (*longest).max(length);

        let threshold = options.threshold(phase);
        if length > threshold {
            scan.detected = Some(RenderLoop {
                phase,
                run_length: length,
                threshold,
                first_ordinal: first,
            });
            break;
        }
    }
    scan
}

pub fn not_to_have_render_loops(received: &dyn Any, options: LoopOptions) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    let name = component.name();
    let history = component.render_history();
    let scan = scan_for_loops(&history, &options);

    match scan.detected {
        Some(found) => {
            log::debug!(
                "{name}: {} consecutive {} renders from #{}",
                found.run_length,
                found.phase,
                found.first_ordinal
            );
            MatchResult::fail(with_history(
                format!(
                    "expected {name} not to have render loops, but found {} consecutive {} renders \
                     starting at render #{} (max allowed: {})",
                    found.run_length, found.phase, found.first_ordinal, found.threshold
                ),
                component,
            ))
            .with_actual(found.run_length)
            .with_expected(format!("at most {}", found.threshold))
        }
        None => MatchResult::pass(with_history(
            format!(
                "expected {name} to have render loops, but the longest runs were {} updates \
                 (max {}) and {} nested updates (max {}) across {} renders",
                scan.longest_update_run,
                options.max_consecutive_updates,
                scan.longest_nested_run,
                options.max_consecutive_nested,
                scan.scanned
            ),
            component,
        )),
    }
}

#[cfg(test)]
#[path = "tests/loops_tests.rs"]
mod tests;
