//! Render-count budgets.

use crate::format::with_history;
use crate::matcher::{profiled, MatchResult};
use cranpose_profiler::{RenderPhase, RenderQuery};
use std::any::Any;

/// Upper bounds on a component's renders. At least one bound must be set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderBudget {
    pub max_renders: Option<usize>,
    pub max_mounts: Option<usize>,
    /// Bound on `Update` and `NestedUpdate` renders together.
    pub max_updates: Option<usize>,
    /// Used in messages instead of the component's own name.
    pub component_name: Option<String>,
}

impl RenderBudget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_renders(mut self, max: usize) -> Self {
        self.max_renders = Some(max);
        self
    }

    pub fn max_mounts(mut self, max: usize) -> Self {
        self.max_mounts = Some(max);
        self
    }

    pub fn max_updates(mut self, max: usize) -> Self {
        self.max_updates = Some(max);
        self
    }

    pub fn component_name(mut self, name: impl Into<String>) -> Self {
        self.component_name = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.max_renders.is_none() && self.max_mounts.is_none() && self.max_updates.is_none()
    }
}

struct Line {
    label: &'static str,
    actual: usize,
    budget: usize,
}

impl Line {
    fn exceeded(&self) -> bool {
        self.actual > self.budget
    }

    fn describe(&self) -> String {
        format!("{}: {} (budget: {})", self.label, self.actual, self.budget)
    }

    fn bound(&self) -> String {
        format!("{}: at most {}", self.label, self.budget)
    }
}

pub fn to_meet_render_count_budget(received: &dyn Any, budget: &RenderBudget) -> MatchResult {
    let component = match profiled(received) {
        Ok(component) => component,
        Err(result) => return result,
    };
    if budget.is_empty() {
        return MatchResult::invalid(
            "render budget must set at least one of max_renders, max_mounts or max_updates",
        );
    }
    let name = budget
        .component_name
        .clone()
        .unwrap_or_else(|| component.name());

    let mounts = component.phase_count(RenderPhase::Mount);
    let total = component.render_count();
    let lines: Vec<Line> = [
        (budget.max_renders, "Total renders", total),
        (budget.max_mounts, "Mounts", mounts),
        (budget.max_updates, "Updates", total - mounts),
    ]
    .into_iter()
    .filter_map(|(max, label, actual)| {
        max.map(|limit| Line {
            label,
            actual,
            budget: limit,
        })
    })
    .collect();

    let violations: Vec<String> = lines
        .iter()
        .filter(|line| line.exceeded())
        .map(Line::describe)
        .collect();
    let summary: Vec<String> = lines.iter().map(Line::describe).collect();
    let bounds: Vec<String> = lines.iter().map(Line::bound).collect();

    let result = if violations.is_empty() {
        MatchResult::pass(with_history(
            format!(
                "expected {name} to exceed its render budget, but it stayed within it:\n  {}",
                summary.join("\n  ")
            ),
            component,
        ))
        .with_actual(summary.join(", "))
    } else {
        MatchResult::fail(with_history(
            format!(
                "expected {name} to meet its render budget, but it exceeded it:\n  {}",
                violations.join("\n  ")
            ),
            component,
        ))
        .with_actual(violations.join(", "))
    };
    result.with_expected(bounds.join(", "))
}

#[cfg(test)]
#[path = "tests/budget_tests.rs"]
mod tests;
