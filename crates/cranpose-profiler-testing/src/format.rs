//! Message formatting shared by the matchers.

use cranpose_profiler::{ProfiledComponent, RenderQuery};
use std::time::Duration;

/// `headline` followed by the component's recent render history.
pub(crate) fn with_history(headline: impl AsRef<str>, component: &ProfiledComponent) -> String {
    format!(
        "{}\n\nRecent renders ({} total): {}",
        headline.as_ref(),
        component.render_count(),
        component.history_summary()
    )
}

/// "1 time", "3 times".
pub(crate) fn times(count: usize) -> String {
    if count == 1 {
        "1 time".to_string()
    } else {
        format!("{count} times")
    }
}

/// Milliseconds, with a fractional part only when there is one.
pub(crate) fn millis(duration: Duration) -> String {
    if duration.subsec_nanos() % 1_000_000 == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
    }
}
