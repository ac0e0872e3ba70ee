//! Result type shared by every matcher, and the capability check.

use cranpose_profiler::ProfiledComponent;
use std::any::Any;
use std::fmt;

/// Outcome of one matcher.
///
/// `message` describes the failure when `pass` is false, and the failure of
/// the negated assertion when `pass` is true, so [`negate`](Self::negate) never
/// has to rebuild it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    pub pass: bool,
    pub message: String,
    pub actual: Option<String>,
    pub expected: Option<String>,
    /// The matcher could not evaluate its input at all.
    pub invalid: bool,
}

impl MatchResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self::from_check(true, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::from_check(false, message)
    }

    /// Failing result for unusable input; stays failing under negation.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            invalid: true,
            ..Self::fail(message)
        }
    }

    pub(crate) fn from_check(pass: bool, message: impl Into<String>) -> Self {
        Self {
            pass,
            message: message.into(),
            actual: None,
            expected: None,
            invalid: false,
        }
    }

    pub fn with_actual(mut self, actual: impl ToString) -> Self {
        self.actual = Some(actual.to_string());
        self
    }

    pub fn with_expected(mut self, expected: impl ToString) -> Self {
        self.expected = Some(expected.to_string());
        self
    }

    /// Flips `pass`, as `.not()` does. Invalid results stay failing.
    pub fn negate(mut self) -> Self {
        if !self.invalid {
            self.pass = !self.pass;
        }
        self
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let (Some(actual), Some(expected)) = (&self.actual, &self.expected) {
            write!(f, "\n\nExpected: {expected}\nReceived: {actual}")?;
        }
        Ok(())
    }
}

/// Capability check run first by every matcher.
pub fn profiled(received: &dyn Any) -> Result<&ProfiledComponent, MatchResult> {
    received.downcast_ref::<ProfiledComponent>().ok_or_else(|| {
        MatchResult::invalid(
            "received value is not a profiled component; wrap it with `with_profiler` first",
        )
    })
}
