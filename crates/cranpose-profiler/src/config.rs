//! Ceilings and wait options.

use crate::error::ProfilerError;
use std::time::Duration;

pub const DEFAULT_MAX_RENDERS: usize = 10_000;
pub const DEFAULT_MAX_LISTENERS: usize = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Circuit-breaker limits shared by every bundle a registry creates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Largest ledger length before a render is treated as an infinite loop.
    pub max_renders: usize,
    /// Largest number of live render listeners per component.
    pub max_listeners: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            max_renders: DEFAULT_MAX_RENDERS,
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}

impl ProfilerConfig {
    pub fn with_max_renders(mut self, max_renders: usize) -> Self {
        self.max_renders = max_renders;
        self
    }

    pub fn with_max_listeners(mut self, max_listeners: usize) -> Self {
        self.max_listeners = max_listeners;
        self
    }
}

/// Options for one-shot and condition waits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn validate(&self) -> Result<(), ProfilerError> {
        validate_timeout("timeout", self.timeout)
    }
}

/// Options for [`ProfiledComponent::wait_for_stabilization`].
///
/// [`ProfiledComponent::wait_for_stabilization`]: crate::ProfiledComponent::wait_for_stabilization
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StabilizationOptions {
    /// Quiet period without renders that counts as stable.
    pub debounce: Duration,
    /// Absolute cap on the whole wait.
    pub timeout: Duration,
}

impl Default for StabilizationOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl StabilizationOptions {
    pub fn new(debounce: Duration, timeout: Duration) -> Self {
        Self { debounce, timeout }
    }

    pub fn validate(&self) -> Result<(), ProfilerError> {
        validate_timeout("debounce", self.debounce)?;
        validate_timeout("timeout", self.timeout)?;
        if self.debounce >= self.timeout {
            return Err(ProfilerError::DebounceNotBelowTimeout {
                debounce: self.debounce,
                timeout: self.timeout,
            });
        }
        Ok(())
    }
}

fn validate_timeout(name: &'static str, value: Duration) -> Result<(), ProfilerError> {
    if value.is_zero() {
        return Err(ProfilerError::InvalidOption {
            name,
            value: format!("{value:?}"),
            reason: "must be greater than zero",
        });
    }
    if tokio::time::Instant::now().checked_add(value).is_none() {
        return Err(ProfilerError::InvalidOption {
            name,
            value: format!("{value:?}"),
            reason: "must be a finite deadline",
        });
    }
    Ok(())
}
