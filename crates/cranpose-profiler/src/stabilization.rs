//! Debounced "no more renders" detection.
//!
//! Every render observed by a [`Stabilization`] pushes its quiet deadline
//! forward by the debounce period. The wait resolves once that deadline passes
//! without a render and fails if the absolute timeout comes first. Both are
//! measured from creation, not from the first poll.

use crate::bundle::ProfileBundle;
use crate::config::StabilizationOptions;
use crate::error::ProfilerError;
use crate::events::RenderSubscription;
use crate::phase::RenderPhase;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// What a stabilization wait observed before the component went quiet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StabilizationResult {
    /// Renders seen since the wait started.
    pub render_count: usize,
    /// Phase of the most recent observed render; `None` when there was none.
    pub last_phase: Option<RenderPhase>,
}

struct Observed {
    render_count: usize,
    last_phase: Option<RenderPhase>,
    last_activity: Instant,
    settled: Option<StabilizationResult>,
    waker: Option<Waker>,
}

/// Future returned by `wait_for_stabilization`.
#[must_use = "futures do nothing unless awaited"]
pub struct Stabilization {
    bundle: Rc<ProfileBundle>,
    observed: Rc<RefCell<Observed>>,
    subscription: Option<RenderSubscription>,
    options: StabilizationOptions,
    deadline: Instant,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Observed {
    fn result(&self) -> StabilizationResult {
        StabilizationResult {
            render_count: self.render_count,
            last_phase: self.last_phase,
        }
    }

    /// End of the current quiet window, if it closes by `deadline`.
    fn quiet_at(&self, debounce: Duration, deadline: Instant) -> Option<Instant> {
        Some(self.last_activity + debounce).filter(|quiet_at| *quiet_at <= deadline)
    }
}

impl Stabilization {
    pub(crate) fn start(
        bundle: &Rc<ProfileBundle>,
        options: StabilizationOptions,
    ) -> Result<Self, ProfilerError> {
        let started = Instant::now();
        let deadline = started + options.timeout;
        let observed = Rc::new(RefCell::new(Observed {
            render_count: 0,
            last_phase: None,
            last_activity: started,
            settled: None,
            waker: None,
        }));

        let listener_observed = Rc::downgrade(&observed);
        let subscription = bundle.on_render(move |event| {
            let Some(observed) = listener_observed.upgrade() else {
                return;
            };
            let now = Instant::now();
            let waker = {
                let mut observed = observed.borrow_mut();
                if observed.settled.is_some() {
                    return;
                }
                // Quiet window already closed, but the future was not polled yet.
                if observed
                    .quiet_at(options.debounce, deadline)
                    .is_some_and(|quiet_at| now >= quiet_at)
                {
                    let result = observed.result();
                    observed.settled = Some(result);
                } else if now >= deadline {
                    return;
                } else {
                    observed.render_count += 1;
                    observed.last_phase = Some(event.phase);
                    observed.last_activity = now;
                }
                observed.waker.take()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
        })?;

        Ok(Self {
            bundle: Rc::clone(bundle),
            observed,
            subscription: Some(subscription),
            options,
            deadline,
            sleep: None,
        })
    }

    fn result(&self) -> StabilizationResult {
        self.observed.borrow().result()
    }

    fn settle(&mut self, result: StabilizationResult) -> Poll<<Self as Future>::Output> {
        self.subscription.take();
        log::debug!(
            "{} stabilized after {} renders",
            self.bundle.name(),
            result.render_count
        );
        Poll::Ready(Ok(result))
    }
}

impl Future for Stabilization {
    type Output = Result<StabilizationResult, ProfilerError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            let now = Instant::now();
            let (settled, quiet_at) = {
                let observed = this.observed.borrow();
                (
                    observed.settled,
                    observed.quiet_at(this.options.debounce, this.deadline),
                )
            };

            if let Some(result) = settled {
                return this.settle(result);
            }
            if quiet_at.is_some_and(|quiet_at| now >= quiet_at) {
                let result = this.result();
                return this.settle(result);
            }
            if now >= this.deadline {
                this.subscription.take();
                return Poll::Ready(Err(ProfilerError::Timeout {
                    operation: "wait for stabilization",
                    timeout: this.options.timeout,
                    render_count: this.observed.borrow().render_count,
                    history: this.bundle.history_summary(),
                }));
            }

            this.observed.borrow_mut().waker = Some(cx.waker().clone());
            let next = quiet_at.unwrap_or(this.deadline);
            let sleep = this
                .sleep
                .get_or_insert_with(|| Box::pin(tokio::time::sleep_until(next)));
            sleep.as_mut().reset(next);
            if sleep.as_mut().poll(cx).is_pending() {
                return Poll::Pending;
            }
        }
    }
}

impl fmt::Debug for Stabilization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stabilization")
            .field("component", &self.bundle.name())
            .field("options", &self.options)
            .field("observed", &self.result())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/stabilization_tests.rs"]
mod tests;
