//! Futures that wait for render conditions.
//!
//! A wait checks its condition once when created. Only if the condition is
//! still pending does it subscribe a listener and, on first poll, arm its
//! timer, so a condition that already holds never races the timeout. The
//! listener is registered at creation time: renders that happen before the
//! future is first polled are still observed.

use crate::bundle::ProfileBundle;
use crate::error::ProfilerError;
use crate::events::{RenderEvent, RenderSubscription};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// Result of evaluating a wait condition against the current ledger.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Not there yet; keep listening.
    Pending,
    /// The condition holds.
    Met,
    /// The condition can no longer hold (e.g. the count overshot its target).
    Exceeded,
}

/// How a [`ConditionWait`] settled.
#[derive(Clone, Debug)]
pub enum WaitOutcome {
    /// Condition met; carries the render that satisfied it, `None` when it
    /// already held at creation.
    Met(Option<RenderEvent>),
    /// Condition overshot; carries the render that overshot it, if any.
    Exceeded(Option<RenderEvent>),
    TimedOut(ProfilerError),
}

impl WaitOutcome {
    pub fn is_met(&self) -> bool {
        matches!(self, WaitOutcome::Met(_))
    }
}

pub(crate) type Condition = Rc<dyn Fn(&ProfileBundle) -> Progress>;

struct WaitState {
    settled: Option<(Progress, Option<RenderEvent>)>,
    subscription: Option<RenderSubscription>,
    waker: Option<Waker>,
}

impl WaitState {
    fn settle(&mut self, progress: Progress, event: Option<RenderEvent>) -> Option<Waker> {
        self.settled = Some((progress, event));
        self.waker.take()
    }
}

/// Future resolving when a condition over a component's renders settles or
/// its timeout elapses. Dropping it unsubscribes its listener.
#[must_use = "futures do nothing unless awaited"]
pub struct ConditionWait {
    bundle: Rc<ProfileBundle>,
    state: Rc<RefCell<WaitState>>,
    operation: &'static str,
    timeout: Duration,
    deadline: Instant,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ConditionWait {
    pub(crate) fn start(
        bundle: &Rc<ProfileBundle>,
        timeout: Duration,
        operation: &'static str,
        check: Condition,
    ) -> Result<Self, ProfilerError> {
        let deadline = Instant::now() + timeout;
        let state = Rc::new(RefCell::new(WaitState {
            settled: None,
            subscription: None,
            waker: None,
        }));

        let initial = check(bundle);
        if initial != Progress::Pending {
            log::debug!("{}: {} settled immediately ({:?})", bundle.name(), operation, initial);
            state.borrow_mut().settled = Some((initial, None));
        } else {
            let listener_state = Rc::downgrade(&state);
            let listener_bundle = Rc::downgrade(bundle);
            let subscription = bundle.on_render(move |event| {
                let (Some(state), Some(bundle)) =
                    (listener_state.upgrade(), listener_bundle.upgrade())
                else {
                    return;
                };
                // Past the deadline the timer owns the outcome.
                if state.borrow().settled.is_some() || Instant::now() >= deadline {
                    return;
                }
                let progress = check(&bundle);
                if progress == Progress::Pending {
                    return;
                }
                let (waker, subscription) = {
                    let mut state = state.borrow_mut();
                    let waker = state.settle(progress, Some(event.clone()));
                    (waker, state.subscription.take())
                };
                drop(subscription);
                if let Some(waker) = waker {
                    waker.wake();
                }
            })?;
            state.borrow_mut().subscription = Some(subscription);
        }

        Ok(Self {
            bundle: Rc::clone(bundle),
            state,
            operation,
            timeout,
            deadline,
            sleep: None,
        })
    }

    pub fn bundle(&self) -> &Rc<ProfileBundle> {
        &self.bundle
    }

    pub fn is_settled(&self) -> bool {
        self.state.borrow().settled.is_some()
    }

    fn timed_out(&self) -> ProfilerError {
        ProfilerError::Timeout {
            operation: self.operation,
            timeout: self.timeout,
            render_count: self.bundle.render_count(),
            history: self.bundle.history_summary(),
        }
    }
}

impl Future for ConditionWait {
    type Output = WaitOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some((progress, event)) = this.state.borrow_mut().settled.take() {
            return Poll::Ready(match progress {
                Progress::Exceeded => WaitOutcome::Exceeded(event),
                _ => WaitOutcome::Met(event),
            });
        }

        this.state.borrow_mut().waker = Some(cx.waker().clone());
        let deadline = this.deadline;
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(tokio::time::sleep_until(deadline)));
        if sleep.as_mut().poll(cx).is_pending() {
            return Poll::Pending;
        }

        let subscription = this.state.borrow_mut().subscription.take();
        drop(subscription);
        let error = this.timed_out();
        log::debug!("{}: {}", this.bundle.name(), error);
        Poll::Ready(WaitOutcome::TimedOut(error))
    }
}

impl fmt::Debug for ConditionWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionWait")
            .field("component", &self.bundle.name())
            .field("operation", &self.operation)
            .field("timeout", &self.timeout)
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Future returned by `wait_for_next_render`.
///
/// Every outstanding wait on the same component resolves with the same event.
#[must_use = "futures do nothing unless awaited"]
#[derive(Debug)]
pub struct NextRender {
    inner: ConditionWait,
}

impl NextRender {
    pub(crate) fn new(inner: ConditionWait) -> Self {
        Self { inner }
    }
}

impl Future for NextRender {
    type Output = Result<RenderEvent, ProfilerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(outcome) => outcome,
            Poll::Pending => return Poll::Pending,
        };
        Poll::Ready(match outcome {
            WaitOutcome::Met(Some(event)) | WaitOutcome::Exceeded(Some(event)) => Ok(event),
            WaitOutcome::Met(None) | WaitOutcome::Exceeded(None) => {
                let bundle = self.inner.bundle();
                Ok(RenderEvent {
                    count: bundle.render_count(),
                    phase: bundle
                        .last_phase()
                        .unwrap_or(crate::phase::RenderPhase::Mount),
                    history: bundle.history(),
                })
            }
            WaitOutcome::TimedOut(error) => Err(error),
        })
    }
}

#[cfg(test)]
#[path = "tests/wait_tests.rs"]
mod tests;
