use crate::cache::{CacheProvider, RecordView};
use crate::config::{ProfilerConfig, StabilizationOptions, WaitOptions};
use crate::error::ProfilerError;
use crate::events::{EventProvider, RenderEvent, RenderListener, RenderSubscription};
use crate::ledger::RenderLedger;
use crate::phase::{format_phases, CommitInfo, RenderPhase, RenderRecord};
use crate::registry::Providers;
use crate::stabilization::Stabilization;
use crate::wait::{ConditionWait, NextRender, Progress};
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Number of trailing history entries printed in timeout messages.
pub(crate) const HISTORY_PREVIEW: usize = 10;

/// Ledger, view cache, event hub and checkpoint for one component identity.
///
/// Every mutation completes before listeners run, so a listener may query the
/// bundle from inside its callback.
pub struct ProfileBundle {
    name: Rc<str>,
    config: ProfilerConfig,
    ledger: RefCell<RenderLedger>,
    cache: Box<dyn CacheProvider>,
    events: OnceCell<Rc<dyn EventProvider>>,
    providers: Providers,
    checkpoint: Cell<Option<usize>>,
}

impl ProfileBundle {
    pub fn new(name: impl Into<Rc<str>>, config: ProfilerConfig) -> Rc<Self> {
        Self::with_providers(name, config, Providers::default())
    }

    pub fn with_providers(
        name: impl Into<Rc<str>>,
        config: ProfilerConfig,
        providers: Providers,
    ) -> Rc<Self> {
        let name = name.into();
        Rc::new(Self {
            ledger: RefCell::new(RenderLedger::new(Rc::clone(&name), config.max_renders)),
            cache: providers.make_cache(),
            events: OnceCell::new(),
            providers,
            name,
            config,
            checkpoint: Cell::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> ProfilerConfig {
        self.config
    }

    /// Records one commit reported by the UI engine and notifies listeners.
    ///
    /// Listeners are skipped entirely, and no event is built, when nobody is
    /// subscribed.
    pub fn record(&self, commit: CommitInfo) -> Result<(), ProfilerError> {
        let count = {
            let mut ledger = self.ledger.borrow_mut();
            ledger.append(&commit)?;
            ledger.count()
        };
        self.cache.invalidate(commit.phase);

        let Some(events) = self.events.get().filter(|events| events.has_listeners()) else {
            return Ok(());
        };
        let event = RenderEvent {
            count,
            phase: commit.phase,
            history: self.history(),
        };
        Rc::clone(events).emit(&event);
        Ok(())
    }

    pub fn render_count(&self) -> usize {
        self.ledger.borrow().count()
    }

    pub fn history(&self) -> RecordView {
        self.ledger.borrow().history(&*self.cache)
    }

    pub fn renders_by_phase(&self, phase: RenderPhase) -> RecordView {
        self.ledger.borrow().renders_by_phase(phase, &*self.cache)
    }

    pub fn phase_count(&self, phase: RenderPhase) -> usize {
        self.ledger.borrow().phase_count(phase)
    }

    pub fn has_mounted(&self) -> bool {
        self.ledger.borrow().has_mounted_cached(&*self.cache)
    }

    pub fn last_render(&self) -> Option<RenderRecord> {
        self.ledger.borrow().last_record().cloned()
    }

    pub fn last_phase(&self) -> Option<RenderPhase> {
        self.ledger.borrow().last_phase()
    }

    pub fn render_at(&self, index: usize) -> Option<RenderRecord> {
        self.ledger.borrow().render_at(index).cloned()
    }

    pub fn total_actual_duration(&self) -> Duration {
        self.ledger
            .borrow()
            .records()
            .iter()
            .map(|record| record.actual_duration)
            .sum()
    }

    pub fn slowest_render(&self) -> Option<RenderRecord> {
        self.ledger
            .borrow()
            .records()
            .iter()
            .max_by_key(|record| record.actual_duration)
            .cloned()
    }

    /// Marks the current render count as the checkpoint baseline.
    pub fn snapshot(&self) {
        self.checkpoint.set(Some(self.render_count()));
    }

    pub fn checkpoint(&self) -> Option<usize> {
        self.checkpoint.get()
    }

    /// Renders recorded after the last [`snapshot`](Self::snapshot); all
    /// renders when no snapshot was taken.
    pub fn renders_since_snapshot(&self) -> usize {
        self.render_count()
            .saturating_sub(self.checkpoint.get().unwrap_or(0))
    }

    /// Short phase summary of the most recent renders.
    pub fn history_summary(&self) -> String {
        format_phases(self.ledger.borrow().records(), HISTORY_PREVIEW)
    }

    /// Resets the bundle to its freshly created state and drops all listeners.
    pub fn clear(&self) {
        self.ledger.borrow_mut().clear();
        self.cache.clear();
        self.checkpoint.set(None);
        if let Some(events) = self.events.get() {
            events.clear();
        }
    }

    pub fn cache(&self) -> &dyn CacheProvider {
        &*self.cache
    }

    pub fn has_listeners(&self) -> bool {
        self.events
            .get()
            .is_some_and(|events| events.has_listeners())
    }

    pub fn listener_count(&self) -> usize {
        self.events
            .get()
            .map_or(0, |events| events.listener_count())
    }

    fn events(&self) -> &Rc<dyn EventProvider> {
        self.events
            .get_or_init(|| self.providers.make_events(&self.name, &self.config))
    }

    /// Registers `listener`; the same `Rc` registered twice is one subscription.
    pub fn subscribe(&self, listener: RenderListener) -> Result<RenderSubscription, ProfilerError> {
        let events = self.events();
        let id = events.subscribe(listener)?;
        Ok(RenderSubscription::new(events, id))
    }

    pub fn on_render(
        &self,
        listener: impl Fn(&RenderEvent) + 'static,
    ) -> Result<RenderSubscription, ProfilerError> {
        self.subscribe(Rc::new(listener))
    }

    /// Resolves with the next render event, or fails after `options.timeout`.
    pub fn wait_for_next_render(
        self: &Rc<Self>,
        options: WaitOptions,
    ) -> Result<NextRender, ProfilerError> {
        let start = self.render_count();
        let wait = self.wait_for(options.timeout, "wait for next render", move |bundle| {
            if bundle.render_count() > start {
                Progress::Met
            } else {
                Progress::Pending
            }
        })?;
        Ok(NextRender::new(wait))
    }

    /// Resolves once no render happened for `options.debounce`.
    pub fn wait_for_stabilization(
        self: &Rc<Self>,
        options: StabilizationOptions,
    ) -> Result<Stabilization, ProfilerError> {
        options.validate()?;
        Stabilization::start(self, options)
    }

    /// Waits until `check` reports [`Progress::Met`] or [`Progress::Exceeded`].
    ///
    /// `check` runs once immediately, before any timer is armed, and then
    /// after every render until it settles.
    pub fn wait_for(
        self: &Rc<Self>,
        timeout: Duration,
        operation: &'static str,
        check: impl Fn(&ProfileBundle) -> Progress + 'static,
    ) -> Result<ConditionWait, ProfilerError> {
        WaitOptions::with_timeout(timeout).validate()?;
        ConditionWait::start(self, timeout, operation, Rc::new(check))
    }
}

impl fmt::Debug for ProfileBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileBundle")
            .field("name", &self.name)
            .field("render_count", &self.render_count())
            .field("listener_count", &self.listener_count())
            .field("checkpoint", &self.checkpoint.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/bundle_tests.rs"]
mod tests;
