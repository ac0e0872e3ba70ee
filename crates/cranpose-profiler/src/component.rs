//! Profiled component handle and the read API shared with matchers.

use crate::bundle::ProfileBundle;
use crate::cache::RecordView;
use crate::config::{StabilizationOptions, WaitOptions};
use crate::error::ProfilerError;
use crate::events::{RenderEvent, RenderListener, RenderSubscription};
use crate::phase::{CommitInfo, RenderPhase, RenderRecord};
use crate::registry::ComponentRegistry;
use crate::stabilization::Stabilization;
use crate::wait::{ConditionWait, NextRender, Progress};
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Read-only queries over a component's render history.
///
/// Never fails: a component that has not rendered yet answers with a zero
/// count, an empty view, `None` and `false`.
pub trait RenderQuery {
    fn render_count(&self) -> usize;
    fn render_history(&self) -> RecordView;
    fn last_render(&self) -> Option<RenderRecord>;
    fn render_at(&self, index: usize) -> Option<RenderRecord>;
    fn renders_by_phase(&self, phase: RenderPhase) -> RecordView;
    fn has_mounted(&self) -> bool;

    fn phase_count(&self, phase: RenderPhase) -> usize {
        self.renders_by_phase(phase).len()
    }

    fn total_actual_duration(&self) -> Duration {
        self.render_history()
            .iter()
            .map(|record| record.actual_duration)
            .sum()
    }

    fn average_actual_duration(&self) -> Option<Duration> {
        let count = u32::try_from(self.render_count()).ok().filter(|count| *count > 0)?;
        Some(self.total_actual_duration() / count)
    }

    fn slowest_render(&self) -> Option<RenderRecord> {
        self.render_history()
            .iter()
            .max_by_key(|record| record.actual_duration)
            .cloned()
    }
}

impl RenderQuery for ProfileBundle {
    fn render_count(&self) -> usize {
        ProfileBundle::render_count(self)
    }

    fn render_history(&self) -> RecordView {
        self.history()
    }

    fn last_render(&self) -> Option<RenderRecord> {
        ProfileBundle::last_render(self)
    }

    fn render_at(&self, index: usize) -> Option<RenderRecord> {
        ProfileBundle::render_at(self, index)
    }

    fn renders_by_phase(&self, phase: RenderPhase) -> RecordView {
        ProfileBundle::renders_by_phase(self, phase)
    }

    fn has_mounted(&self) -> bool {
        ProfileBundle::has_mounted(self)
    }

    fn phase_count(&self, phase: RenderPhase) -> usize {
        ProfileBundle::phase_count(self, phase)
    }

    fn total_actual_duration(&self) -> Duration {
        ProfileBundle::total_actual_duration(self)
    }

    fn slowest_render(&self) -> Option<RenderRecord> {
        ProfileBundle::slowest_render(self)
    }
}

fn empty_view() -> RecordView {
    thread_local! {
        static EMPTY: RecordView = Rc::from(Vec::new());
    }
    EMPTY.with(Rc::clone)
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Wraps `component` for profiling in the current thread's registry.
pub fn with_profiler<T: Any>(component: Rc<T>) -> ProfiledComponent {
    ProfiledComponent::new_in(ComponentRegistry::current(), component)
}

/// A component handle with render tracking attached.
///
/// The UI engine reports commits through [`record_commit`](Self::record_commit);
/// tests read them back through [`RenderQuery`] and the wait helpers. Cloning
/// the handle, or wrapping the same `Rc` again, shares the same history.
#[derive(Clone)]
pub struct ProfiledComponent {
    registry: Rc<ComponentRegistry>,
    component: Rc<dyn Any>,
    name: Rc<str>,
}

impl ProfiledComponent {
    pub fn new_in<T: Any>(registry: Rc<ComponentRegistry>, component: Rc<T>) -> Self {
        Self {
            registry,
            component,
            name: Rc::from(short_type_name::<T>()),
        }
    }

    /// Overrides the display name used in messages.
    ///
    /// Only affects a bundle that has not been created yet.
    pub fn named(mut self, name: impl Into<Rc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Name of the underlying bundle if it exists, else the wrapper's name.
    pub fn name(&self) -> String {
        match self.bundle() {
            Some(bundle) => bundle.name().to_string(),
            None => self.name.to_string(),
        }
    }

    pub fn component(&self) -> &Rc<dyn Any> {
        &self.component
    }

    pub fn registry(&self) -> &Rc<ComponentRegistry> {
        &self.registry
    }

    /// True when both handles profile the same underlying component.
    pub fn same_component(&self, other: &ProfiledComponent) -> bool {
        Rc::ptr_eq(&self.component, &other.component)
    }

    /// Existing bundle, if this component has been rendered or observed.
    pub fn bundle(&self) -> Option<Rc<ProfileBundle>> {
        self.registry.get(&self.component)
    }

    pub fn ensure_bundle(&self) -> Rc<ProfileBundle> {
        self.registry.get_or_create(&self.component, &self.name)
    }

    /// Commit trigger called by the UI engine after each render.
    ///
    /// Appends to the ledger and notifies listeners before returning.
    pub fn record_commit(&self, commit: CommitInfo) -> Result<(), ProfilerError> {
        self.ensure_bundle().record(commit)
    }

    pub fn on_render(
        &self,
        listener: impl Fn(&RenderEvent) + 'static,
    ) -> Result<RenderSubscription, ProfilerError> {
        self.ensure_bundle().on_render(listener)
    }

    pub fn subscribe(&self, listener: RenderListener) -> Result<RenderSubscription, ProfilerError> {
        self.ensure_bundle().subscribe(listener)
    }

    pub fn has_listeners(&self) -> bool {
        self.bundle().is_some_and(|bundle| bundle.has_listeners())
    }

    pub fn listener_count(&self) -> usize {
        self.bundle().map_or(0, |bundle| bundle.listener_count())
    }

    pub fn wait_for_next_render(&self, options: WaitOptions) -> Result<NextRender, ProfilerError> {
        self.ensure_bundle().wait_for_next_render(options)
    }

    pub fn wait_for_stabilization(
        &self,
        options: StabilizationOptions,
    ) -> Result<Stabilization, ProfilerError> {
        self.ensure_bundle().wait_for_stabilization(options)
    }

    /// See [`ProfileBundle::wait_for`].
    pub fn wait_for(
        &self,
        timeout: Duration,
        operation: &'static str,
        check: impl Fn(&ProfileBundle) -> Progress + 'static,
    ) -> Result<ConditionWait, ProfilerError> {
        self.ensure_bundle().wait_for(timeout, operation, check)
    }

    /// Marks the current render count as the checkpoint baseline.
    pub fn snapshot(&self) {
        self.ensure_bundle().snapshot();
    }

    /// Render count recorded by the last [`snapshot`](Self::snapshot).
    pub fn checkpoint(&self) -> Option<usize> {
        self.bundle()?.checkpoint()
    }

    pub fn renders_since_snapshot(&self) -> usize {
        self.bundle()
            .map_or(0, |bundle| bundle.renders_since_snapshot())
    }

    pub fn history_summary(&self) -> String {
        match self.bundle() {
            Some(bundle) => bundle.history_summary(),
            None => crate::phase::format_phases(&[], 0),
        }
    }

    /// Resets history, checkpoint and listeners.
    pub fn clear(&self) {
        if let Some(bundle) = self.bundle() {
            bundle.clear();
        }
    }
}

impl RenderQuery for ProfiledComponent {
    fn render_count(&self) -> usize {
        self.bundle().map_or(0, |bundle| bundle.render_count())
    }

    fn render_history(&self) -> RecordView {
        self.bundle()
            .map_or_else(empty_view, |bundle| bundle.history())
    }

    fn last_render(&self) -> Option<RenderRecord> {
        self.bundle()?.last_render()
    }

    fn render_at(&self, index: usize) -> Option<RenderRecord> {
        self.bundle()?.render_at(index)
    }

    fn renders_by_phase(&self, phase: RenderPhase) -> RecordView {
        self.bundle()
            .map_or_else(empty_view, |bundle| bundle.renders_by_phase(phase))
    }

    fn has_mounted(&self) -> bool {
        self.bundle().is_some_and(|bundle| bundle.has_mounted())
    }

    fn phase_count(&self, phase: RenderPhase) -> usize {
        self.bundle().map_or(0, |bundle| bundle.phase_count(phase))
    }

    fn total_actual_duration(&self) -> Duration {
        self.bundle()
            .map_or(Duration::ZERO, |bundle| bundle.total_actual_duration())
    }

    fn slowest_render(&self) -> Option<RenderRecord> {
        self.bundle()?.slowest_render()
    }
}

impl fmt::Debug for ProfiledComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfiledComponent")
            .field("name", &self.name)
            .field("render_count", &self.render_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod tests;
