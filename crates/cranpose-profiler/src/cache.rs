//! Memoized views over a render ledger.
//!
//! Views are `Rc<[RenderRecord]>`: immutable to consumers and pointer-stable
//! between appends, so repeated reads hand out the same allocation.
//! Invalidation is keyed by the phase that changed; views of other phases
//! survive an append untouched.

use crate::phase::{RenderPhase, RenderRecord};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Frozen, shareable slice of render records.
pub type RecordView = Rc<[RenderRecord]>;

/// Identifies one derived view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewKey {
    History,
    Phase(RenderPhase),
}

impl ViewKey {
    fn slot(self) -> usize {
        match self {
            ViewKey::History => 0,
            ViewKey::Phase(phase) => 1 + phase.slot(),
        }
    }
}

/// Counters describing how a cache has been used.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Storage for derived views, injectable per registry.
pub trait CacheProvider {
    /// Returns the cached view for `key`, computing and storing it when absent.
    fn get_or_compute(&self, key: ViewKey, compute: &mut dyn FnMut() -> RecordView) -> RecordView;

    /// Returns the cached mount flag, computing and storing it when absent.
    fn mounted_or_compute(&self, compute: &mut dyn FnMut() -> bool) -> bool;

    /// Drops the full-history view and the view of `phase`.
    fn invalidate(&self, phase: RenderPhase);

    /// Drops every cached entry.
    fn clear(&self);

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

const VIEW_SLOTS: usize = 4;

/// Default cache: one slot for the history and one per phase.
#[derive(Default)]
pub struct ViewCache {
    views: RefCell<[Option<RecordView>; VIEW_SLOTS]>,
    mounted: Cell<Option<bool>>,
    stats: Cell<CacheStats>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a view is currently cached for `key`.
    pub fn is_cached(&self, key: ViewKey) -> bool {
        self.views.borrow()[key.slot()].is_some()
    }

    fn bump(&self, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

impl CacheProvider for ViewCache {
    fn get_or_compute(&self, key: ViewKey, compute: &mut dyn FnMut() -> RecordView) -> RecordView {
        if let Some(view) = &self.views.borrow()[key.slot()] {
            self.bump(|stats| stats.hits += 1);
            return Rc::clone(view);
        }
        self.bump(|stats| stats.misses += 1);
        let view = compute();
        self.views.borrow_mut()[key.slot()] = Some(Rc::clone(&view));
        view
    }

    fn mounted_or_compute(&self, compute: &mut dyn FnMut() -> bool) -> bool {
        if let Some(mounted) = self.mounted.get() {
            return mounted;
        }
        let mounted = compute();
        self.mounted.set(Some(mounted));
        mounted
    }

    fn invalidate(&self, phase: RenderPhase) {
        let mut views = self.views.borrow_mut();
        views[ViewKey::History.slot()] = None;
        views[ViewKey::Phase(phase).slot()] = None;
        if phase == RenderPhase::Mount {
            self.mounted.set(None);
        }
        self.bump(|stats| stats.invalidations += 1);
    }

    fn clear(&self) {
        *self.views.borrow_mut() = Default::default();
        self.mounted.set(None);
    }

    fn stats(&self) -> CacheStats {
        self.stats.get()
    }
}

/// Cache that never stores anything; every read recomputes.
///
/// Useful to check that consumers do not depend on view identity.
#[derive(Default)]
pub struct UncachedViews {
    computes: Cell<u64>,
}

impl CacheProvider for UncachedViews {
    fn get_or_compute(&self, _key: ViewKey, compute: &mut dyn FnMut() -> RecordView) -> RecordView {
        self.computes.set(self.computes.get() + 1);
        compute()
    }

    fn mounted_or_compute(&self, compute: &mut dyn FnMut() -> bool) -> bool {
        compute()
    }

    fn invalidate(&self, _phase: RenderPhase) {}

    fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        CacheStats {
            misses: self.computes.get(),
            ..CacheStats::default()
        }
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
