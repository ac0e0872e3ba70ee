//! Association from component identity to its [`ProfileBundle`].
//!
//! Identity is the `Rc` allocation of the original component, so any number of
//! wrappers around the same component share one bundle. The registry holds the
//! component weakly: once every strong handle is gone the entry can be pruned,
//! and a new allocation that happens to reuse the address never inherits the
//! old history.

use crate::bundle::ProfileBundle;
use crate::cache::{CacheProvider, ViewCache};
use crate::collections::map::Entry;
use crate::collections::AddressMap;
use crate::config::ProfilerConfig;
use crate::events::{EventHub, EventProvider};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type CacheFactory = Rc<dyn Fn() -> Box<dyn CacheProvider>>;
type EventFactory = Rc<dyn Fn(Rc<str>, &ProfilerConfig) -> Rc<dyn EventProvider>>;

/// Factories for the cache and event implementations of new bundles.
///
/// Defaults to [`ViewCache`] and [`EventHub`]; tests can swap in instrumented
/// or no-op variants without touching the render path.
#[derive(Clone)]
pub struct Providers {
    cache: CacheFactory,
    events: EventFactory,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            cache: Rc::new(|| Box::new(ViewCache::new()) as Box<dyn CacheProvider>),
            events: Rc::new(|name: Rc<str>, config: &ProfilerConfig| {
                Rc::new(EventHub::new(name, config.max_listeners)) as Rc<dyn EventProvider>
            }),
        }
    }
}

impl Providers {
    pub fn with_cache(mut self, factory: impl Fn() -> Box<dyn CacheProvider> + 'static) -> Self {
        self.cache = Rc::new(factory);
        self
    }

    pub fn with_events(
        mut self,
        factory: impl Fn(Rc<str>, &ProfilerConfig) -> Rc<dyn EventProvider> + 'static,
    ) -> Self {
        self.events = Rc::new(factory);
        self
    }

    pub(crate) fn make_cache(&self) -> Box<dyn CacheProvider> {
        (self.cache)()
    }

    pub(crate) fn make_events(
        &self,
        name: &Rc<str>,
        config: &ProfilerConfig,
    ) -> Rc<dyn EventProvider> {
        (self.events)(Rc::clone(name), config)
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

struct RegistryEntry {
    identity: Weak<dyn Any>,
    bundle: Rc<ProfileBundle>,
}

/// Per-thread registry of profiled components.
///
/// Lifecycle: created on first use, reset between test cases by a teardown
/// hook, never reset in the middle of a test.
pub struct ComponentRegistry {
    config: ProfilerConfig,
    providers: Providers,
    entries: RefCell<AddressMap<RegistryEntry>>,
}

thread_local! {
    static CURRENT_REGISTRY: RefCell<Option<Rc<ComponentRegistry>>> = const { RefCell::new(None) };
}

fn identity_key(component: &Rc<dyn Any>) -> usize {
    Rc::as_ptr(component) as *const () as usize
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::with_config(ProfilerConfig::default())
    }

    pub fn with_config(config: ProfilerConfig) -> Self {
        Self::with_providers(config, Providers::default())
    }

    pub fn with_providers(config: ProfilerConfig, providers: Providers) -> Self {
        Self {
            config,
            providers,
            entries: RefCell::new(AddressMap::<RegistryEntry>::default()),
        }
    }

    pub fn config(&self) -> ProfilerConfig {
        self.config
    }

    /// Returns the bundle for `component`, creating it on first access.
    ///
    /// `name` labels a newly created bundle; an existing bundle keeps the
    /// name it was created with.
    pub fn get_or_create(&self, component: &Rc<dyn Any>, name: &str) -> Rc<ProfileBundle> {
        let key = identity_key(component);
        let mut entries = self.entries.borrow_mut();
        match entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().identity.strong_count() > 0 {
                    return Rc::clone(&occupied.get().bundle);
                }
                log::warn!(
                    "replacing stale profile of {} whose component was dropped",
                    occupied.get().bundle.name()
                );
                let bundle = self.make_bundle(name);
                occupied.insert(RegistryEntry {
                    identity: Rc::downgrade(component),
                    bundle: Rc::clone(&bundle),
                });
                bundle
            }
            Entry::Vacant(vacant) => {
                log::debug!("profiling {name}");
                let bundle = self.make_bundle(name);
                vacant.insert(RegistryEntry {
                    identity: Rc::downgrade(component),
                    bundle: Rc::clone(&bundle),
                });
                bundle
            }
        }
    }

    /// Returns the bundle for `component` without creating one.
    pub fn get(&self, component: &Rc<dyn Any>) -> Option<Rc<ProfileBundle>> {
        self.entries
            .borrow()
            .get(&identity_key(component))
            .filter(|entry| entry.identity.strong_count() > 0)
            .map(|entry| Rc::clone(&entry.bundle))
    }

    pub fn contains(&self, component: &Rc<dyn Any>) -> bool {
        self.get(component).is_some()
    }

    /// Forgets `component`; returns whether it was registered.
    pub fn unregister(&self, component: &Rc<dyn Any>) -> bool {
        self.entries
            .borrow_mut()
            .remove(&identity_key(component))
            .is_some()
    }

    /// Drops entries whose component no longer exists; returns how many.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, entry| entry.identity.strong_count() > 0);
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("pruned {removed} dropped components");
        }
        removed
    }

    /// Clears every bundle and forgets all components.
    pub fn reset(&self) {
        let drained: Vec<RegistryEntry> = self
            .entries
            .borrow_mut()
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        for entry in drained {
            entry.bundle.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn make_bundle(&self, name: &str) -> Rc<ProfileBundle> {
        ProfileBundle::with_providers(name, self.config, self.providers.clone())
    }

    /// Registry used by [`with_profiler`](crate::with_profiler) on this thread.
    pub fn current() -> Rc<Self> {
        CURRENT_REGISTRY.with(|slot| {
            Rc::clone(
                slot.borrow_mut()
                    .get_or_insert_with(|| Rc::new(ComponentRegistry::new())),
            )
        })
    }

    /// Makes `registry` current for this thread; returns the previous one.
    pub fn install(registry: Rc<Self>) -> Option<Rc<Self>> {
        CURRENT_REGISTRY.with(|slot| slot.borrow_mut().replace(registry))
    }

    /// Installs `registry` until the returned guard drops.
    pub fn scoped(registry: Rc<Self>) -> RegistryGuard {
        RegistryGuard {
            previous: Self::install(registry),
        }
    }

    /// Teardown hook: resets the current registry if one exists.
    pub fn reset_current() {
        let current = CURRENT_REGISTRY.with(|slot| slot.borrow().clone());
        if let Some(registry) = current {
            registry.reset();
        }
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("config", &self.config)
            .field("entries", &self.len())
            .finish()
    }
}

/// Restores the previously current registry on drop.
#[must_use = "the registry is uninstalled when the guard drops"]
pub struct RegistryGuard {
    previous: Option<Rc<ComponentRegistry>>,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_REGISTRY.with(|slot| *slot.borrow_mut() = previous);
    }
}

impl fmt::Debug for RegistryGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
