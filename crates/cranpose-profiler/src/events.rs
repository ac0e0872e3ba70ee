//! Render listeners and event dispatch.
//!
//! Listeners run synchronously inside the commit that produced the event, in
//! subscription order. A listener that panics aborts the rest of the batch and
//! the panic surfaces at the render trigger.

use crate::cache::RecordView;
use crate::error::ProfilerError;
use crate::phase::RenderPhase;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Payload delivered to render listeners.
#[derive(Clone, Debug)]
pub struct RenderEvent {
    /// Ledger length right after the triggering append.
    pub count: usize,
    pub phase: RenderPhase,
    /// Frozen history as of this render.
    pub history: RecordView,
}

pub type RenderListener = Rc<dyn Fn(&RenderEvent)>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listener registry, injectable per registry.
pub trait EventProvider {
    /// Registers `listener`. Registering the same `Rc` twice returns the
    /// existing id.
    fn subscribe(&self, listener: RenderListener) -> Result<ListenerId, ProfilerError>;

    /// Removes a listener. Unknown ids are ignored; returns whether one was removed.
    fn unsubscribe(&self, id: ListenerId) -> bool;

    fn emit(&self, event: &RenderEvent);

    fn has_listeners(&self) -> bool;

    fn listener_count(&self) -> usize;

    /// Drops every listener.
    fn clear(&self);
}

/// Default [`EventProvider`] with a listener ceiling.
pub struct EventHub {
    component: Rc<str>,
    listeners: RefCell<Vec<(ListenerId, RenderListener)>>,
    next_id: Cell<u64>,
    max_listeners: usize,
}

impl EventHub {
    pub fn new(component: impl Into<Rc<str>>, max_listeners: usize) -> Self {
        Self {
            component: component.into(),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            max_listeners,
        }
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("component", &self.component)
            .field("listener_count", &self.listeners.borrow().len())
            .field("max_listeners", &self.max_listeners)
            .finish()
    }
}

fn same_listener(a: &RenderListener, b: &RenderListener) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

impl EventProvider for EventHub {
    fn subscribe(&self, listener: RenderListener) -> Result<ListenerId, ProfilerError> {
        let mut listeners = self.listeners.borrow_mut();
        if let Some((id, _)) = listeners
            .iter()
            .find(|(_, existing)| same_listener(existing, &listener))
        {
            return Ok(*id);
        }
        if listeners.len() >= self.max_listeners {
            log::error!(
                "{} exceeded the listener ceiling of {}",
                self.component,
                self.max_listeners
            );
            return Err(ProfilerError::MemoryLeak {
                component: self.component.to_string(),
                limit: self.max_listeners,
            });
        }
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        listeners.push((id, listener));
        log::debug!(
            "{} listener {:?} subscribed ({} live)",
            self.component,
            id,
            listeners.len()
        );
        Ok(id)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(index) = listeners.iter().position(|(entry, _)| *entry == id) else {
            return false;
        };
        listeners.remove(index);
        log::debug!("{} listener {:?} unsubscribed", self.component, id);
        true
    }

    fn emit(&self, event: &RenderEvent) {
        // Listeners may subscribe or unsubscribe while being notified.
        let batch: SmallVec<[RenderListener; 4]> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        log::trace!(
            "{} emitting render #{} to {} listeners",
            self.component,
            event.count,
            batch.len()
        );
        for listener in batch {
            listener(event);
        }
    }

    fn has_listeners(&self) -> bool {
        !self.listeners.borrow().is_empty()
    }

    fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

/// Handle returned by a subscription.
///
/// Dropping the handle unsubscribes. `unsubscribe` may be called any number of
/// times, including after the hub was cleared or dropped.
#[must_use = "dropping a RenderSubscription unsubscribes the listener"]
pub struct RenderSubscription {
    hub: Weak<dyn EventProvider>,
    id: Cell<Option<ListenerId>>,
}

impl RenderSubscription {
    pub(crate) fn new(hub: &Rc<dyn EventProvider>, id: ListenerId) -> Self {
        Self {
            hub: Rc::downgrade(hub),
            id: Cell::new(Some(id)),
        }
    }

    pub fn id(&self) -> Option<ListenerId> {
        self.id.get()
    }

    pub fn is_active(&self) -> bool {
        self.id.get().is_some()
    }

    pub fn unsubscribe(&self) {
        if let Some(id) = self.id.take() {
            if let Some(hub) = self.hub.upgrade() {
                hub.unsubscribe(id);
            }
        }
    }
}

impl fmt::Debug for RenderSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSubscription")
            .field("id", &self.id.get())
            .finish()
    }
}

impl Drop for RenderSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
