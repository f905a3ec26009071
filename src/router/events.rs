//! Navigation lifecycle events.

use crate::history::Subscription;
use crate::location::ParsedLocation;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Points in a navigation where subscribers are notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterEventKind {
    /// The new location is known; matching has not started.
    BeforeLoad,
    /// Matches settled and were committed.
    Load,
    /// The committed location became the resolved location.
    Resolved,
}

#[derive(Debug, Clone)]
pub struct RouterEvent {
    pub kind: RouterEventKind,
    pub from: Option<ParsedLocation>,
    pub to: ParsedLocation,
    pub path_changed: bool,
    pub href_changed: bool,
}

impl RouterEvent {
    pub fn new(kind: RouterEventKind, from: Option<&ParsedLocation>, to: &ParsedLocation) -> Self {
        Self {
            kind,
            path_changed: from.map_or(true, |f| f.pathname != to.pathname),
            href_changed: from.map_or(true, |f| f.href != to.href),
            from: from.cloned(),
            to: to.clone(),
        }
    }
}

pub type EventListener = Arc<dyn Fn(&RouterEvent) + Send + Sync>;

type Listeners = Mutex<Vec<(u64, RouterEventKind, EventListener)>>;

/// Fan-out of router events to subscribers.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    listeners: Arc<Listeners>,
}

impl EventBus {
    pub fn subscribe(&self, kind: RouterEventKind, listener: EventListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("event listeners mutex poisoned")
            .push((id, kind, listener));

        let weak = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners
                    .lock()
                    .expect("event listeners mutex poisoned")
                    .retain(|(i, _, _)| *i != id);
            }
        })
    }

    pub fn emit(&self, event: &RouterEvent) {
        let targets: Vec<EventListener> = self
            .listeners
            .lock()
            .expect("event listeners mutex poisoned")
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, listener)| listener.clone())
            .collect();

        tracing::trace!(kind = ?event.kind, to = %event.to.href, listeners = targets.len(), "Emitting router event");
        for listener in targets {
            listener(event);
        }
    }
}
