//! In-memory history for tests, servers and the CLI.

use crate::history::{Blocker, History, HistoryAction, HistoryListener, HistoryLocation, Subscription};
use crate::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

struct Registry<T> {
    next_id: AtomicU64,
    items: Mutex<Vec<(u64, T)>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            items: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone + Send + 'static> Registry<T> {
    fn add(self: &Arc<Self>, item: T) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.items
            .lock()
            .expect("history registry mutex poisoned")
            .push((id, item));
        let weak = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry
                    .items
                    .lock()
                    .expect("history registry mutex poisoned")
                    .retain(|(i, _)| *i != id);
            }
        })
    }

    fn snapshot(&self) -> Vec<T> {
        self.items
            .lock()
            .expect("history registry mutex poisoned")
            .iter()
            .map(|(_, item)| item.clone())
            .collect()
    }
}

struct Entries {
    stack: Vec<HistoryLocation>,
    index: usize,
}

/// A history whose entries live in a vector.
pub struct MemoryHistory {
    entries: Mutex<Entries>,
    listeners: Arc<Registry<HistoryListener>>,
    blockers: Arc<Registry<Blocker>>,
}

impl MemoryHistory {
    /// Start with a single entry.
    pub fn new(initial: &str) -> Self {
        Self::with_entries(&[initial], 0)
    }

    /// Start with several entries, positioned at `index`.
    pub fn with_entries(hrefs: &[&str], index: usize) -> Self {
        let mut stack: Vec<HistoryLocation> = hrefs
            .iter()
            .map(|href| HistoryLocation::from_href(href, keyed_state(Value::object())))
            .collect();
        if stack.is_empty() {
            stack.push(HistoryLocation::from_href("/", keyed_state(Value::object())));
        }
        let index = index.min(stack.len() - 1);

        Self {
            entries: Mutex::new(Entries { stack, index }),
            listeners: Arc::new(Registry::default()),
            blockers: Arc::new(Registry::default()),
        }
    }

    /// Number of entries on the stack.
    pub fn len(&self) -> usize {
        self.lock().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().stack.is_empty()
    }

    pub fn index(&self) -> usize {
        self.lock().index
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().expect("history entries mutex poisoned")
    }

    fn blocked(&self, from: &HistoryLocation, to: &HistoryLocation) -> bool {
        let blocked = self.blockers.snapshot().iter().any(|b| b(from, to));
        if blocked {
            tracing::debug!(from = %from.href(), to = %to.href(), "History transition blocked");
        }
        blocked
    }

    fn notify(&self, location: &HistoryLocation, action: HistoryAction) {
        for listener in self.listeners.snapshot() {
            listener(location, action);
        }
    }

    fn write(&self, href: &str, state: Value, action: HistoryAction) -> bool {
        let next = HistoryLocation::from_href(href, keyed_state(state));
        let current = self.location();
        if self.blocked(&current, &next) {
            return false;
        }

        {
            let mut entries = self.lock();
            let index = entries.index;
            match action {
                HistoryAction::Push => {
                    entries.stack.truncate(index + 1);
                    entries.stack.push(next.clone());
                    entries.index = entries.stack.len() - 1;
                }
                _ => entries.stack[index] = next.clone(),
            }
        }

        self.notify(&next, action);
        true
    }
}

fn keyed_state(state: Value) -> Value {
    let state = if state.is_object() { state } else { Value::object() };
    if state.get("key").is_some() {
        state
    } else {
        state.with("key", uuid::Uuid::new_v4().simple().to_string()[..8].to_string())
    }
}

impl History for MemoryHistory {
    fn location(&self) -> HistoryLocation {
        let entries = self.lock();
        entries.stack[entries.index].clone()
    }

    fn push(&self, href: &str, state: Value) -> bool {
        self.write(href, state, HistoryAction::Push)
    }

    fn replace(&self, href: &str, state: Value) -> bool {
        self.write(href, state, HistoryAction::Replace)
    }

    fn go(&self, delta: isize) -> bool {
        let (current, target, next_index) = {
            let entries = self.lock();
            let next = entries.index as isize + delta;
            if delta == 0 || next < 0 || next as usize >= entries.stack.len() {
                return false;
            }
            (
                entries.stack[entries.index].clone(),
                entries.stack[next as usize].clone(),
                next as usize,
            )
        };

        if self.blocked(&current, &target) {
            return false;
        }

        self.lock().index = next_index;
        self.notify(&target, HistoryAction::Pop);
        true
    }

    fn listen(&self, listener: HistoryListener) -> Subscription {
        self.listeners.add(listener)
    }

    fn block(&self, blocker: Blocker) -> Subscription {
        self.blockers.add(blocker)
    }
}
