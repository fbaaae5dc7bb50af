//! Keyboard listener registry with scoped (RAII) subscriptions.
//!
//! A listener is registered on one node of a [`Document`] and receives every
//! key event dispatched at that node or bubbling up through it.  Registering
//! returns a [`ListenerGuard`]; the listener stays installed exactly as long
//! as the guard is alive, so a subscription is released on every exit path
//! (explicit [`release`](ListenerGuard::release), drop, or unwinding).

use crate::dom::{Document, NodeId};
use crate::event::KeyboardEvent;
use crate::selector::SelectorError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Errors raised by a key listener.  They abort the dispatch that triggered
/// them and are returned to the dispatcher unmodified.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// An element query inside the listener failed.
    #[error("query failed: {0}")]
    Query(#[from] SelectorError),
    /// An application-defined listener failure.
    #[error("listener failed: {0}")]
    Handler(String),
}

/// A shared keyboard callback.
pub type KeyListener =
    Arc<dyn Fn(&mut KeyboardEvent, &mut Document) -> Result<(), ListenerError> + Send + Sync>;

/// Identity of a registered listener, unique within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    target: NodeId,
    listener: KeyListener,
}

#[derive(Default)]
struct Table {
    next_id: u64,
    // Vec keeps registration order, which is invocation order.
    entries: Vec<Entry>,
}

fn lock(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-document listener storage.  Guards hold a weak reference so that
/// dropping a guard after its document is gone is harmless.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    table: Arc<Mutex<Table>>,
}

impl ListenerRegistry {
    pub(crate) fn add(&self, target: NodeId, listener: KeyListener) -> ListenerGuard {
        let mut table = lock(&self.table);
        let id = ListenerId(table.next_id);
        table.next_id += 1;
        table.entries.push(Entry {
            id,
            target,
            listener,
        });
        tracing::trace!(message = "listener.add", listener = id.0, node = %target);
        ListenerGuard {
            id,
            target,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Listeners currently registered on `target`, in registration order.
    pub(crate) fn snapshot(&self, target: NodeId) -> Vec<(ListenerId, KeyListener)> {
        lock(&self.table)
            .entries
            .iter()
            .filter(|entry| entry.target == target)
            .map(|entry| (entry.id, Arc::clone(&entry.listener)))
            .collect()
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        lock(&self.table).entries.iter().any(|entry| entry.id == id)
    }

    pub(crate) fn count(&self, target: NodeId) -> usize {
        lock(&self.table)
            .entries
            .iter()
            .filter(|entry| entry.target == target)
            .count()
    }
}

/// Keeps one listener registered.  Dropping the guard unregisters it.
#[must_use = "dropping the guard immediately unregisters the listener"]
pub struct ListenerGuard {
    id: ListenerId,
    target: NodeId,
    table: Weak<Mutex<Table>>,
}

impl ListenerGuard {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// The node the listener is registered on.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Unregister the listener now.
    pub fn release(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(table) = self.table.upgrade() {
            let mut table = lock(&table);
            let before = table.entries.len();
            table.entries.retain(|entry| entry.id != self.id);
            if table.entries.len() != before {
                tracing::trace!(message = "listener.remove", listener = self.id.0, node = %self.target);
            }
        }
        self.table = Weak::new();
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("live", &(self.table.strong_count() > 0))
            .finish()
    }
}
