//! Process-wide table of live tap handlers, keyed by an opaque id.
//!
//! OS callbacks receive the id instead of a pointer. A callback clones the
//! handler out under the lock, so unregistering from another thread never
//! frees a handler that a running callback is still using.

#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use crate::hook::TapHandler;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) struct HandlerRegistry {
    next_id: AtomicUsize,
    handlers: Mutex<BTreeMap<usize, Arc<dyn TapHandler>>>,
}

impl HandlerRegistry {
    pub(crate) const fn new() -> Self {
        Self {
            // 0 is never issued so a null user info pointer maps to nothing.
            next_id: AtomicUsize::new(1),
            handlers: Mutex::new(BTreeMap::new()),
        }
    }

    fn handlers(&self) -> MutexGuard<'_, BTreeMap<usize, Arc<dyn TapHandler>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(&self, handler: Box<dyn TapHandler>) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers().insert(id, Arc::from(handler));
        id
    }

    pub(crate) fn get(&self, id: usize) -> Option<Arc<dyn TapHandler>> {
        self.handlers().get(&id).cloned()
    }

    /// Remove the handler. Callers already holding it keep it alive.
    pub(crate) fn unregister(&self, id: usize) -> bool {
        self.handlers().remove(&id).is_some()
    }
}
