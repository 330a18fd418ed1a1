//! Message Dedup Cache
//!
//! Bounded FIFO set of webhook message ids. WhatsApp retries a delivery
//! when the acknowledgement is slow; the retry carries the same id and
//! is dropped here. Once more than `capacity` distinct ids have been
//! seen the oldest is forgotten, so a very late retry can slip through.

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Default number of ids remembered
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Default)]
struct Inner {
    order: VecDeque<String>,
    ids: HashSet<String>,
}

/// Shared recency set of processed message ids
pub struct MessageDedup {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl MessageDedup {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Whether the id is currently remembered
    pub fn seen(&self, id: &str) -> bool {
        self.inner.lock().ids.contains(id)
    }

    /// Remember an id, evicting the oldest entry past capacity
    pub fn remember(&self, id: &str) {
        let mut inner = self.inner.lock();
        Self::insert(&mut inner, self.capacity, id);
    }

    /// Atomic check-then-remember.
    ///
    /// Returns `true` the first time an id is offered, `false` for a repeat.
    pub fn check_and_remember(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.ids.contains(id) {
            debug!("Duplicate delivery ignored: {}", id);
            return false;
        }
        Self::insert(&mut inner, self.capacity, id);
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(inner: &mut Inner, capacity: usize, id: &str) {
        if !inner.ids.insert(id.to_string()) {
            return;
        }
        inner.order.push_back(id.to_string());
        while inner.order.len() > capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.ids.remove(&oldest);
            }
        }
    }
}

impl Default for MessageDedup {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
