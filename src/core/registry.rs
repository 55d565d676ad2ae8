//! # Source registry - the tables shared by registration and the dispatch loop.
//!
//! The registry holds everything guarded by the watcher's single lock:
//! - the **callback table**: one [`Entry`] per registered source;
//! - the **pending table**: sources registered but not yet merged;
//! - the **active count**: how many sources the dispatch loop is scanning;
//! - the **start flag**: whether the dispatch loop was spawned.
//!
//! The active sources themselves are owned by the dispatch loop, which is the
//! only code that ever polls them.
//!
//! ## Layout
//! ```text
//! entries:  [ a0 a1 a2 ... a(k-1) | p0 p1 ... p(m-1) ]
//!             └── active (k) ───┘  └── pending (m) ┘
//! active:   [ s0 s1 s2 ... s(k-1) ]        (dispatch loop)
//! pending:  [ q0 q1 ... q(m-1) ]           (registry)
//! ```
//!
//! ## Rules
//! - `entries[i]` serves active source `i` for `i < active_len`.
//! - `entries[active_len + j]` serves `pending[j]`.
//! - A merge moves the whole pending batch, in order, behind the active
//!   sources; the entries already sit in the right place.
//! - A removal deletes index `i` from both the entries and the active sources.

use std::sync::Arc;

use crate::callbacks::Callback;
use crate::error::WatchError;
use crate::events::Param;
use crate::sources::Receive;

/// Callback and parameter of one registered source.
pub(crate) struct Entry {
    pub(crate) callback: Arc<dyn Callback>,
    pub(crate) param: Param,
}

impl Entry {
    pub(crate) fn new(callback: Arc<dyn Callback>, param: Param) -> Self {
        Self { callback, param }
    }
}

/// Lock-guarded tables of one watcher.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Entry>,
    pending: Vec<Box<dyn Receive>>,
    active_len: usize,
    pub(crate) started: bool,
}

impl Registry {
    /// Number of registered sources (active + pending).
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.active_len + self.pending.len()
    }

    /// Appends a source to the pending table and its entry to the callback table.
    ///
    /// Fails without touching anything when the registration would reach `capacity`
    /// (the idle slot counts as one).
    pub(crate) fn register(
        &mut self,
        source: Box<dyn Receive>,
        entry: Entry,
        capacity: usize,
    ) -> Result<(), WatchError> {
        if self.len() + 1 >= capacity {
            return Err(WatchError::CapacityExceeded { capacity });
        }
        self.entries.push(entry);
        self.pending.push(source);
        Ok(())
    }

    /// Moves the pending batch to the active side and returns it in registration order.
    pub(crate) fn take_pending(&mut self) -> Vec<Box<dyn Receive>> {
        let batch = std::mem::take(&mut self.pending);
        self.active_len += batch.len();
        batch
    }

    /// Returns the callback and parameter for active index `i`.
    pub(crate) fn entry(&self, i: usize) -> Option<(Arc<dyn Callback>, Param)> {
        if i >= self.active_len {
            return None;
        }
        self.entries
            .get(i)
            .map(|e| (Arc::clone(&e.callback), Arc::clone(&e.param)))
    }

    /// Removes the entry of active index `i`.
    pub(crate) fn remove(&mut self, i: usize) -> Option<Entry> {
        if i >= self.active_len {
            return None;
        }
        self.active_len -= 1;
        Some(self.entries.remove(i))
    }

    #[cfg(test)]
    pub(crate) fn active_len(&self) -> usize {
        self.active_len
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
