//! # Dispatcher: the single loop that waits, delivers and prunes.
//!
//! One dispatcher runs per watcher, on a dedicated thread driving a
//! single-threaded tokio runtime. It is the only code that polls sources or
//! calls callbacks, so callbacks never overlap.
//!
//! ## Loop
//! ```text
//! loop {
//!   wait(): scan active sources with try_recv(), from the round-robin cursor
//!     ├─ Idle (nothing ready)
//!     │     ├─ lock: active += pending (in order), pending = []
//!     │     └─ sleep(poll_interval)
//!     ├─ Value(i, v)
//!     │     ├─ lock: (callback_i, param_i)
//!     │     └─ callback_i(Event{v, true, param_i})
//!     │           ├─ Ok   ─► keep
//!     │           └─ Err  ─► lock: remove i          (no closure event)
//!     └─ Closed(i)
//!           ├─ lock: remove i
//!           └─ callback_i(Event{None, false, param_i}) (result ignored)
//! }
//! ```
//!
//! ## Fairness
//! Every scan starts at a cursor just past the last source served and wraps
//! around; the first ready source wins. With `k` sources continuously ready,
//! each one is served once every `k` iterations, wherever it sits in the
//! active set. There is no ordering across sources. Values from a single
//! source arrive in the order the source yields them.
//!
//! A source whose `try_recv` panics is treated as closed.
//!
//! ## Latency
//! A new source is merged on the next idle wait, so first delivery lags
//! registration by at most one poll interval plus the time spent in
//! callbacks. While some source stays continuously ready, merging waits.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::registry::Entry;
use super::watcher::Shared;
use crate::callbacks::{Callback, CallbackResult};
use crate::error::{CallbackError, WatchError};
use crate::events::{Event, Payload};
use crate::sources::{Receive, TryRecv};

/// Outcome of one multi-way wait.
enum Ready {
    Idle,
    Value(usize, Payload),
    Closed(usize),
}

/// Owner of the active sources and driver of the dispatch loop.
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
    active: Vec<Box<dyn Receive>>,
    /// Index the next scan starts at.
    cursor: usize,
    poll_interval: Duration,
}

impl Dispatcher {
    /// Spawns the dispatch thread for `shared`.
    ///
    /// The thread runs for the rest of the process; its handle is detached.
    pub(crate) fn spawn(shared: Arc<Shared>) -> Result<(), WatchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let name = shared.config.thread_name.clone();
        let dispatcher = Dispatcher {
            poll_interval: shared.config.poll_interval_clamped(),
            shared,
            active: Vec::new(),
            cursor: 0,
        };

        std::thread::Builder::new()
            .name(name)
            .spawn(move || runtime.block_on(dispatcher.run()))?;
        Ok(())
    }

    async fn run(mut self) {
        info!(
            poll_interval = ?self.poll_interval,
            capacity = self.shared.config.capacity_clamped(),
            "dispatch loop started"
        );

        loop {
            match self.wait() {
                Ready::Idle => {
                    self.merge_pending();
                    tokio::time::sleep(self.poll_interval).await;
                }
                Ready::Value(i, value) => self.deliver(i, value),
                Ready::Closed(i) => self.close(i),
            }
        }
    }

    /// Non-blocking multi-way wait over the active sources.
    fn wait(&mut self) -> Ready {
        let n = self.active.len();
        if n == 0 {
            return Ready::Idle;
        }

        let start = self.cursor % n;
        for k in 0..n {
            let i = (start + k) % n;
            let ready = match poll(self.active[i].as_mut()) {
                TryRecv::Value(v) => Ready::Value(i, v),
                TryRecv::Closed => Ready::Closed(i),
                TryRecv::Empty => continue,
            };
            self.cursor = i + 1;
            return ready;
        }
        Ready::Idle
    }

    /// Appends every pending source to the active set.
    fn merge_pending(&mut self) {
        let mut registry = self.shared.lock();
        let batch = registry.take_pending();
        if batch.is_empty() {
            return;
        }
        let merged = batch.len();
        self.active.extend(batch);
        debug!(merged, active = self.active.len(), "merged pending sources");
    }

    /// Value path: call back, drop the source if the callback declines.
    fn deliver(&mut self, i: usize, value: Payload) {
        let Some((callback, param)) = self.shared.lock().entry(i) else {
            return;
        };

        if let Err(err) = invoke(&callback, Event::received(value, param)) {
            let name = self.remove(i).map(|s| s.name());
            debug!(
                source = name.unwrap_or("unknown"),
                reason = err.as_label(),
                "callback declined further events; source removed"
            );
        }
    }

    /// Closure path: remove first, then notify once.
    fn close(&mut self, i: usize) {
        let Some((source, entry)) = self.remove_with_entry(i) else {
            return;
        };
        debug!(source = source.name(), "source closed; removed");
        drop(source);

        // Source is already gone; nothing left to cancel.
        let _ = invoke(&entry.callback, Event::closed(entry.param));
    }

    fn remove(&mut self, i: usize) -> Option<Box<dyn Receive>> {
        self.remove_with_entry(i).map(|(source, _)| source)
    }

    fn remove_with_entry(
        &mut self,
        i: usize,
    ) -> Option<(Box<dyn Receive>, Entry)> {
        let mut registry = self.shared.lock();
        let entry = registry.remove(i)?;
        let source = self.active.remove(i);
        if self.cursor > i {
            self.cursor -= 1;
        }
        Some((source, entry))
    }
}

/// Polls one source, turning a panic into closure.
fn poll(source: &mut dyn Receive) -> TryRecv {
    match panic::catch_unwind(AssertUnwindSafe(|| source.try_recv())) {
        Ok(outcome) => outcome,
        Err(panic_err) => {
            let info = panic_message(&*panic_err);
            warn!(source = source.name(), info = %info, "source panicked; treating as closed");
            TryRecv::Closed
        }
    }
}

/// Calls the callback, turning a panic into a removal request.
fn invoke(callback: &Arc<dyn Callback>, event: Event) -> CallbackResult {
    match panic::catch_unwind(AssertUnwindSafe(|| callback.on_event(event))) {
        Ok(result) => result,
        Err(panic_err) => {
            let info = panic_message(&*panic_err);
            warn!(callback = callback.name(), info = %info, "callback panicked");
            Err(CallbackError::Fail {
                error: format!("panicked: {info}"),
            })
        }
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
