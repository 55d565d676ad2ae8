//! # chanwatch
//!
//! **chanwatch** watches a runtime-varying set of channel receivers and calls a
//! registered callback for every value (or closure) on any of them, from one
//! dispatch loop.
//!
//! Callers register sources one at a time, from any thread, without knowing the
//! full set up front and without spawning a waiting task per source.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller A          caller B          caller C
//!  add(rx_a, cb_a)   add(rx_b, cb_b)   add(rx_c, cb_c)
//!        │                 │                 │
//!        ▼                 ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Watcher (one lock)                                           │
//! │  - validate: IntoCallback / IntoSource                        │
//! │  - start dispatch thread once                                 │
//! │  - Registry: callback table + pending table                   │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │ merged on idle
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Dispatcher (dedicated thread, single-threaded tokio runtime) │
//! │  active: [rx_a, rx_b, rx_c, ...]                              │
//! │  scan try_recv() round-robin from a cursor                    │
//! └──────┬─────────────────────┬─────────────────────┬────────────┘
//!        ▼                     ▼                     ▼
//!      Idle                 Value(i)              Closed(i)
//!   merge pending        cb_i(Event{v,true})    remove i
//!   sleep(interval)      Err ─► remove i        cb_i(Event{_,false})
//! ```
//!
//! ### Lifecycle of a source
//! ```text
//! add() ──► pending ──(idle wait)──► active ──┬─ producer closes ─► removed ─► one closure event
//!                                             └─ callback Err    ─► removed (no closure event)
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                     |
//! |-------------------|------------------------------------------------------------|----------------------------------------|
//! | **Registration**  | Add sources at any time, from any thread.                  | [`add`], [`Watcher`]                   |
//! | **Sources**       | tokio, futures and std channels, or custom receivers.      | [`Receive`], [`IntoSource`]            |
//! | **Callbacks**     | Closures or types; `Err` stops watching the source.        | [`Callback`], [`CallbackResult`]       |
//! | **Events**        | Type-erased value, delivery flag and registration param.   | [`Event`]                              |
//! | **Errors**        | Typed registration and callback errors.                    | [`WatchError`], [`CallbackError`]      |
//! | **Configuration** | Poll interval, capacity, dispatch thread name.             | [`WatcherConfig`]                      |
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use chanwatch::{CallbackError, CallbackResult, Event};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let log = Arc::clone(&seen);
//!
//! let (tx, rx) = tokio::sync::mpsc::channel::<u32>(4);
//! chanwatch::add(rx, move |ev: Event| -> CallbackResult {
//!     match ev.value_ref::<u32>() {
//!         Some(&0) => Err(CallbackError::Quit),
//!         Some(&v) => { log.lock().unwrap().push(v); Ok(()) }
//!         None => Ok(()), // closed
//!     }
//! }, "numbers")?;
//!
//! tx.try_send(3).unwrap();
//! tx.try_send(0).unwrap();
//!
//! while seen.lock().unwrap().is_empty() {
//!     std::thread::sleep(Duration::from_millis(5));
//! }
//! assert_eq!(*seen.lock().unwrap(), vec![3]);
//! # Ok::<(), chanwatch::WatchError>(())
//! ```

mod callbacks;
mod core;
mod error;
mod events;
mod sources;

// ---- Public re-exports ----

pub use callbacks::{Callback, CallbackResult, IntoCallback};
pub use crate::core::{DEFAULT_POLL_INTERVAL, MAX_CAPACITY, Watcher, WatcherConfig};
pub use error::{CallbackError, WatchError};
pub use events::{Event, Param, Payload};
pub use sources::{IntoSource, Receive, TryRecv};

/// Registers `source` with the process-global watcher.
///
/// The global watcher is created with [`WatcherConfig::default`] and its dispatch
/// loop starts on the first successful call. See [`Watcher::add`] for errors and
/// delivery rules.
pub fn add<S, C, P>(source: S, callback: C, param: P) -> Result<(), WatchError>
where
    S: IntoSource,
    C: IntoCallback,
    P: std::any::Any + Send + Sync,
{
    Watcher::global().add(source, callback, param)
}
