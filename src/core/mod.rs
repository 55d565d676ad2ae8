//! Watcher core: registration, shared tables and the dispatch loop.
//!
//! The public API from this module is [`Watcher`] and [`WatcherConfig`].
//!
//! Internal modules:
//! - [`watcher`]: validates registrations and starts the dispatch loop once;
//! - [`registry`]: lock-guarded pending/callback tables kept in lockstep;
//! - [`dispatcher`]: the single loop that waits, calls back and prunes sources;
//! - [`config`]: poll interval, capacity and thread name.

mod config;
mod dispatcher;
mod registry;
mod watcher;

pub use config::{DEFAULT_POLL_INTERVAL, MAX_CAPACITY, WatcherConfig};
pub use watcher::Watcher;
