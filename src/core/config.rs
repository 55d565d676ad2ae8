//! # Watcher configuration.
//!
//! Provides [`WatcherConfig`], the settings of one watcher and of its dispatch loop.
//!
//! ## Sentinel values
//! - `poll_interval = 0s` → clamped to 1ms (the idle branch must yield)
//! - `capacity` outside `2..=65_534` → clamped into that range

use std::time::Duration;

/// Hard upper bound on concurrently registered sources, plus one idle slot.
pub const MAX_CAPACITY: usize = 65_534;

/// Default sleep after an idle wait.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for a [`Watcher`](crate::Watcher).
///
/// ## Field semantics
/// - `poll_interval`: sleep after each idle wait; bounds registration-to-first-delivery latency
/// - `capacity`: registration fails once pending + active + 1 would reach it
/// - `thread_name`: name of the dedicated dispatch thread
///
/// ## Notes
/// All fields are public. Prefer the helper accessors, which apply the clamping rules.
#[derive(Clone, Debug)]
pub struct WatcherConfig {
    /// Sleep between an idle wait and the next scan.
    pub poll_interval: Duration,

    /// Capacity bound on registered sources (the idle slot counts as one).
    ///
    /// With the default, at most 65 533 sources can be registered at once.
    pub capacity: usize,

    /// Name of the dispatch thread (shows up in debuggers and panics).
    pub thread_name: String,
}

impl WatcherConfig {
    /// Returns the poll interval, never zero.
    #[inline]
    pub fn poll_interval_clamped(&self) -> Duration {
        if self.poll_interval.is_zero() {
            Duration::from_millis(1)
        } else {
            self.poll_interval
        }
    }

    /// Returns the capacity clamped to `2..=MAX_CAPACITY`.
    #[inline]
    pub fn capacity_clamped(&self) -> usize {
        self.capacity.clamp(2, MAX_CAPACITY)
    }
}

impl Default for WatcherConfig {
    /// Default configuration:
    ///
    /// - `poll_interval = 10ms`
    /// - `capacity = 65_534`
    /// - `thread_name = "chanwatch-dispatch"`
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            capacity: MAX_CAPACITY,
            thread_name: "chanwatch-dispatch".to_string(),
        }
    }
}
