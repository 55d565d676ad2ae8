//! Error types used by the watcher and by callbacks.
//!
//! This module defines two main error enums:
//!
//! - [`WatchError`]: errors returned synchronously by registration.
//! - [`CallbackError`]: errors returned by callbacks to stop watching a source.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging
//! and additional utilities such as [`WatchError::is_retryable`].

use thiserror::Error;

/// # Errors produced by registration.
///
/// Argument errors (`InvalidArgument`, `NotAChannel`, `NotReceivable`) mean the
/// call itself must be corrected. `CapacityExceeded` is transient: it may succeed
/// later once other sources close or stop.
///
/// No variant mutates watcher state: a failed registration leaves every table as it was.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WatchError {
    /// Source or callback was missing.
    #[error("input param illegal")]
    InvalidArgument,

    /// The type-erased source does not hold a channel-like value.
    #[error("source is not a channel")]
    NotAChannel,

    /// The source is a send-only endpoint and cannot be received from.
    #[error("channel is not receivable")]
    NotReceivable,

    /// The watcher already holds as many sources as its capacity allows.
    #[error("watcher is full (sources >= {capacity})")]
    CapacityExceeded {
        /// The configured capacity bound.
        capacity: usize,
    },

    /// The dispatch thread or its runtime could not be created.
    #[error("failed to start dispatch loop: {source}")]
    Spawn {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl WatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use chanwatch::WatchError;
    ///
    /// let err = WatchError::CapacityExceeded { capacity: 8 };
    /// assert_eq!(err.as_label(), "watch_capacity_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchError::InvalidArgument => "watch_invalid_argument",
            WatchError::NotAChannel => "watch_not_a_channel",
            WatchError::NotReceivable => "watch_not_receivable",
            WatchError::CapacityExceeded { .. } => "watch_capacity_exceeded",
            WatchError::Spawn { .. } => "watch_spawn_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WatchError::InvalidArgument => "source or callback missing".to_string(),
            WatchError::NotAChannel => "value is not channel-like".to_string(),
            WatchError::NotReceivable => "send-only channel endpoint".to_string(),
            WatchError::CapacityExceeded { capacity } => {
                format!("capacity {capacity} reached")
            }
            WatchError::Spawn { source } => format!("spawn: {source}"),
        }
    }

    /// Indicates whether repeating the same call later may succeed.
    ///
    /// Returns `true` only for [`WatchError::CapacityExceeded`].
    ///
    /// # Example
    /// ```
    /// use chanwatch::WatchError;
    ///
    /// assert!(WatchError::CapacityExceeded { capacity: 2 }.is_retryable());
    /// assert!(!WatchError::NotReceivable.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, WatchError::CapacityExceeded { .. })
    }
}

/// # Errors returned by callbacks.
///
/// Any `Err` returned from a callback removes its source from the watcher; the
/// variant is never used to decide anything else. Callbacks with nothing
/// meaningful to report should return [`CallbackError::Quit`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CallbackError {
    /// Explicit request to stop watching the source.
    #[error("explicit quit")]
    Quit,

    /// Callback failed; the source is removed.
    #[error("callback failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl CallbackError {
    /// Builds a [`CallbackError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        CallbackError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Quit => "callback_quit",
            CallbackError::Fail { .. } => "callback_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallbackError::Quit => "explicit quit".to_string(),
            CallbackError::Fail { error } => format!("error: {error}"),
        }
    }
}

impl From<anyhow::Error> for CallbackError {
    fn from(err: anyhow::Error) -> Self {
        CallbackError::Fail {
            error: format!("{err:#}"),
        }
    }
}
