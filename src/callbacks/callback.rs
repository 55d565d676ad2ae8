//! # Core callback trait
//!
//! `Callback` is the extension point invoked by the dispatch loop for every
//! event on a watched source. All callbacks of one watcher run on the same
//! dispatch thread, one at a time.
//!
//! ## Contract
//! - `Ok(())` keeps the source watched.
//! - Any `Err` removes the source; no closure event follows. Return
//!   [`CallbackError::Quit`] when there is nothing better to say.
//! - On a closure event (`delivered = false`) the return value is ignored.
//! - A slow callback delays every other source of the same watcher.
//!
//! ## Example
//! ```rust
//! use chanwatch::{Callback, CallbackError, Event};
//!
//! struct Printer;
//!
//! impl Callback for Printer {
//!     fn on_event(&self, event: Event) -> Result<(), CallbackError> {
//!         if event.delivered {
//!             println!("value: {:?}", event.value_ref::<u32>());
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::error::CallbackError;
use crate::events::Event;

/// Result returned by callbacks.
pub type CallbackResult = Result<(), CallbackError>;

/// Contract for event callbacks.
///
/// Closures `Fn(Event) -> CallbackResult` implement this trait.
pub trait Callback: Send + Sync + 'static {
    /// Handles one event for the source this callback was registered with.
    fn on_event(&self, event: Event) -> CallbackResult;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Callback for F
where
    F: Fn(Event) -> CallbackResult + Send + Sync + 'static,
{
    fn on_event(&self, event: Event) -> CallbackResult {
        self(event)
    }
}

/// Conversion performed by `add`; `None` means the callback is missing.
pub trait IntoCallback {
    fn into_callback(self) -> Option<Arc<dyn Callback>>;
}

impl<C: Callback> IntoCallback for C {
    fn into_callback(self) -> Option<Arc<dyn Callback>> {
        Some(Arc::new(self))
    }
}

impl<C: Callback> IntoCallback for Option<C> {
    fn into_callback(self) -> Option<Arc<dyn Callback>> {
        self.map(|c| Arc::new(c) as Arc<dyn Callback>)
    }
}

/// Already shared callbacks are registered as-is, without another allocation.
impl IntoCallback for Arc<dyn Callback> {
    fn into_callback(self) -> Option<Arc<dyn Callback>> {
        Some(self)
    }
}

impl IntoCallback for Option<Arc<dyn Callback>> {
    fn into_callback(self) -> Option<Arc<dyn Callback>> {
        self
    }
}
