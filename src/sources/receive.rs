//! # Core source trait
//!
//! [`Receive`] is the extension point for anything the watcher can observe.
//! The dispatch loop calls [`Receive::try_recv`] on every active source during
//! each scan, so implementations must never block.
//!
//! ## Contract
//! - `Value` hands one received item to the watcher (type-erased).
//! - `Empty` means nothing is ready right now; the source stays watched.
//! - `Closed` means nothing will ever arrive again; the watcher removes the
//!   source and notifies its callback once.
//!
//! Once a source reports `Closed` it is dropped and never polled again.
//!
//! ## Example
//! ```rust
//! use std::collections::VecDeque;
//! use chanwatch::{Receive, TryRecv};
//!
//! struct Script(VecDeque<u32>);
//!
//! impl Receive for Script {
//!     fn try_recv(&mut self) -> TryRecv {
//!         match self.0.pop_front() {
//!             Some(v) => TryRecv::Value(Box::new(v)),
//!             None => TryRecv::Closed,
//!         }
//!     }
//! }
//! ```

use crate::events::Payload;

/// Outcome of one non-blocking receive attempt.
pub enum TryRecv {
    /// A value arrived.
    Value(Payload),
    /// Nothing ready yet.
    Empty,
    /// The source is closed and drained.
    Closed,
}

impl std::fmt::Debug for TryRecv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TryRecv::Value(_) => f.write_str("Value(<any>)"),
            TryRecv::Empty => f.write_str("Empty"),
            TryRecv::Closed => f.write_str("Closed"),
        }
    }
}

/// Non-blocking, type-erased receive side of a channel-like source.
pub trait Receive: Send + 'static {
    /// Attempts to receive one value without waiting.
    fn try_recv(&mut self) -> TryRecv;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
