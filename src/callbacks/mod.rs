//! # Callbacks invoked by the dispatch loop.
//!
//! This module provides the [`Callback`] trait, the [`CallbackResult`] alias and
//! the [`IntoCallback`] conversion used by registration.
//!
//! ```text
//! dispatch loop
//!     ├─ value on source i  ─► callback_i.on_event(Event{value, delivered: true, param})
//!     │                           ├─ Ok(())  ─► keep source i
//!     │                           └─ Err(_)  ─► remove source i (no closure event)
//!     └─ source i closed    ─► remove source i
//!                             └─► callback_i.on_event(Event{None, delivered: false, param})
//!                                    (result ignored)
//! ```

mod callback;

pub use callback::{Callback, CallbackResult, IntoCallback};
