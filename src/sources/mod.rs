//! # Watched sources.
//!
//! This module provides the [`Receive`] trait the dispatch loop polls, and the
//! [`IntoSource`] conversion that validates what callers pass to `add`.
//!
//! ## Architecture
//! ```text
//! add(source, ..)
//!     └─► IntoSource::into_source()
//!             ├─ Ok(Box<dyn Receive>) ─► pending table ─► active table
//!             │                                              │
//!             │                    dispatch scan ─► try_recv() per source
//!             │                                              ├─ Value
//!             │                                              ├─ Empty
//!             │                                              └─ Closed
//!             └─ Err(WatchError) ─► returned to the caller, nothing registered
//! ```

mod adapters;
mod receive;

pub use adapters::IntoSource;
pub use receive::{Receive, TryRecv};
