//! Callback events: the data handed to every callback invocation.
//!
//! ## Contents
//! - [`Event`] value or closure notification with the registration parameter
//! - [`Payload`], [`Param`] the type-erased value and parameter carriers
//!
//! Events are produced only by the dispatch loop (see `core/dispatcher.rs`).

mod event;

pub use event::{Event, Param, Payload};
