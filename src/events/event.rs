//! # Events delivered to callbacks.
//!
//! Each callback invocation receives one [`Event`]:
//! - **value events** (`delivered = true`): a value arrived on the source;
//! - **closure events** (`delivered = false`): the source closed, `value` is `None`.
//!
//! Values and parameters are type-erased. Use the typed accessors to get them back.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use chanwatch::Event;
//!
//! let ev = Event::received(Box::new(7_i32), Arc::new("orders"));
//!
//! assert!(ev.delivered);
//! assert_eq!(ev.value_ref::<i32>(), Some(&7));
//! assert_eq!(ev.param_ref::<&str>(), Some(&"orders"));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased value received from a source.
pub type Payload = Box<dyn Any + Send>;

/// Opaque parameter supplied at registration, passed through unchanged.
pub type Param = Arc<dyn Any + Send + Sync>;

/// One delivery to a callback.
pub struct Event {
    /// Received value; `None` on closure events.
    pub value: Option<Payload>,
    /// `true` when a value arrived, `false` when the source closed.
    pub delivered: bool,
    /// The parameter given to `add` for this source.
    pub param: Param,
}

impl Event {
    /// Creates a value event.
    pub fn received(value: Payload, param: Param) -> Self {
        Self {
            value: Some(value),
            delivered: true,
            param,
        }
    }

    /// Creates a closure event.
    pub fn closed(param: Param) -> Self {
        Self {
            value: None,
            delivered: false,
            param,
        }
    }

    /// Borrows the value as `T`, if present and of that type.
    #[inline]
    pub fn value_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Takes the value out as `T`.
    ///
    /// On a type mismatch the value is put back and `None` is returned.
    pub fn take_value<T: Any>(&mut self) -> Option<T> {
        let value = self.value.take()?;
        match value.downcast::<T>() {
            Ok(v) => Some(*v),
            Err(original) => {
                self.value = Some(original);
                None
            }
        }
    }

    /// Borrows the registration parameter as `T`.
    #[inline]
    pub fn param_ref<T: Any>(&self) -> Option<&T> {
        self.param.downcast_ref::<T>()
    }

    /// Returns `true` for the closure notification (`delivered == false`).
    #[inline]
    pub fn is_closed(&self) -> bool {
        !self.delivered
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("value", &self.value.as_ref().map(|_| "<any>"))
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}
