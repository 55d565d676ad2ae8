//! # Channel adapters and registration-time validation.
//!
//! [`IntoSource`] turns whatever the caller hands to `add` into a boxed
//! [`Receive`], or rejects it with the matching [`WatchError`]:
//!
//! ```text
//! tokio mpsc / unbounded / broadcast / watch receivers ─┐
//! futures mpsc / unbounded receivers                   ├─► Ok(Box<dyn Receive>)
//! std::sync::mpsc::Receiver, Box<dyn Receive>         ─┘
//!
//! any matching sender                                  ──► Err(NotReceivable)
//! None                                                 ──► Err(InvalidArgument)
//! Box<dyn Any + Send> without a Box<dyn Receive> in it ──► Err(NotAChannel)
//! ```
//!
//! ## Closure semantics per channel
//! - **tokio mpsc**: closed once every sender is dropped and the buffer is drained.
//! - **tokio broadcast**: same; a lagging receiver skips the overwritten items.
//! - **tokio watch**: each observed version change yields the current value
//!   (intermediate values may be coalesced); closed once the sender is dropped.
//! - **futures mpsc**, **std mpsc**: closed once every sender is dropped and drained.

use std::any::Any;
use std::sync::mpsc as std_mpsc;

use futures::channel::mpsc as futures_mpsc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::debug;

use super::receive::{Receive, TryRecv};
use crate::error::WatchError;

/// Conversion performed by `add` before anything is registered.
pub trait IntoSource {
    /// Validates `self` and boxes its receive side.
    fn into_source(self) -> Result<Box<dyn Receive>, WatchError>;
}

impl<T: Send + 'static> Receive for mpsc::Receiver<T> {
    fn try_recv(&mut self) -> TryRecv {
        match mpsc::Receiver::try_recv(self) {
            Ok(v) => TryRecv::Value(Box::new(v)),
            Err(mpsc::error::TryRecvError::Empty) => TryRecv::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => TryRecv::Closed,
        }
    }
}

impl<T: Send + 'static> Receive for mpsc::UnboundedReceiver<T> {
    fn try_recv(&mut self) -> TryRecv {
        match mpsc::UnboundedReceiver::try_recv(self) {
            Ok(v) => TryRecv::Value(Box::new(v)),
            Err(mpsc::error::TryRecvError::Empty) => TryRecv::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => TryRecv::Closed,
        }
    }
}

impl<T: Clone + Send + 'static> Receive for broadcast::Receiver<T> {
    fn try_recv(&mut self) -> TryRecv {
        loop {
            match broadcast::Receiver::try_recv(self) {
                Ok(v) => return TryRecv::Value(Box::new(v)),
                Err(broadcast::error::TryRecvError::Empty) => return TryRecv::Empty,
                Err(broadcast::error::TryRecvError::Closed) => return TryRecv::Closed,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "broadcast source lagged; skipping to oldest retained value");
                }
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Receive for watch::Receiver<T> {
    fn try_recv(&mut self) -> TryRecv {
        match self.has_changed() {
            Ok(true) => TryRecv::Value(Box::new(self.borrow_and_update().clone())),
            Ok(false) => TryRecv::Empty,
            Err(_) => TryRecv::Closed,
        }
    }
}

impl<T: Send + 'static> Receive for futures_mpsc::Receiver<T> {
    fn try_recv(&mut self) -> TryRecv {
        match futures_mpsc::Receiver::try_recv(self) {
            Ok(v) => TryRecv::Value(Box::new(v)),
            Err(futures_mpsc::TryRecvError::Empty) => TryRecv::Empty,
            Err(futures_mpsc::TryRecvError::Closed) => TryRecv::Closed,
        }
    }
}

impl<T: Send + 'static> Receive for futures_mpsc::UnboundedReceiver<T> {
    fn try_recv(&mut self) -> TryRecv {
        match futures_mpsc::UnboundedReceiver::try_recv(self) {
            Ok(v) => TryRecv::Value(Box::new(v)),
            Err(futures_mpsc::TryRecvError::Empty) => TryRecv::Empty,
            Err(futures_mpsc::TryRecvError::Closed) => TryRecv::Closed,
        }
    }
}

impl<T: Send + 'static> Receive for std_mpsc::Receiver<T> {
    fn try_recv(&mut self) -> TryRecv {
        match std_mpsc::Receiver::try_recv(self) {
            Ok(v) => TryRecv::Value(Box::new(v)),
            Err(std_mpsc::TryRecvError::Empty) => TryRecv::Empty,
            Err(std_mpsc::TryRecvError::Disconnected) => TryRecv::Closed,
        }
    }
}

macro_rules! receivable {
    ($($ty:ty => [$($bound:tt)+]),+ $(,)?) => {
        $(
            impl<T: $($bound)+> IntoSource for $ty {
                fn into_source(self) -> Result<Box<dyn Receive>, WatchError> {
                    Ok(Box::new(self))
                }
            }
        )+
    };
}

macro_rules! send_only {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl<T> IntoSource for $ty {
                fn into_source(self) -> Result<Box<dyn Receive>, WatchError> {
                    Err(WatchError::NotReceivable)
                }
            }
        )+
    };
}

receivable! {
    mpsc::Receiver<T> => [Send + 'static],
    mpsc::UnboundedReceiver<T> => [Send + 'static],
    broadcast::Receiver<T> => [Clone + Send + 'static],
    watch::Receiver<T> => [Clone + Send + Sync + 'static],
    futures_mpsc::Receiver<T> => [Send + 'static],
    futures_mpsc::UnboundedReceiver<T> => [Send + 'static],
    std_mpsc::Receiver<T> => [Send + 'static],
}

send_only! {
    mpsc::Sender<T>,
    mpsc::UnboundedSender<T>,
    mpsc::WeakSender<T>,
    broadcast::Sender<T>,
    watch::Sender<T>,
    futures_mpsc::Sender<T>,
    futures_mpsc::UnboundedSender<T>,
    std_mpsc::Sender<T>,
    std_mpsc::SyncSender<T>,
}

impl IntoSource for Box<dyn Receive> {
    fn into_source(self) -> Result<Box<dyn Receive>, WatchError> {
        Ok(self)
    }
}

impl<S: IntoSource> IntoSource for Option<S> {
    fn into_source(self) -> Result<Box<dyn Receive>, WatchError> {
        match self {
            Some(s) => s.into_source(),
            None => Err(WatchError::InvalidArgument),
        }
    }
}

/// Dynamic path: the erased value must hold a `Box<dyn Receive>`.
impl IntoSource for Box<dyn Any + Send> {
    fn into_source(self) -> Result<Box<dyn Receive>, WatchError> {
        self.downcast::<Box<dyn Receive>>()
            .map(|inner| *inner)
            .map_err(|_| WatchError::NotAChannel)
    }
}
