//! # Watcher: registration front-end and lazy start of the dispatch loop.
//!
//! A [`Watcher`] owns one lock-guarded [`Registry`] and, once the first source
//! is accepted, one dispatch thread. Registration is the only operation:
//! there is no remove, stop or close. A source leaves the watcher when it
//! closes or when its callback returns `Err`.
//!
//! ## Registration path
//! ```text
//! add(source, callback, param)
//!   ├─► callback.into_callback()  ── None ──► Err(InvalidArgument)
//!   ├─► source.into_source()      ── Err  ──► Err(InvalidArgument | NotAChannel | NotReceivable)
//!   ├─► ensure_started()          (once; spawns the dispatch thread)
//!   └─► lock
//!         ├─ pending + active + 1 >= capacity ──► Err(CapacityExceeded)
//!         └─ entries.push(callback, param); pending.push(source) ──► Ok(())
//! ```
//!
//! ## Rules
//! - Validation happens before anything is started or mutated.
//! - The dispatch thread is started at most once per watcher, even under
//!   concurrent first calls; a failed spawn leaves the flag unset.
//! - Registration never waits on a callback: callbacks run outside the lock.
//!
//! ## Example
//! ```rust
//! use chanwatch::{CallbackResult, Event, Watcher, WatcherConfig};
//!
//! let watcher = Watcher::new(WatcherConfig::default());
//! let (tx, rx) = tokio::sync::mpsc::channel::<u32>(1);
//!
//! watcher
//!     .add(rx, |ev: Event| -> CallbackResult {
//!         println!("{:?} delivered={}", ev.value_ref::<u32>(), ev.delivered);
//!         Ok(())
//!     }, "jobs")
//!     .unwrap();
//!
//! tx.try_send(1).unwrap();
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::config::WatcherConfig;
use super::dispatcher::Dispatcher;
use super::registry::{Entry, Registry};
use crate::callbacks::IntoCallback;
use crate::error::WatchError;
use crate::events::Param;
use crate::sources::IntoSource;

static GLOBAL: LazyLock<Watcher> = LazyLock::new(|| Watcher::new(WatcherConfig::default()));

/// State shared between registration callers and the dispatch loop.
pub(crate) struct Shared {
    pub(crate) config: WatcherConfig,
    registry: Mutex<Registry>,
    started: AtomicBool,
}

impl Shared {
    pub(crate) fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry::default()),
            started: AtomicBool::new(false),
        }
    }

    /// Locks the registry; a poisoned lock is recovered since every critical
    /// section leaves the tables consistent before anything can panic.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dynamic multiplexer over channel-like sources.
///
/// Cheap to clone (internally holds an `Arc`). Clones register into the same
/// tables and share one dispatch loop.
#[derive(Clone)]
pub struct Watcher {
    shared: Arc<Shared>,
}

impl Watcher {
    /// Creates a watcher. The dispatch loop starts on the first successful [`add`](Self::add).
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
        }
    }

    /// Returns the process-global watcher used by [`crate::add`].
    pub fn global() -> &'static Watcher {
        &GLOBAL
    }

    /// Returns the configuration this watcher was built with.
    pub fn config(&self) -> &WatcherConfig {
        &self.shared.config
    }

    /// Registers `source`; every value it yields is passed to `callback` with `param`.
    ///
    /// The source becomes eligible for delivery on the dispatch loop's next idle
    /// wait, at most one poll interval later.
    ///
    /// # Errors
    /// - [`WatchError::InvalidArgument`]: source or callback is `None`
    /// - [`WatchError::NotAChannel`]: erased source holds no channel
    /// - [`WatchError::NotReceivable`]: source is a send-only endpoint
    /// - [`WatchError::CapacityExceeded`]: the watcher is full
    /// - [`WatchError::Spawn`]: the dispatch thread could not be started
    pub fn add<S, C, P>(&self, source: S, callback: C, param: P) -> Result<(), WatchError>
    where
        S: IntoSource,
        C: IntoCallback,
        P: Any + Send + Sync,
    {
        self.add_param(source, callback, Arc::new(param))
    }

    /// Same as [`add`](Self::add), with an already shared parameter.
    pub fn add_param<S, C>(&self, source: S, callback: C, param: Param) -> Result<(), WatchError>
    where
        S: IntoSource,
        C: IntoCallback,
    {
        let callback = callback
            .into_callback()
            .ok_or(WatchError::InvalidArgument)?;
        let source = source.into_source()?;

        self.ensure_started()?;

        let capacity = self.shared.config.capacity_clamped();
        let mut registry = self.shared.lock();
        registry.register(source, Entry::new(callback, param), capacity)?;
        debug!(registered = registry.len(), "source registered");
        Ok(())
    }

    /// Starts the dispatch loop exactly once.
    fn ensure_started(&self) -> Result<(), WatchError> {
        if self.shared.started.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut registry = self.shared.lock();
        if registry.started {
            return Ok(());
        }
        Dispatcher::spawn(Arc::clone(&self.shared))?;
        registry.started = true;
        self.shared.started.store(true, Ordering::Release);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use tokio::sync::mpsc;

    use crate::callbacks::{Callback, CallbackResult};
    use crate::error::CallbackError;
    use crate::events::Event;
    use crate::sources::Receive;

    type Seen = Arc<Mutex<Vec<(Option<i32>, bool)>>>;

    fn recorder(seen: Seen) -> impl Fn(Event) -> CallbackResult + Send + Sync + 'static {
        move |ev: Event| -> CallbackResult {
            seen.lock()
                .unwrap()
                .push((ev.value_ref::<i32>().copied(), ev.delivered));
            Ok(())
        }
    }

    fn fast() -> Watcher {
        Watcher::new(WatcherConfig {
            poll_interval: Duration::from_millis(2),
            ..WatcherConfig::default()
        })
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        cond()
    }

    #[test]
    fn test_scenario_value_then_close() {
        let w = Watcher::new(WatcherConfig::default());
        let seen: Seen = Default::default();
        let (tx, rx) = mpsc::channel::<i32>(1);

        w.add(rx, recorder(Arc::clone(&seen)), ()).unwrap();
        tx.try_send(7).unwrap();
        assert!(wait_until(|| seen.lock().unwrap().len() == 1));
        assert_eq!(*seen.lock().unwrap(), vec![(Some(7), true)]);

        drop(tx);
        assert!(wait_until(|| seen.lock().unwrap().len() == 2));
        assert_eq!(*seen.lock().unwrap(), vec![(Some(7), true), (None, false)]);
    }

    #[test]
    fn test_scenario_quit_on_first_value() {
        let w = fast();
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let (tx, rx) = mpsc::unbounded_channel::<&'static str>();
        let log = Arc::clone(&seen);

        w.add(
            rx,
            move |mut ev: Event| -> CallbackResult {
                let v = ev.take_value::<&'static str>().unwrap_or("<closed>");
                log.lock().unwrap().push(format!("{v}:{}", ev.delivered));
                Err(CallbackError::Quit)
            },
            (),
        )
        .unwrap();

        tx.send("x").unwrap();
        assert!(wait_until(|| !seen.lock().unwrap().is_empty()));
        // The receiver may already be dropped; the send outcome does not matter.
        let _ = tx.send("y");

        // Give the loop plenty of idle rounds to (wrongly) deliver "y".
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(*seen.lock().unwrap(), vec!["x:true".to_string()]);
    }

    #[test]
    fn test_close_without_values_notifies_once() {
        let w = fast();
        let seen: Seen = Default::default();
        let (tx, rx) = mpsc::channel::<i32>(4);

        w.add(rx, recorder(Arc::clone(&seen)), ()).unwrap();
        drop(tx);
        assert!(wait_until(|| !seen.lock().unwrap().is_empty()));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(*seen.lock().unwrap(), vec![(None, false)]);
    }

    #[test]
    fn test_values_arrive_in_order() {
        let w = fast();
        let seen: Seen = Default::default();
        let (tx, rx) = mpsc::unbounded_channel::<i32>();

        for i in 0..100 {
            tx.send(i).unwrap();
        }
        w.add(rx, recorder(Arc::clone(&seen)), ()).unwrap();
        drop(tx);

        assert!(wait_until(|| seen.lock().unwrap().len() == 101));
        let seen = seen.lock().unwrap();
        let values: Vec<i32> = seen.iter().filter_map(|(v, _)| *v).collect();
        assert_eq!(values, (0..100).collect::<Vec<_>>());
        assert_eq!(seen.last(), Some(&(None, false)));
    }

    #[test]
    fn test_param_passed_through() {
        let w = fast();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel::<i32>(1);
        let log = Arc::clone(&seen);

        w.add(
            rx,
            move |ev: Event| -> CallbackResult {
                log.lock().unwrap().push(*ev.param_ref::<u64>().unwrap());
                Ok(())
            },
            99_u64,
        )
        .unwrap();

        tx.try_send(1).unwrap();
        assert!(wait_until(|| seen.lock().unwrap().len() == 1));
        drop(tx);
        assert!(wait_until(|| seen.lock().unwrap().len() == 2));
        assert_eq!(*seen.lock().unwrap(), vec![99, 99]);
    }

    #[test]
    fn test_argument_errors_do_not_start_loop() {
        let w = fast();
        let seen: Seen = Default::default();

        let no_source: Option<mpsc::Receiver<i32>> = None;
        let err = w.add(no_source, recorder(Arc::clone(&seen)), ()).unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument));

        let (_tx, rx) = mpsc::channel::<i32>(1);
        let no_callback: Option<fn(Event) -> CallbackResult> = None;
        let err = w.add(rx, no_callback, ()).unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument));

        let erased: Box<dyn Any + Send> = Box::new("not a channel");
        let err = w.add(erased, recorder(Arc::clone(&seen)), ()).unwrap_err();
        assert!(matches!(err, WatchError::NotAChannel));

        let (tx, _rx) = mpsc::channel::<i32>(1);
        let err = w.add(tx, recorder(Arc::clone(&seen)), ()).unwrap_err();
        assert!(matches!(err, WatchError::NotReceivable));

        assert!(!w.is_started());
        assert_eq!(w.shared.lock().len(), 0);
    }

    #[test]
    fn test_capacity_bound() {
        let w = Watcher::new(WatcherConfig {
            capacity: 4,
            poll_interval: Duration::from_millis(2),
            ..WatcherConfig::default()
        });
        let seen: Seen = Default::default();

        let mut senders = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel::<i32>(1);
            w.add(rx, recorder(Arc::clone(&seen)), ()).unwrap();
            senders.push(tx);
        }

        let (extra_tx, extra_rx) = mpsc::channel::<i32>(1);
        let err = w.add(extra_rx, recorder(Arc::clone(&seen)), ()).unwrap_err();
        assert!(matches!(err, WatchError::CapacityExceeded { capacity: 4 }));
        assert!(err.is_retryable());
        assert!(extra_tx.is_closed());

        for (i, tx) in senders.iter().enumerate() {
            tx.try_send(i as i32).unwrap();
        }
        assert!(wait_until(|| seen.lock().unwrap().len() == 3));
        let mut values: Vec<i32> = seen.lock().unwrap().iter().filter_map(|(v, _)| *v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![0, 1, 2]);

        // Freeing a slot makes room again.
        senders.pop();
        assert!(wait_until(|| seen.lock().unwrap().len() == 4));
        let (_tx, rx) = mpsc::channel::<i32>(1);
        assert!(w.add(rx, recorder(Arc::clone(&seen)), ()).is_ok());
    }

    #[test]
    fn test_default_capacity_limit() {
        let w = Watcher::new(WatcherConfig::default());
        let cb = |_ev: Event| -> CallbackResult { Ok(()) };

        struct Idle;
        impl Receive for Idle {
            fn try_recv(&mut self) -> crate::sources::TryRecv {
                crate::sources::TryRecv::Empty
            }
        }

        for _ in 0..65_533 {
            let src: Box<dyn Receive> = Box::new(Idle);
            w.add(src, cb, ()).unwrap();
        }
        let src: Box<dyn Receive> = Box::new(Idle);
        let err = w.add(src, cb, ()).unwrap_err();
        assert!(matches!(err, WatchError::CapacityExceeded { capacity: 65_534 }));
        assert_eq!(w.shared.lock().len(), 65_533);
    }

    #[test]
    fn test_concurrent_registration() {
        let w = fast();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let w = w.clone();
                let log = Arc::clone(&seen);
                std::thread::spawn(move || {
                    let (tx, rx) = mpsc::channel::<i32>(1);
                    w.add(
                        rx,
                        move |ev: Event| -> CallbackResult {
                            if let Some(v) = ev.value_ref::<i32>() {
                                log.lock().unwrap().push(*v);
                            }
                            Ok(())
                        },
                        (),
                    )
                    .unwrap();
                    tx.try_send(n).unwrap();
                    tx
                })
            })
            .collect();

        let _senders: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(wait_until(|| seen.lock().unwrap().len() == 8));
        let mut got = seen.lock().unwrap().clone();
        got.sort_unstable();
        assert_eq!(got, (0..8).collect::<Vec<_>>());
        assert!(w.is_started());
    }

    #[test]
    fn test_slow_callback_does_not_block_registration() {
        let w = fast();
        let (tx, rx) = mpsc::channel::<i32>(1);
        let entered = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&entered);

        w.add(
            rx,
            move |ev: Event| -> CallbackResult {
                if ev.delivered {
                    flag.store(true, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(300));
                }
                Ok(())
            },
            (),
        )
        .unwrap();
        tx.try_send(1).unwrap();
        assert!(wait_until(|| entered.load(Ordering::SeqCst)));

        let started = Instant::now();
        let (_tx2, rx2) = mpsc::channel::<i32>(1);
        w.add(rx2, |_ev: Event| -> CallbackResult { Ok(()) }, ()).unwrap();
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn test_panicking_source_does_not_stop_loop() {
        struct Broken;
        impl Receive for Broken {
            fn try_recv(&mut self) -> crate::sources::TryRecv {
                panic!("broken source")
            }
        }

        let w = fast();
        let seen: Seen = Default::default();
        let broken: Box<dyn Receive> = Box::new(Broken);
        w.add(broken, recorder(Arc::clone(&seen)), ()).unwrap();
        assert!(wait_until(|| seen.lock().unwrap().len() == 1));
        assert_eq!(*seen.lock().unwrap(), vec![(None, false)]);

        let (tx, rx) = mpsc::channel::<i32>(1);
        w.add(rx, recorder(Arc::clone(&seen)), ()).unwrap();
        tx.try_send(1).unwrap();
        assert!(wait_until(|| seen.lock().unwrap().len() == 2));
        assert_eq!(seen.lock().unwrap()[1], (Some(1), true));
    }

    #[test]
    fn test_shared_callback_registers_several_sources() {
        let w = fast();
        let seen: Seen = Default::default();
        let shared: Arc<dyn Callback> = Arc::new(recorder(Arc::clone(&seen)));

        let (tx_a, rx_a) = mpsc::channel::<i32>(1);
        let (tx_b, rx_b) = mpsc::channel::<i32>(1);
        w.add(rx_a, Arc::clone(&shared), ()).unwrap();
        w.add(rx_b, Some(shared), ()).unwrap();

        tx_a.try_send(1).unwrap();
        tx_b.try_send(2).unwrap();
        assert!(wait_until(|| seen.lock().unwrap().len() == 2));
        let mut values: Vec<i32> = seen.lock().unwrap().iter().filter_map(|(v, _)| *v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_producers() {
        let w = fast();
        let seen: Seen = Default::default();
        let (tx, rx) = mpsc::channel::<i32>(8);
        w.add(rx, recorder(Arc::clone(&seen)), ()).unwrap();

        let producer = tokio::spawn(async move {
            for i in 0..20 {
                tx.send(i).await.unwrap();
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        });
        producer.await.unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while seen.lock().unwrap().len() < 21 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 21);
        assert_eq!(seen.last(), Some(&(None, false)));
    }
}
