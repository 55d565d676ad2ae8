//! # Example: dynamic_sources
//!
//! Register many heterogeneous sources from several threads on one owned watcher.
//!
//! Demonstrates how to:
//! - Build a `Watcher` with a custom poll interval and capacity.
//! - Mix tokio, futures and std channels, plus a custom `Receive` source.
//! - Observe the registration error for a send-only endpoint.
//!
//! ## Run
//! ```bash
//! cargo run --example dynamic_sources
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chanwatch::{CallbackResult, Event, Receive, TryRecv, WatchError, Watcher, WatcherConfig};

/// Counts down and then closes.
struct Countdown(u32);

impl Receive for Countdown {
    fn try_recv(&mut self) -> TryRecv {
        if self.0 == 0 {
            return TryRecv::Closed;
        }
        self.0 -= 1;
        TryRecv::Value(Box::new(self.0))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let watcher = Watcher::new(WatcherConfig {
        poll_interval: Duration::from_millis(5),
        capacity: 16,
        ..WatcherConfig::default()
    });

    let values = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = {
        let values = Arc::clone(&values);
        let closed = Arc::clone(&closed);
        move |ev: Event| -> CallbackResult {
            if ev.delivered {
                values.fetch_add(1, Ordering::Relaxed);
            } else {
                closed.fetch_add(1, Ordering::Relaxed);
                println!("[closed] source={:?}", ev.param_ref::<&str>());
            }
            Ok(())
        }
    };

    // 1) Register from several threads at once.
    let workers: Vec<_> = (0..4)
        .map(|n| {
            let watcher = watcher.clone();
            let cb = counter.clone();
            std::thread::spawn(move || -> Result<(), WatchError> {
                let (tx, rx) = std::sync::mpsc::channel::<usize>();
                watcher.add(rx, cb, "std")?;
                for i in 0..n + 1 {
                    let _ = tx.send(i);
                }
                Ok(())
            })
        })
        .collect();
    for w in workers {
        w.join().map_err(|_| "registration thread panicked")??;
    }

    // 2) Other channel flavours.
    let (mut ftx, frx) = futures::channel::mpsc::channel::<String>(4);
    watcher.add(frx, counter.clone(), "futures")?;
    ftx.try_send("hello".into())?;
    drop(ftx);

    let (btx, brx) = tokio::sync::broadcast::channel::<u8>(8);
    watcher.add(brx, counter.clone(), "broadcast")?;
    btx.send(1)?;
    drop(btx);

    let custom: Box<dyn Receive> = Box::new(Countdown(3));
    watcher.add(custom, counter.clone(), "countdown")?;

    // 3) Rejected registrations.
    let (tx, _rx) = tokio::sync::mpsc::channel::<u8>(1);
    match watcher.add(tx, counter.clone(), "sender") {
        Err(e) => println!("[rejected] {} ({})", e, e.as_label()),
        Ok(()) => unreachable!("senders are never receivable"),
    }

    std::thread::sleep(Duration::from_millis(100));
    println!(
        "values={} closed={}",
        values.load(Ordering::Relaxed),
        closed.load(Ordering::Relaxed)
    );
    Ok(())
}
