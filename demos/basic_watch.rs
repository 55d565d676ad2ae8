//! # Example: basic_watch
//!
//! Watch two tokio channels through the process-global watcher.
//!
//! Demonstrates how to:
//! - Register a buffered source and see each value, then its closure event.
//! - Stop watching a source from its own callback with `CallbackError::Quit`.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► chanwatch::add(numbers_rx, print, "numbers")
//!   │     └─► 7, 8 delivered ─► producer drops ─► {_, delivered=false}
//!   └─► chanwatch::add(words_rx, first_only, "words")
//!         └─► "x" delivered ─► Err(Quit) ─► "y" never delivered
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_watch
//! ```

use std::time::Duration;

use chanwatch::{CallbackError, CallbackResult, Event};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) A buffered numeric source; the callback keeps watching until closure.
    let (numbers_tx, numbers_rx) = tokio::sync::mpsc::channel::<i32>(1);
    chanwatch::add(
        numbers_rx,
        |ev: Event| -> CallbackResult {
            let name = ev.param_ref::<&str>().copied().unwrap_or("?");
            match ev.value_ref::<i32>() {
                Some(v) => println!("[{name}] value={v}"),
                None => println!("[{name}] closed"),
            }
            Ok(())
        },
        "numbers",
    )?;

    // 2) A source whose callback wants only the first value.
    let (words_tx, words_rx) = tokio::sync::mpsc::unbounded_channel::<&'static str>();
    chanwatch::add(
        words_rx,
        |ev: Event| -> CallbackResult {
            println!("[words] first={:?}; quitting", ev.value_ref::<&str>());
            Err(CallbackError::Quit)
        },
        (),
    )?;

    numbers_tx.send(7).await?;
    numbers_tx.send(8).await?;
    words_tx.send("x")?;

    tokio::time::sleep(Duration::from_millis(50)).await;
    // Already unwatched: the receiver is gone, so this send fails.
    println!("[words] late send ok={}", words_tx.send("y").is_ok());

    drop(numbers_tx);
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
