//! # Example: stream
//!
//! Publishes a lazy sequence item by item and cancels it halfway.
//!
//! Shows how to:
//! - Build stream work with [`Work::stream`]
//! - Attach the built-in [`LogWriter`] subscriber (requires the `logging` feature)
//! - Count re-render requests with a [`Rerender`] callback
//!
//! ## Run
//! ```bash
//! cargo run --example stream --features logging
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use taskhook::{LogWriter, Rerender, Subscribe, TaskError, TaskHook, TaskState, Work};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    println!("=== stream example ===\n");

    let renders = Arc::new(AtomicUsize::new(0));
    let counter = renders.clone();
    let rerender: Arc<dyn Rerender> = Arc::new(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let work = Work::stream(|| {
        (1..=20_u32).map(|n| {
            std::thread::sleep(Duration::from_millis(20));
            Ok::<_, TaskError>(n * n)
        })
    });

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mut hook: TaskHook<u32> = TaskHook::builder(work)
        .name("squares")
        .rerender(rerender)
        .with_subscribers(subs)
        .build();
    hook.start();

    tokio::time::sleep(Duration::from_millis(110)).await;
    hook.cancel();

    for _ in 0..100 {
        if hook.state().is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // let the subscriber drain
    tokio::time::sleep(Duration::from_millis(50)).await;

    anyhow::ensure!(hook.state() == TaskState::Cancelled, "expected cancellation");
    println!(
        "\nlast value: {:?}, rerender requests: {}",
        hook.value(),
        renders.load(Ordering::Relaxed)
    );
    Ok(())
}
