//! # Example: supersede
//!
//! Changes the dependency key while the previous run is still busy.
//!
//! Run A sleeps without checkpoints, so cancelling its lineage cannot stop it.
//! Run B waits for A, then becomes authoritative. A's late result is discarded.
//!
//! ## Flow
//! ```text
//! bind("A") ─► run 1: sleep 200ms ─► "A"   (discarded, run 2 claimed authority)
//! bind("B") ─► run 2: WAITING on run 1 ─► RUNNING ─► "B" ─► FINISHED
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example supersede
//! ```

use std::time::{Duration, Instant};

use taskhook::{TaskError, TaskHook, TaskState, Work};

fn fetch(query: &'static str, delay: Duration) -> Work<String> {
    Work::once(move || {
        std::thread::sleep(delay);
        Ok::<_, TaskError>(format!("results for {query}"))
    })
}

fn main() -> anyhow::Result<()> {
    println!("=== supersede example ===\n");

    let mut hook: TaskHook<String, &'static str> = TaskHook::builder(fetch("A", Duration::ZERO))
        .name("search")
        .build();

    hook.bind_with("A", fetch("A", Duration::from_millis(200)));
    std::thread::sleep(Duration::from_millis(10));
    hook.bind_with("B", fetch("B", Duration::from_millis(20)));

    let started = Instant::now();
    let mut last = None;
    while started.elapsed() < Duration::from_secs(2) {
        let snap = hook.result();
        if last != Some(snap.state) {
            println!("[render] state={} value={:?}", snap.state, snap.value);
            last = Some(snap.state);
        }
        if snap.state == TaskState::Finished {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    let value = hook.value();
    anyhow::ensure!(
        value.as_deref().map(String::as_str) == Some("results for B"),
        "unexpected value {value:?}"
    );
    println!("\nfinal value: {:?} after {:?}", value, started.elapsed());
    Ok(())
}
