//! # Example: basic
//!
//! Runs one piece of blocking work off the "render" thread and polls its state.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► TaskHook::builder(work).build()
//!   ├─► hook.start()            STARTING
//!   │     └─► worker thread     RUNNING ─► sleeps 50ms ─► FINISHED (42)
//!   └─► poll state() every 10ms, print each change
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use std::time::Duration;

use taskhook::{TaskError, TaskHook, TaskState, Work};

fn main() -> anyhow::Result<()> {
    println!("=== basic example ===\n");

    let work = Work::once(|| {
        std::thread::sleep(Duration::from_millis(50));
        Ok::<_, TaskError>(42_u32)
    });
    let mut hook: TaskHook<u32> = TaskHook::builder(work).name("answer").build();

    println!("[render] state={}", hook.state());
    hook.start();

    let mut last = TaskState::Initial;
    for _ in 0..100 {
        let state = hook.state();
        if state != last {
            println!("[render] state={state} value={:?}", hook.value());
            last = state;
        }
        if state.is_terminal() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    anyhow::ensure!(hook.state() == TaskState::Finished, "work did not finish");
    println!("\nanswer = {}", hook.value().map(|v| *v).unwrap_or_default());
    Ok(())
}
