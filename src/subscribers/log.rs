//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [starting] task="search" run=3
//! [waiting] task="search" run=3
//! [running] task="search" run=3
//! [item] task="search" run=3 item=1
//! [failed] task="search" run=3 reason="execution failed: boom"
//! [superseded] task="search" run=2 at="waiting"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("unknown");
        let run = e.run.unwrap_or_default();
        match e.kind {
            EventKind::Starting => println!("[starting] task={task:?} run={run}"),
            EventKind::Waiting => println!("[waiting] task={task:?} run={run}"),
            EventKind::Running => println!("[running] task={task:?} run={run}"),
            EventKind::Finished => println!("[finished] task={task:?} run={run}"),
            EventKind::Cancelled => println!("[cancelled] task={task:?} run={run}"),
            EventKind::ItemPublished => {
                println!(
                    "[item] task={task:?} run={run} item={}",
                    e.item.unwrap_or_default()
                );
            }
            EventKind::Failed => {
                println!(
                    "[failed] task={task:?} run={run} reason={:?}",
                    e.reason.as_deref().unwrap_or_default()
                );
            }
            EventKind::Superseded => {
                println!(
                    "[superseded] task={task:?} run={run} at={:?}",
                    e.reason.as_deref().unwrap_or_default()
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
