#![allow(dead_code)]

use std::time::{Duration, Instant};

use taskhook::{Event, EventKind};
use tokio::sync::broadcast::{self, error::TryRecvError};

pub const DEADLINE: Duration = Duration::from_secs(5);

/// Polls `cond` every millisecond until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Everything currently buffered in `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(ev) => out.push(ev),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return out,
        }
    }
}

/// Event kinds of `run`, in bus order.
pub fn kinds_of(events: &[Event], run: u64) -> Vec<EventKind> {
    events
        .iter()
        .filter(|e| e.run == Some(run))
        .map(|e| e.kind)
        .collect()
}

/// True for events published by a guarded (authority-checked) write.
pub fn is_guarded_write(kind: EventKind) -> bool {
    !matches!(kind, EventKind::Starting | EventKind::Superseded)
}

/// Receives events until one satisfies `done` (inclusive) or `timeout` elapses.
pub fn collect_until(
    rx: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    mut done: impl FnMut(&Event) -> bool,
) -> Vec<Event> {
    let deadline = Instant::now() + timeout;
    let mut out = Vec::new();
    while Instant::now() < deadline {
        match rx.try_recv() {
            Ok(ev) => {
                let stop = done(&ev);
                out.push(ev);
                if stop {
                    break;
                }
            }
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Closed) => break,
            Err(TryRecvError::Empty) => std::thread::sleep(Duration::from_millis(1)),
        }
    }
    out
}
