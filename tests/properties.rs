mod common;

use std::collections::HashSet;
use std::time::Duration;

use common::{collect_until, drain, is_guarded_write, DEADLINE};
use proptest::prelude::*;
use taskhook::{Event, TaskError, TaskHook, TaskState, Work};

/// Once another run has written, an earlier writer never writes again.
fn assert_single_writer(events: &[Event]) -> Result<(), TestCaseError> {
    let mut closed = HashSet::new();
    let mut writer = None;
    for ev in events.iter().filter(|e| is_guarded_write(e.kind)) {
        let run = ev.run.unwrap_or_default();
        if writer != Some(run) {
            if let Some(prev) = writer {
                closed.insert(prev);
            }
            prop_assert!(
                !closed.contains(&run),
                "run {run} wrote {:?} after losing authority",
                ev.kind
            );
            writer = Some(run);
        }
    }
    Ok(())
}

fn pause(ms: u64) {
    std::thread::sleep(Duration::from_millis(ms));
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 16, ..ProptestConfig::default() })]

    #[test]
    fn latest_single_shot_run_wins(plan in prop::collection::vec((0_u64..30, 0_u64..8), 1..5)) {
        let mut hook: TaskHook<usize, usize> = TaskHook::new(Work::once(|| Ok(usize::MAX)));
        let mut rx = hook.subscribe();
        let last = plan.len() - 1;

        for (i, &(work_ms, gap_ms)) in plan.iter().enumerate() {
            // the final bind comes a render later than the rest
            pause(if i == last && i > 0 { 20 } else { gap_ms });
            hook.bind_with(i, Work::once(move || {
                pause(work_ms);
                Ok::<_, TaskError>(i)
            }));
        }

        let final_run = plan.len() as u64;
        let mut events = collect_until(&mut rx, DEADLINE, |e| {
            e.run == Some(final_run) && e.is_terminal()
        });
        // let stale runs finish; their writes must not land
        pause(40);
        events.extend(drain(&mut rx));

        prop_assert_eq!(hook.state(), TaskState::Finished);
        let value = hook.value();
        prop_assert_eq!(value.as_deref(), Some(&last));
        prop_assert!(hook.error().is_none());
        assert_single_writer(&events)?;
    }

    #[test]
    fn stale_stream_items_never_interleave(
        plan in prop::collection::vec((1_u64..6, 0_u64..10), 2..4),
    ) {
        let mut hook: TaskHook<(usize, u32), usize> =
            TaskHook::new(Work::once(|| Ok((usize::MAX, 0))));
        let mut rx = hook.subscribe();
        let last = plan.len() - 1;

        for (i, &(item_ms, gap_ms)) in plan.iter().enumerate() {
            pause(if i == last { 20 } else { gap_ms });
            // a checkpoint-free item never observes cancellation
            hook.bind_with(i, Work::stream(move || {
                (1..=4_u32).map(move |n| {
                    pause(item_ms);
                    Ok::<_, TaskError>((i, n))
                })
            }));
        }

        let final_run = plan.len() as u64;
        let mut events = collect_until(&mut rx, DEADLINE, |e| {
            e.run == Some(final_run) && e.is_terminal()
        });
        pause(30);
        events.extend(drain(&mut rx));

        prop_assert_eq!(hook.state(), TaskState::Finished);
        let value = hook.value();
        let expected = (last, 4_u32);
        prop_assert_eq!(value.as_deref(), Some(&expected));
        assert_single_writer(&events)?;
    }
}
