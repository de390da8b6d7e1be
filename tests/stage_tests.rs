//! StageRunner: forwarding, per-item drops, in-flight gating of quiescence, sequence ids.

use anyhow::Result;
use crossbeam_channel::bounded;
use metaharvest::pipeline::{
    BoundedChannel, Quiescent, QuiescentFlag, SequenceAllocator, StageConfig, StageRunner,
    drop_label,
};
use metaharvest::{Admitted, FetchedItem, ObjectRef};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const POLL: Duration = Duration::from_millis(5);

fn config(workers: usize) -> StageConfig {
    StageConfig {
        workers,
        poll_interval: POLL,
    }
}

fn fill(ch: &BoundedChannel<u32>, done: &QuiescentFlag, n: u32) {
    for i in 0..n {
        ch.put(i).unwrap();
    }
    done.mark();
}

fn drain<T>(ch: &BoundedChannel<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Some(v) = ch.poll_with_timeout(POLL) {
        out.push(v);
    }
    out
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

// --- forwarding and drops ---

#[test]
fn test_stage_forwards_every_item() {
    let input = Arc::new(BoundedChannel::new(16));
    let output = Arc::new(BoundedChannel::new(16));
    let done = Arc::new(QuiescentFlag::new());
    fill(&input, &done, 10);

    let handle = StageRunner::new(
        "double",
        config(4),
        Arc::clone(&input),
        Arc::clone(&output),
        done,
        |a: Admitted<u32>| -> Result<u32> { Ok(a.item * 2) },
    )
    .start()
    .unwrap();
    let stats = handle.join().unwrap();

    let mut got = drain(&output);
    got.sort_unstable();
    assert_eq!(got, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    assert_eq!(stats.admitted, 10);
    assert_eq!(stats.forwarded, 10);
    assert_eq!(stats.dropped, 0);
}

#[test]
fn test_stage_drops_failures_and_keeps_going() {
    let input = Arc::new(BoundedChannel::new(16));
    let output = Arc::new(BoundedChannel::new(16));
    let done = Arc::new(QuiescentFlag::new());
    fill(&input, &done, 10);

    let handle = StageRunner::new(
        "evens",
        config(3),
        Arc::clone(&input),
        Arc::clone(&output),
        done,
        |a: Admitted<u32>| -> Result<u32> {
            if a.item % 2 == 1 {
                anyhow::bail!("odd item {}", a.item);
            }
            Ok(a.item)
        },
    )
    .start()
    .unwrap();
    let stats = handle.join().unwrap();

    let mut got = drain(&output);
    got.sort_unstable();
    assert_eq!(got, vec![0, 2, 4, 6, 8]);
    assert_eq!(stats.forwarded, 5);
    assert_eq!(stats.dropped, 5);
    assert_eq!(stats.admitted, stats.forwarded + stats.dropped);
}

#[test]
fn test_stage_panic_counts_as_drop() {
    let input = Arc::new(BoundedChannel::new(4));
    let output = Arc::new(BoundedChannel::new(4));
    let done = Arc::new(QuiescentFlag::new());
    fill(&input, &done, 3);

    let handle = StageRunner::new(
        "panicky",
        config(2),
        Arc::clone(&input),
        Arc::clone(&output),
        done,
        |a: Admitted<u32>| -> Result<u32> {
            if a.item == 1 {
                panic!("boom");
            }
            Ok(a.item)
        },
    )
    .start()
    .unwrap();
    let stats = handle.join().unwrap();

    assert_eq!(stats.forwarded, 2);
    assert_eq!(stats.dropped, 1);
    assert_eq!(drain(&output).len(), 2);
}

// --- quiescence ---

#[test]
fn test_empty_upstream_reaches_quiescence() {
    let input: Arc<BoundedChannel<u32>> = Arc::new(BoundedChannel::new(1));
    let output: Arc<BoundedChannel<u32>> = Arc::new(BoundedChannel::new(1));
    let done = Arc::new(QuiescentFlag::new());
    done.mark();

    let handle = StageRunner::new(
        "idle",
        config(2),
        input,
        Arc::clone(&output),
        done,
        |a: Admitted<u32>| -> Result<u32> { Ok(a.item) },
    )
    .start()
    .unwrap();
    wait_until("quiescence", || handle.is_quiescent());
    assert_eq!(handle.join().unwrap(), Default::default());
    assert!(output.is_empty());
}

#[test]
fn test_not_quiescent_while_item_in_flight() {
    let input = Arc::new(BoundedChannel::new(1));
    let output = Arc::new(BoundedChannel::new(1));
    let done = Arc::new(QuiescentFlag::new());
    fill(&input, &done, 1);

    let (gate_tx, gate_rx) = bounded::<()>(0);
    let runner = StageRunner::new(
        "gated",
        config(1),
        Arc::clone(&input),
        Arc::clone(&output),
        done,
        move |a: Admitted<u32>| -> Result<u32> {
            gate_rx.recv()?;
            Ok(a.item)
        },
    );
    let state = runner.state();
    let handle = runner.start().unwrap();

    // Upstream is done and the input is empty, but the worker still holds the item.
    wait_until("item in flight", || state.in_flight() == 1);
    assert!(input.is_empty());
    thread::sleep(Duration::from_millis(30));
    assert!(!state.is_quiescent());
    assert!(output.is_empty());

    gate_tx.send(()).unwrap();
    let stats = handle.join().unwrap();
    assert!(state.is_quiescent());
    assert_eq!(state.in_flight(), 0);
    assert_eq!(stats.forwarded, 1);
    assert_eq!(drain(&output), vec![0]);
}

#[test]
fn test_full_output_holds_back_quiescence() {
    let input = Arc::new(BoundedChannel::new(8));
    let output = Arc::new(BoundedChannel::new(1));
    let done = Arc::new(QuiescentFlag::new());
    fill(&input, &done, 6);

    let runner = StageRunner::new(
        "blocked",
        config(3),
        Arc::clone(&input),
        Arc::clone(&output),
        done,
        |a: Admitted<u32>| -> Result<u32> { Ok(a.item) },
    );
    let state = runner.state();
    let handle = runner.start().unwrap();

    // Nobody drains the output: one result fits, the workers block on the rest.
    wait_until("workers blocked on output", || state.in_flight() > 0 && output.len() == 1);
    assert!(!state.is_quiescent());

    let mut got = Vec::new();
    while got.len() < 6 {
        if let Some(v) = output.poll_with_timeout(Duration::from_millis(200)) {
            got.push(v);
        }
    }
    let stats = handle.join().unwrap();
    got.sort_unstable();
    assert_eq!(got, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(stats.forwarded, 6);
}

#[test]
fn test_chained_stages_conserve_items() {
    let a = Arc::new(BoundedChannel::new(2));
    let b = Arc::new(BoundedChannel::new(2));
    let c = Arc::new(BoundedChannel::new(64));
    let done = Arc::new(QuiescentFlag::new());

    let first = StageRunner::new(
        "first",
        config(3),
        Arc::clone(&a),
        Arc::clone(&b),
        Arc::clone(&done) as Arc<dyn Quiescent>,
        |x: Admitted<u32>| -> Result<u32> {
            if x.item % 5 == 0 {
                anyhow::bail!("multiple of five");
            }
            Ok(x.item)
        },
    );
    let second = StageRunner::new(
        "second",
        config(2),
        Arc::clone(&b),
        Arc::clone(&c),
        first.state(),
        |x: Admitted<u32>| -> Result<u32> {
            thread::sleep(Duration::from_millis(1));
            Ok(x.item)
        },
    );
    let first = first.start().unwrap();
    let second = second.start().unwrap();
    fill(&a, &done, 50);

    let second_stats = second.join().unwrap();
    let first_stats = first.join().unwrap();
    assert_eq!(first_stats.admitted, 50);
    assert_eq!(first_stats.dropped, 10);
    assert_eq!(second_stats.admitted, first_stats.forwarded);
    assert_eq!(second_stats.forwarded, 40);
    assert_eq!(drain(&c).len(), 40);
}

// --- sequence ids ---

#[test]
fn test_sequence_ids_follow_admission_order() {
    let input = Arc::new(BoundedChannel::new(4));
    let output = Arc::new(BoundedChannel::new(64));
    let done = Arc::new(QuiescentFlag::new());
    let sequence = Arc::new(SequenceAllocator::new());

    let handle = StageRunner::new(
        "tag",
        config(4),
        Arc::clone(&input),
        Arc::clone(&output),
        done.clone(),
        |a: Admitted<u32>| -> Result<(u64, u32)> {
            // Early items finish last.
            thread::sleep(Duration::from_millis(u64::from(20 - a.item)));
            Ok((a.seq, a.item))
        },
    )
    .with_sequence(Arc::clone(&sequence))
    .start()
    .unwrap();
    fill(&input, &done, 20);
    handle.join().unwrap();

    let mut got = drain(&output);
    assert_eq!(got.len(), 20);
    got.sort_unstable_by_key(|(_, item)| *item);
    for (seq, item) in &got {
        assert_eq!(*seq, u64::from(*item) + 1);
    }
    assert_eq!(sequence.allocated(), 20);
}

#[test]
fn test_sequence_allocator_is_dense_across_threads() {
    let sequence = Arc::new(SequenceAllocator::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sequence = Arc::clone(&sequence);
            thread::spawn(move || (0..250).map(|_| sequence.next_id()).collect::<Vec<_>>())
        })
        .collect();
    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    assert_eq!(all, (1..=1000).collect::<Vec<_>>());
}

#[test]
fn test_drop_label_uses_admission_id_only_when_assigned() {
    let admitted = Admitted {
        seq: 7,
        item: FetchedItem {
            seq: 2,
            object: ObjectRef::new("bucket", "a.jpg", 1),
            payload: Vec::new(),
        },
    };
    // Downstream stages number admissions privately; the item carries the run's id.
    assert_eq!(drop_label(&admitted, false), "#2 bucket/a.jpg");
    assert_eq!(drop_label(&admitted, true), "#7 #2 bucket/a.jpg");
}
