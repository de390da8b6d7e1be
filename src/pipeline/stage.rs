//! Generic pooled stage: pull items from an upstream channel, apply a transform on W worker
//! threads, push results into the downstream channel.
//!
//! A dispatcher thread owns the pull side. For every item it assigns a sequence id, bumps the
//! in-flight counter, and hands the item to a free worker over a rendezvous channel, so at most
//! `workers` items are in flight and a slow stage backs up into its input channel. Workers
//! decrement the in-flight counter only after the result is in the output channel (or the
//! item was dropped). The stage is quiescent once the dispatcher has drained its input after
//! upstream quiescence *and* nothing is in flight.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, bounded};
use log::{debug, warn};
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::channel::{BoundedChannel, drain_until_quiescent};
use super::quiescence::Quiescent;
use super::sequence::SequenceAllocator;
use crate::types::{Admitted, StageStats};

/// Pool size and poll cadence for one stage.
#[derive(Clone, Copy, Debug)]
pub struct StageConfig {
    pub workers: usize,
    pub poll_interval: Duration,
}

/// Shared counters of a running stage. Doubles as the downstream's view of its upstream.
#[derive(Debug, Default)]
pub struct StageState {
    in_flight: AtomicUsize,
    admitted: AtomicUsize,
    forwarded: AtomicUsize,
    dropped: AtomicUsize,
    drained: AtomicBool,
}

impl StageState {
    /// Items handed to workers and not yet forwarded or dropped.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StageStats {
        StageStats {
            admitted: self.admitted.load(Ordering::Acquire),
            forwarded: self.forwarded.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Acquire),
        }
    }

    fn admit(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    fn settle(&self, forwarded: bool) {
        let counter = if forwarded {
            &self.forwarded
        } else {
            &self.dropped
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Quiescent for StageState {
    fn is_quiescent(&self) -> bool {
        self.drained.load(Ordering::Acquire) && self.in_flight.load(Ordering::Acquire) == 0
    }
}

/// Stage transform. An `Err` drops the item (logged with its identity); it never stops the stage.
pub trait StageFn<I, O>: Fn(Admitted<I>) -> Result<O> + Send + Sync + 'static {}

impl<I, O, F> StageFn<I, O> for F where F: Fn(Admitted<I>) -> Result<O> + Send + Sync + 'static {}

/// A not-yet-started stage. See the module docs for the protocol.
pub struct StageRunner<I, O, F> {
    name: &'static str,
    config: StageConfig,
    input: Arc<BoundedChannel<I>>,
    output: Arc<BoundedChannel<O>>,
    upstream: Arc<dyn Quiescent>,
    sequence: Arc<SequenceAllocator>,
    assigns_ids: bool,
    func: Arc<F>,
    state: Arc<StageState>,
}

impl<I, O, F> StageRunner<I, O, F>
where
    I: Display + Send + 'static,
    O: Send + 'static,
    F: StageFn<I, O>,
{
    pub fn new(
        name: &'static str,
        config: StageConfig,
        input: Arc<BoundedChannel<I>>,
        output: Arc<BoundedChannel<O>>,
        upstream: Arc<dyn Quiescent>,
        func: F,
    ) -> Self {
        Self {
            name,
            config,
            input,
            output,
            upstream,
            sequence: Arc::new(SequenceAllocator::new()),
            assigns_ids: false,
            func: Arc::new(func),
            state: Arc::new(StageState::default()),
        }
    }

    /// Assign admission ids from `sequence` instead of a private allocator. Drop logs then
    /// name items by that id.
    pub fn with_sequence(mut self, sequence: Arc<SequenceAllocator>) -> Self {
        self.sequence = sequence;
        self.assigns_ids = true;
        self
    }

    /// Counters of this stage; pass as the next stage's upstream.
    pub fn state(&self) -> Arc<StageState> {
        Arc::clone(&self.state)
    }

    /// Spawn workers and the dispatcher, then return immediately.
    pub fn start(self) -> Result<StageHandle> {
        let workers = self.config.workers.max(1);
        let (work_tx, work_rx) = bounded::<Admitted<I>>(0);

        let worker_handles = (0..workers)
            .map(|i| {
                let work_rx = work_rx.clone();
                let output = Arc::clone(&self.output);
                let func = Arc::clone(&self.func);
                let state = Arc::clone(&self.state);
                let name = self.name;
                let assigns_ids = self.assigns_ids;
                thread::Builder::new()
                    .name(format!("{name}-{i}"))
                    .spawn(move || worker_loop(name, assigns_ids, work_rx, output, func, state))
                    .with_context(|| format!("spawn {name} worker"))
            })
            .collect::<Result<Vec<_>>>()?;
        drop(work_rx);

        let name = self.name;
        let state = Arc::clone(&self.state);
        let dispatcher = thread::Builder::new()
            .name(format!("{name}-dispatch"))
            .spawn(move || {
                debug!("{}: started with {} workers", self.name, workers);
                let handled = drain_until_quiescent(
                    &self.input,
                    self.upstream.as_ref(),
                    self.config.poll_interval,
                    |item| {
                        let admitted = Admitted {
                            seq: self.sequence.next_id(),
                            item,
                        };
                        self.state.admit();
                        if let Err(e) = work_tx.send(admitted) {
                            warn!("{}: dropped {}: no worker available", self.name, e.0);
                            self.state.settle(false);
                        }
                        Ok(())
                    },
                );
                // Closing the work channel lets idle workers exit once the last item is taken.
                drop(work_tx);
                for h in worker_handles {
                    let _ = h.join();
                }
                self.state.drained.store(true, Ordering::Release);
                let stats = self.state.stats();
                debug!(
                    "{}: quiescent after {} items ({} forwarded, {} dropped)",
                    self.name,
                    handled.unwrap_or(stats.admitted),
                    stats.forwarded,
                    stats.dropped
                );
            })
            .with_context(|| format!("spawn {name} dispatcher"))?;

        Ok(StageHandle {
            name,
            state,
            dispatcher,
        })
    }
}

/// Log name of an admitted item: `#seq item` when the stage assigns the run's ids,
/// else the item alone.
pub fn drop_label<I: Display>(admitted: &Admitted<I>, assigns_ids: bool) -> String {
    if assigns_ids {
        admitted.to_string()
    } else {
        admitted.item.to_string()
    }
}

fn worker_loop<I, O, F>(
    name: &'static str,
    assigns_ids: bool,
    work_rx: Receiver<Admitted<I>>,
    output: Arc<BoundedChannel<O>>,
    func: Arc<F>,
    state: Arc<StageState>,
) where
    I: Display,
    F: StageFn<I, O>,
{
    while let Ok(admitted) = work_rx.recv() {
        let label = drop_label(&admitted, assigns_ids);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| func(admitted)))
            .unwrap_or_else(|_| Err(anyhow::anyhow!("stage function panicked")));
        match outcome.and_then(|out| output.put(out)) {
            Ok(()) => state.settle(true),
            Err(e) => {
                warn!("{}: dropped {}: {:#}", name, label, e);
                state.settle(false);
            }
        }
    }
}

/// A running stage.
pub struct StageHandle {
    name: &'static str,
    state: Arc<StageState>,
    dispatcher: JoinHandle<()>,
}

impl StageHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> Arc<StageState> {
        Arc::clone(&self.state)
    }

    pub fn is_quiescent(&self) -> bool {
        self.state.is_quiescent()
    }

    pub fn stats(&self) -> StageStats {
        self.state.stats()
    }

    /// Wait for the stage to reach quiescence and return its final counters.
    pub fn join(self) -> Result<StageStats> {
        self.dispatcher
            .join()
            .map_err(|_| anyhow::anyhow!("{} dispatcher panicked", self.name))?;
        Ok(self.state.stats())
    }
}
