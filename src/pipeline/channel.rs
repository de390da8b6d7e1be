//! Fixed-capacity hand-off between stages.

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::time::Duration;

use super::quiescence::Quiescent;

/// Bounded FIFO shared by one logical producer side and one logical consumer side.
///
/// Holds both ends of the underlying channel, so it never disconnects: `put` blocks while
/// full, `poll_with_timeout` waits at most its timeout. Completion is never signalled by
/// closing; consumers ask the upstream stage via [`Quiescent`].
pub struct BoundedChannel<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> BoundedChannel<T> {
    /// Capacity is clamped to at least 1 and never changes.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Enqueue, blocking while the channel holds `capacity` items.
    pub fn put(&self, item: T) -> Result<()> {
        self.tx
            .send(item)
            .map_err(|_| anyhow::anyhow!("channel disconnected while enqueueing"))
    }

    /// Head item if one is available within `timeout`, else None.
    pub fn poll_with_timeout(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consume `channel` until `upstream` is quiescent and the channel is empty.
///
/// Upstream is checked before emptiness: once upstream is quiescent nothing more is put,
/// so an empty channel observed afterwards stays empty. Returns the number of items handled.
pub fn drain_until_quiescent<T, F>(
    channel: &BoundedChannel<T>,
    upstream: &dyn Quiescent,
    poll_interval: Duration,
    mut on_item: F,
) -> Result<usize>
where
    F: FnMut(T) -> Result<()>,
{
    let mut handled = 0_usize;
    loop {
        match channel.poll_with_timeout(poll_interval) {
            Some(item) => {
                on_item(item)?;
                handled += 1;
            }
            None => {
                if upstream.is_quiescent() && channel.is_empty() {
                    break;
                }
            }
        }
    }
    Ok(handled)
}
