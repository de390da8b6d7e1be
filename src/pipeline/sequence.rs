use std::sync::atomic::{AtomicU64, Ordering};

/// Dense sequence ids starting at 1. Shared by reference; each call hands out a fresh id.
#[derive(Debug)]
pub struct SequenceAllocator {
    next: AtomicU64,
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}
