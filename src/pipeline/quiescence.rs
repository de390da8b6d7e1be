//! Completion signal a stage exposes to its downstream.

use std::sync::atomic::{AtomicBool, Ordering};

/// A stage that can report it will produce no further output.
///
/// Once true, it stays true. Every item the stage produced is already in its output
/// channel by the time this returns true (Release/Acquire on the implementors' flags).
pub trait Quiescent: Send + Sync {
    fn is_quiescent(&self) -> bool;
}

/// One-shot flag for single-threaded producers (the lister).
#[derive(Debug, Default)]
pub struct QuiescentFlag(AtomicBool);

impl QuiescentFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl Quiescent for QuiescentFlag {
    fn is_quiescent(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
