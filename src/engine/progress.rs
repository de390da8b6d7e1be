//! Progress counter for archived items (verbose mode).

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a counter for unknown total (shows count without percentage).
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " items"
    )))
}

/// Force a refresh of the bar (e.g. so the counter shows "0 items" immediately).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Advance the bar by `n`. Uses try_lock; a contended update is skipped.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Build the counter when `verbose`.
pub fn setup_progress(verbose: bool) -> Option<ProgressBar> {
    verbose.then(|| {
        let bar = create_counter("Archiving");
        refresh_bar(&bar);
        bar
    })
}
