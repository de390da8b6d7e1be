//! Terminal consumer: drains extracted items into the record sink.

use anyhow::{Context, Result};
use log::debug;
use std::time::Duration;

use super::channel::{BoundedChannel, drain_until_quiescent};
use super::quiescence::Quiescent;
use crate::engine::progress::{ProgressBar, update_progress_bar};
use crate::engine::sink::RecordSink;
use crate::types::{ArchiveStats, ExtractedItem};

/// Write one record per metadata field until `upstream` is quiescent and `input` is empty.
/// Each record is flushed by the sink before the next is written. A sink error ends the run.
pub fn run_archiver(
    input: &BoundedChannel<ExtractedItem>,
    upstream: &dyn Quiescent,
    sink: &mut dyn RecordSink,
    poll_interval: Duration,
    progress: Option<&ProgressBar>,
) -> Result<ArchiveStats> {
    let mut stats = ArchiveStats::default();
    drain_until_quiescent(input, upstream, poll_interval, |item| {
        for record in item.records() {
            sink.write_record(&record)
                .with_context(|| format!("archive {item}"))?;
            stats.records += 1;
        }
        stats.items += 1;
        if let Some(pb) = progress {
            update_progress_bar(pb, 1);
        }
        Ok(())
    })?;
    debug!(
        "archive: quiescent after {} items ({} records)",
        stats.items, stats.records
    );
    Ok(stats)
}
