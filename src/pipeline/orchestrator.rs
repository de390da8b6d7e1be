use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::archiver::run_archiver;
use super::channel::drain_until_quiescent;
use super::context::{Collaborators, create_pipeline_channels};
use super::lister::spawn_lister;
use super::quiescence::{Quiescent, QuiescentFlag};
use super::sequence::SequenceAllocator;
use super::stage::{StageConfig, StageRunner};
use crate::engine::progress::ProgressBar;
use crate::engine::sink::RecordSink;
use crate::engine::stages::{extract_stage, fetch_stage};
use crate::types::{PipelineTuning, RunSummary};

/// Main orchestrator: lister → fetcher → extractor → archiver, each pair joined by a bounded channel.
///
/// Runs the archiver on the calling thread and returns once every stage is quiescent and
/// all threads are joined. A listing failure is returned after the admitted items drain.
/// A sink failure stops the lister; items already admitted are discarded as they come out
/// of the extractor, every thread is joined, and then the sink error is returned.
pub fn run_pipeline(
    collaborators: &Collaborators,
    tuning: &PipelineTuning,
    sink: &mut dyn RecordSink,
    progress: Option<&ProgressBar>,
) -> Result<RunSummary> {
    debug!("pipeline: {:?}", tuning);
    let channels = create_pipeline_channels(tuning.channel_capacity);
    let sequence = Arc::new(SequenceAllocator::new());
    let listed_done = Arc::new(QuiescentFlag::new());
    let cancel = Arc::new(AtomicBool::new(false));
    let config = StageConfig {
        workers: tuning.workers,
        poll_interval: tuning.poll_interval,
    };

    let fetcher = StageRunner::new(
        "fetch",
        config,
        Arc::clone(&channels.listed),
        Arc::clone(&channels.fetched),
        Arc::clone(&listed_done) as Arc<dyn Quiescent>,
        fetch_stage(Arc::clone(&collaborators.fetcher)),
    )
    .with_sequence(Arc::clone(&sequence));

    let extractor = StageRunner::new(
        "extract",
        config,
        Arc::clone(&channels.fetched),
        Arc::clone(&channels.extracted),
        fetcher.state(),
        extract_stage(Arc::clone(&collaborators.extractor)),
    );

    // Marking the lister done on a startup failure lets already-started stages wind down.
    let fetch_handle = fetcher.start().inspect_err(|_| listed_done.mark())?;
    let extract_handle = extractor.start().inspect_err(|_| listed_done.mark())?;
    let lister_handle = spawn_lister(
        Arc::clone(&collaborators.lister),
        tuning.page_size,
        Arc::clone(&channels.listed),
        Arc::clone(&listed_done),
        Arc::clone(&cancel),
    )
    .inspect_err(|_| listed_done.mark())?;

    let extract_state = extract_handle.state();
    let archived = run_archiver(
        &channels.extracted,
        &*extract_state,
        sink,
        tuning.poll_interval,
        progress,
    );
    if archived.is_err() {
        cancel.store(true, Ordering::Release);
        let discarded = drain_until_quiescent(
            &channels.extracted,
            &*extract_state,
            tuning.poll_interval,
            |_| Ok(()),
        )?;
        debug!("pipeline: discarded {} items after sink failure", discarded);
    }

    let listed = lister_handle
        .join()
        .map_err(|_| anyhow::anyhow!("lister thread panicked"))?;
    let fetch = fetch_handle.join()?;
    let extract = extract_handle.join()?;
    let archive = archived?;
    let listed = listed?;

    info!(
        "Listed {} objects: fetched {} ({} dropped), extracted {} ({} dropped), archived {} records",
        listed, fetch.forwarded, fetch.dropped, extract.forwarded, extract.dropped, archive.records
    );
    debug!("pipeline: {} sequence ids allocated", sequence.allocated());

    Ok(RunSummary {
        listed,
        fetch,
        extract,
        archive,
        destination: sink.destination(),
    })
}
