//! One harvest run: build collaborators for the source, open the sink, run the pipeline.

use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;

use crate::engine::extract::ExifExtractor;
use crate::engine::local::DirectoryStore;
use crate::engine::progress::setup_progress;
use crate::engine::s3::BucketStore;
use crate::engine::sink::open_sink;
use crate::pipeline::{Collaborators, run_pipeline};
use crate::types::{Opts, PipelineTuning, RunSummary, Source};

/// Lister and fetcher for `source`, EXIF extraction for every object.
pub fn collaborators_for(source: &Source) -> Result<Collaborators> {
    let collaborators = match source {
        Source::Bucket { name, endpoint } => {
            let store = Arc::new(BucketStore::new(name, endpoint)?);
            Collaborators {
                lister: store.clone(),
                fetcher: store,
                extractor: Arc::new(ExifExtractor),
            }
        }
        Source::Directory(root) => {
            let store = Arc::new(DirectoryStore::open(root)?);
            Collaborators {
                lister: store.clone(),
                fetcher: store,
                extractor: Arc::new(ExifExtractor),
            }
        }
    };
    Ok(collaborators)
}

/// Harvest `opts.source` into the configured sink. The sink is closed whether or not the run
/// succeeds; the first error wins.
pub fn harvest(opts: &Opts) -> Result<RunSummary> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    let collaborators = collaborators_for(&opts.source)?;
    let mut sink = open_sink(opts.format, opts.output.as_deref())?;
    info!("Writing metadata to: {}", sink.destination());

    let tuning = PipelineTuning::from_opts(opts);
    let progress = setup_progress(opts.verbose);
    let result = run_pipeline(&collaborators, &tuning, sink.as_mut(), progress.as_ref());
    let closed = sink.close();
    let summary = result?;
    closed?;
    Ok(summary)
}
