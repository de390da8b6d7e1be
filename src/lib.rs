//! Metaharvest: list a bucket, fetch each object, extract EXIF metadata, append flat records.
//!
//! The core is a four-stage pipeline (lister → fetcher → extractor → archiver) joined by
//! bounded channels. Pooled stages run on [`pipeline::StageRunner`]; completion flows
//! downstream through [`pipeline::Quiescent`] rather than channel closure. Collaborators
//! (listing, fetching, extraction, output) are traits in [`engine`], so the pipeline can be
//! driven against any store:
//!
//! ```ignore
//! let collaborators = metaharvest::collaborators_for(&Source::Directory("photos".into()))?;
//! let mut sink = metaharvest::engine::open_sink(SinkFormat::Csv, None)?;
//! let tuning = PipelineTuning::from_opts(&Opts::default());
//! let summary = metaharvest::pipeline::run_pipeline(&collaborators, &tuning, sink.as_mut(), None)?;
//! ```
//!
//! Runs are not idempotent: harvesting the same listing twice appends every record twice.

pub mod engine;
pub mod harvest;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use harvest::{collaborators_for, harvest};

/// Result alias used by public metaharvest API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
