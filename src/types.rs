//! Public and internal types for the metaharvest API and pipeline.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Identity of one remote object. Flows unchanged from the lister into the fetcher.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Bucket (or root directory) the object lives in.
    pub container: String,
    pub key: String,
    /// Declared size in bytes; the fetcher reads exactly this many.
    pub size: u64,
}

impl ObjectRef {
    pub fn new(container: impl Into<String>, key: impl Into<String>, size: u64) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
            size,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

/// One page of a listing: objects plus the token for the next page.
#[derive(Clone, Debug, Default)]
pub struct ListingPage {
    pub objects: Vec<ObjectRef>,
    /// Opaque token for the next request. Only meaningful when `truncated` is set.
    pub continuation: Option<String>,
    /// More pages exist.
    pub truncated: bool,
}

/// Field name → field value for one object, in directory order.
pub type Metadata = IndexMap<String, String>;

/// Raw bytes of a fetched object. The payload is moved into the extractor and dropped there.
#[derive(Debug)]
pub struct FetchedItem {
    pub seq: u64,
    pub object: ObjectRef,
    pub payload: Vec<u8>,
}

impl fmt::Display for FetchedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.seq, self.object)
    }
}

/// Flattened metadata for one object, ready to archive.
#[derive(Debug)]
pub struct ExtractedItem {
    pub seq: u64,
    pub object: ObjectRef,
    pub fields: Metadata,
}

impl ExtractedItem {
    /// One output record per metadata field, in field order.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.fields.iter().map(move |(field, value)| Record {
            seq: self.seq,
            key: &self.object.key,
            field,
            value,
        })
    }
}

impl fmt::Display for ExtractedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.seq, self.object)
    }
}

/// One flat output row: `(sequence id, object key, field name, field value)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Record<'a> {
    pub seq: u64,
    pub key: &'a str,
    pub field: &'a str,
    pub value: &'a str,
}

/// An item together with the sequence id its stage assigned on admission.
#[derive(Debug)]
pub struct Admitted<T> {
    pub seq: u64,
    pub item: T,
}

impl<T: fmt::Display> fmt::Display for Admitted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.seq, self.item)
    }
}

/// Counters for one stage. After the stage is quiescent, `admitted == forwarded + dropped`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageStats {
    pub admitted: usize,
    pub forwarded: usize,
    pub dropped: usize,
}

/// What the archiver wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub items: usize,
    pub records: usize,
}

/// Outcome of one full pipeline run.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Objects the lister put into the pipeline.
    pub listed: usize,
    pub fetch: StageStats,
    pub extract: StageStats,
    pub archive: ArchiveStats,
    /// Where the records went (path or other identifier).
    pub destination: String,
}

/// Output record format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    #[default]
    Csv,
    Jsonl,
    Sqlite,
}

impl SinkFormat {
    /// File suffix used for temp outputs.
    pub fn suffix(self) -> &'static str {
        match self {
            SinkFormat::Csv => ".csv",
            SinkFormat::Jsonl => ".jsonl",
            SinkFormat::Sqlite => ".db",
        }
    }
}

/// Where objects are listed and fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Public S3-compatible bucket, accessed anonymously.
    Bucket { name: String, endpoint: String },
    /// Local directory tree treated as a bucket.
    Directory(PathBuf),
}

impl Source {
    /// Apply bucket name / endpoint overrides. A directory source becomes a bucket source
    /// seeded with `defaults` for whatever is not overridden.
    pub fn with_bucket(
        &self,
        name: Option<&str>,
        endpoint: Option<&str>,
        defaults: (&str, &str),
    ) -> Source {
        let (cur_name, cur_endpoint) = match self {
            Source::Bucket { name, endpoint } => (name.as_str(), endpoint.as_str()),
            Source::Directory(_) => defaults,
        };
        Source::Bucket {
            name: name.unwrap_or(cur_name).to_string(),
            endpoint: endpoint.unwrap_or(cur_endpoint).to_string(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Bucket { name, endpoint } => write!(f, "{endpoint}/{name}"),
            Source::Directory(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Sizing for the pipeline: worker count, channel capacity, listing page size, poll cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineTuning {
    /// Worker threads per pooled stage (fetcher, extractor).
    pub workers: usize,
    /// Capacity of each of the three hand-off channels.
    pub channel_capacity: usize,
    /// `max_keys` for each listing request.
    pub page_size: usize,
    /// How long a consumer waits on an empty channel before re-checking upstream quiescence.
    pub poll_interval: Duration,
}

/// Full options (CLI, config file and lib).
#[derive(Clone, Debug)]
pub struct Opts {
    pub source: Source,
    /// Output path. When None, a fresh temp file is created and kept.
    pub output: Option<PathBuf>,
    pub format: SinkFormat,
    /// Override worker threads per stage. When None, available parallelism.
    pub workers: Option<usize>,
    /// Override channel capacity. When None, available parallelism.
    pub channel_capacity: Option<usize>,
    /// Override listing page size. When None, the channel capacity.
    pub page_size: Option<usize>,
    pub poll_interval: Duration,
    /// Show a progress counter and debug logging.
    pub verbose: bool,
}
