use clap::Parser;
use std::path::PathBuf;

use crate::types::SinkFormat;

/// List a bucket, fetch every object, and append its EXIF metadata as flat records.
///
/// Every flag is optional. Values come from (lowest to highest) built-in defaults,
/// `.metaharvest.toml` in the working directory, `METAHARVEST_*` environment variables
/// (or `.env`), and the command line.
#[derive(Clone, Debug, Parser)]
#[command(name = "metaharvest", version)]
#[command(about = "Harvest EXIF metadata from a bucket into flat records.")]
pub struct Cli {
    /// Public S3 bucket to harvest anonymously. Default: waldo-recruiting.
    #[arg(long, short, env = "METAHARVEST_BUCKET", conflicts_with = "dir")]
    pub bucket: Option<String>,

    /// S3-compatible endpoint. Default: https://s3.amazonaws.com.
    #[arg(long, env = "METAHARVEST_ENDPOINT", conflicts_with = "dir")]
    pub endpoint: Option<String>,

    /// Harvest a local directory tree instead of a bucket.
    #[arg(long, short, env = "METAHARVEST_DIR")]
    pub dir: Option<PathBuf>,

    /// Output file, appended to. Default: a new `exif-data*` file in the temp dir.
    #[arg(long, short, env = "METAHARVEST_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(long, short, value_enum, env = "METAHARVEST_FORMAT")]
    pub format: Option<SinkFormat>,

    /// Worker threads per pooled stage. Default: available parallelism.
    #[arg(long, short = 'w', env = "METAHARVEST_WORKERS")]
    pub workers: Option<usize>,

    /// Capacity of each stage channel. Default: available parallelism.
    #[arg(long, env = "METAHARVEST_CHANNEL_CAPACITY")]
    pub channel_capacity: Option<usize>,

    /// Objects requested per listing page. Default: channel capacity.
    #[arg(long, env = "METAHARVEST_PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// How often idle stages re-check upstream completion, in milliseconds.
    #[arg(long, env = "METAHARVEST_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Verbose output (debug logs and a progress counter).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
