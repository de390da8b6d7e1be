//! Application configuration constants.
//! Tuning and defaults in one place.

use std::sync::OnceLock;
use std::time::Duration;

use crate::types::{Opts, PipelineTuning, SinkFormat, Source};

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                env_prefix: pkg.to_uppercase(),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Optional config file looked up in the working directory.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Prefix of the environment variables the CLI reads (e.g. `METAHARVEST_BUCKET`).
    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }
}

// ---- Source ----

/// Public bucket harvested when nothing else is configured.
pub const DEFAULT_BUCKET: &str = "waldo-recruiting";

/// Endpoint for anonymous S3 access.
pub const DEFAULT_ENDPOINT: &str = "https://s3.amazonaws.com";

// ---- Output ----

/// Prefix of the temp file created when no output path is given.
pub const TEMP_OUTPUT_PREFIX: &str = "exif-data";

// ---- Pipeline ----

/// Pipeline defaults. Workers and channel capacity follow available parallelism (from rayon).
pub struct PipelineDefaults;

impl PipelineDefaults {
    /// Consumers re-check upstream quiescence this often while their channel is empty.
    pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
    /// Floor for workers and channel capacity.
    pub const FLOOR: usize = 1;
    /// Timeout for a single HTTP request (listing page or object download).
    pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

    /// Available parallel execution units.
    pub fn available() -> usize {
        rayon::current_num_threads().max(Self::FLOOR)
    }
}

impl Default for Opts {
    fn default() -> Self {
        Opts {
            source: Source::Bucket {
                name: DEFAULT_BUCKET.to_string(),
                endpoint: DEFAULT_ENDPOINT.to_string(),
            },
            output: None,
            format: SinkFormat::default(),
            workers: None,
            channel_capacity: None,
            page_size: None,
            poll_interval: PipelineDefaults::POLL_INTERVAL,
            verbose: false,
        }
    }
}

impl PipelineTuning {
    /// Resolve overrides in `opts` against available parallelism.
    pub fn from_opts(opts: &Opts) -> Self {
        let available = PipelineDefaults::available();
        let channel_capacity = opts
            .channel_capacity
            .unwrap_or(available)
            .max(PipelineDefaults::FLOOR);
        PipelineTuning {
            workers: opts.workers.unwrap_or(available).max(PipelineDefaults::FLOOR),
            channel_capacity,
            page_size: opts
                .page_size
                .unwrap_or(channel_capacity)
                .max(PipelineDefaults::FLOOR),
            poll_interval: opts.poll_interval,
        }
    }
}
