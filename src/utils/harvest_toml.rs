//! Load `.metaharvest.toml` from a directory. Lib callers build [`Opts`] themselves.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{Opts, SinkFormat, Source};
use crate::utils::config::{DEFAULT_BUCKET, DEFAULT_ENDPOINT, PackagePaths};

#[derive(Debug, Default, Deserialize)]
pub struct HarvestToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    bucket: Option<String>,
    endpoint: Option<String>,
    dir: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<SinkFormat>,
    workers: Option<usize>,
    channel_capacity: Option<usize>,
    page_size: Option<usize>,
    poll_interval_ms: Option<u64>,
    verbose: Option<bool>,
}

/// Parse config text. Errors name the offending key.
pub fn parse_harvest_toml(s: &str) -> Result<HarvestToml> {
    toml::from_str(s).context("parse config")
}

/// Load the config file from `dir`. Ok(None) when there is no file; Err when it cannot be
/// read or parsed (the caller logs it once logging is set up).
pub fn load_harvest_toml(dir: &Path) -> Result<Option<HarvestToml>> {
    let path = dir.join(PackagePaths::get().config_filename());
    if !path.is_file() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("read {}", path.display()))?;
    parse_harvest_toml(&s)
        .with_context(|| path.display().to_string())
        .map(Some)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field.clone() {
            $opts.$field = v;
        }
    };
    ($section:expr, $opts:expr, $field:ident => some) => {
        if let Some(v) = $section.$field.clone() {
            $opts.$field = Some(v);
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub fn apply_file_to_opts(file: &HarvestToml, opts: &mut Opts) {
    let s = &file.settings;
    if let Some(ref dir) = s.dir {
        opts.source = Source::Directory(dir.clone());
    } else if s.bucket.is_some() || s.endpoint.is_some() {
        opts.source = opts.source.with_bucket(
            s.bucket.as_deref(),
            s.endpoint.as_deref(),
            (DEFAULT_BUCKET, DEFAULT_ENDPOINT),
        );
    }
    apply_file_opt!(s, opts, output => some);
    apply_file_opt!(s, opts, format);
    apply_file_opt!(s, opts, workers => some);
    apply_file_opt!(s, opts, channel_capacity => some);
    apply_file_opt!(s, opts, page_size => some);
    apply_file_opt!(s, opts, verbose);
    if let Some(ms) = s.poll_interval_ms {
        opts.poll_interval = Duration::from_millis(ms);
    }
}
