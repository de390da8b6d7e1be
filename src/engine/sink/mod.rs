//! Output sinks: append-only destinations for flat `(seq, key, field, value)` records.

mod csv_sink;
mod jsonl_sink;
mod sqlite_sink;

pub use csv_sink::CsvSink;
pub use jsonl_sink::JsonlSink;
pub use sqlite_sink::SqliteSink;

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::types::{Record, SinkFormat};
use crate::utils::config::TEMP_OUTPUT_PREFIX;

/// Append-only record destination. Every record is flushed before `write_record` returns,
/// so partial output survives a crash.
pub trait RecordSink: Send {
    fn write_record(&mut self, record: &Record<'_>) -> Result<()>;

    /// Path or other identifier of the destination, for logs.
    fn destination(&self) -> String;

    fn close(&mut self) -> Result<()>;
}

/// Open the sink for `format` at `output`, or at a fresh kept temp file when None.
/// Existing files are appended to. Failure here is fatal to the run.
pub fn open_sink(format: SinkFormat, output: Option<&Path>) -> Result<Box<dyn RecordSink>> {
    let (file, path) = match output {
        Some(p) => (open_append(p)?, p.to_path_buf()),
        None => create_temp_output(format)?,
    };
    let sink: Box<dyn RecordSink> = match format {
        SinkFormat::Csv => Box::new(CsvSink::new(file, path)),
        SinkFormat::Jsonl => Box::new(JsonlSink::new(file, path)),
        SinkFormat::Sqlite => {
            drop(file);
            Box::new(SqliteSink::open(&path)?)
        }
    };
    Ok(sink)
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open output {}", path.display()))
}

/// Create `exif-data*.{csv,jsonl,db}` in the temp dir and keep it after the run.
fn create_temp_output(format: SinkFormat) -> Result<(File, PathBuf)> {
    let temp = tempfile::Builder::new()
        .prefix(TEMP_OUTPUT_PREFIX)
        .suffix(format.suffix())
        .tempfile()
        .context("create temp output")?;
    let (file, path) = temp.keep().context("keep temp output")?;
    let path = path.canonicalize().unwrap_or(path);
    Ok((file, path))
}
