use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use super::RecordSink;
use crate::types::Record;

/// One JSON object per line: `{"seq":1,"key":"...","field":"...","value":"..."}`.
pub struct JsonlSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(file: File, path: PathBuf) -> Self {
        Self {
            writer: BufWriter::new(file),
            path,
        }
    }
}

impl RecordSink for JsonlSink {
    fn write_record(&mut self, record: &Record<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("write json record")?;
        self.writer.write_all(b"\n").context("write json record")?;
        self.writer.flush().context("flush json output")?;
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush().context("flush json output")?;
        Ok(())
    }
}
