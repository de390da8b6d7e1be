use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;

use super::RecordSink;
use crate::types::Record;

/// Headerless CSV, one `seq,key,field,value` row per record. Fields are quoted as needed.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvSink {
    pub fn new(file: File, path: PathBuf) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Self { writer, path }
    }
}

impl RecordSink for CsvSink {
    fn write_record(&mut self, record: &Record<'_>) -> Result<()> {
        self.writer
            .serialize(record)
            .context("write csv record")?;
        self.writer.flush().context("flush csv output")?;
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush().context("flush csv output")?;
        Ok(())
    }
}
