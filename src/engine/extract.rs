//! Metadata extraction: EXIF primary image directory (IFD0) flattened to tag → description.

use anyhow::{Context, Result};
use exif::{Exif, In, Reader};
use std::io::Cursor;

use crate::types::Metadata;

/// Turns raw object bytes into a flat metadata mapping. Errors are per item.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<Metadata>;
}

/// Reads EXIF from JPEG, TIFF, PNG, HEIF or WebP and keeps the primary directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExifExtractor;

impl MetadataExtractor for ExifExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Metadata> {
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .context("read exif")?;
        let fields = primary_fields(&exif);
        if fields.is_empty() {
            anyhow::bail!("no primary image directory");
        }
        Ok(fields)
    }
}

/// Fields of IFD0 as tag name → display value (with units where the tag has one).
pub fn primary_fields(exif: &Exif) -> Metadata {
    exif.fields()
        .filter(|f| f.ifd_num == In::PRIMARY)
        .map(|f| {
            (
                f.tag.to_string(),
                f.display_value().with_unit(exif).to_string(),
            )
        })
        .collect()
}
