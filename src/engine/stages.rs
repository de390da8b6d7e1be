//! Stage functions for the pooled stages.

use anyhow::Result;
use std::sync::Arc;

use super::extract::MetadataExtractor;
use super::store::ObjectFetcher;
use crate::types::{Admitted, ExtractedItem, FetchedItem, ObjectRef};

/// Download the whole object. The admission id becomes the item's sequence id.
pub fn fetch_stage(
    fetcher: Arc<dyn ObjectFetcher>,
) -> impl Fn(Admitted<ObjectRef>) -> Result<FetchedItem> + Send + Sync + 'static {
    move |Admitted { seq, item: object }| {
        let payload = fetcher.fetch(&object)?;
        Ok(FetchedItem {
            seq,
            object,
            payload,
        })
    }
}

/// Extract metadata; the payload is released here.
pub fn extract_stage(
    extractor: Arc<dyn MetadataExtractor>,
) -> impl Fn(Admitted<FetchedItem>) -> Result<ExtractedItem> + Send + Sync + 'static {
    move |Admitted { item, .. }| {
        let FetchedItem {
            seq,
            object,
            payload,
        } = item;
        let fields = extractor.extract(&payload)?;
        Ok(ExtractedItem {
            seq,
            object,
            fields,
        })
    }
}
