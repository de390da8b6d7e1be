//! Pipeline context: collaborators and the three hand-off channels.

use std::sync::Arc;

use super::channel::BoundedChannel;
use crate::engine::extract::MetadataExtractor;
use crate::engine::store::{ObjectFetcher, ObjectLister};
use crate::types::{ExtractedItem, FetchedItem, ObjectRef};

/// The pluggable stage bodies. One value can serve as both lister and fetcher.
#[derive(Clone)]
pub struct Collaborators {
    pub lister: Arc<dyn ObjectLister>,
    pub fetcher: Arc<dyn ObjectFetcher>,
    pub extractor: Arc<dyn MetadataExtractor>,
}

/// Channels between the stages: lister → fetcher → extractor → archiver.
pub struct PipelineChannels {
    pub listed: Arc<BoundedChannel<ObjectRef>>,
    pub fetched: Arc<BoundedChannel<FetchedItem>>,
    pub extracted: Arc<BoundedChannel<ExtractedItem>>,
}

pub fn create_pipeline_channels(capacity: usize) -> PipelineChannels {
    PipelineChannels {
        listed: Arc::new(BoundedChannel::new(capacity)),
        fetched: Arc::new(BoundedChannel::new(capacity)),
        extracted: Arc::new(BoundedChannel::new(capacity)),
    }
}
