//! Single-threaded producer: pages through the listing into the first channel.

use anyhow::{Context, Result};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use super::channel::BoundedChannel;
use super::quiescence::QuiescentFlag;
use crate::engine::store::ObjectLister;
use crate::types::ObjectRef;

/// Spawn the lister thread. The handle yields the number of objects put, or the listing error.
pub fn spawn_lister(
    lister: Arc<dyn ObjectLister>,
    max_keys: usize,
    output: Arc<BoundedChannel<ObjectRef>>,
    done: Arc<QuiescentFlag>,
    cancel: Arc<AtomicBool>,
) -> Result<JoinHandle<Result<usize>>> {
    thread::Builder::new()
        .name("list".to_string())
        .spawn(move || run_lister(lister.as_ref(), max_keys, &output, &done, &cancel))
        .context("spawn lister")
}

/// Put every listed object into `output`, then mark `done`.
///
/// `done` is marked on failure too, so downstream stages drain what was already admitted;
/// the error is returned for the caller to fail the run. Once `cancel` is set no further
/// page is requested and no further object is put.
pub fn run_lister(
    lister: &dyn ObjectLister,
    max_keys: usize,
    output: &BoundedChannel<ObjectRef>,
    done: &QuiescentFlag,
    cancel: &AtomicBool,
) -> Result<usize> {
    let result = list_all(lister, max_keys, output, cancel);
    done.mark();
    if let Ok(count) = result {
        debug!("list: quiescent after {} objects", count);
    }
    result
}

fn list_all(
    lister: &dyn ObjectLister,
    max_keys: usize,
    output: &BoundedChannel<ObjectRef>,
    cancel: &AtomicBool,
) -> Result<usize> {
    let container = lister.container().to_string();
    let mut count = 0_usize;
    let mut pages = 1_usize;
    let mut page = lister
        .list_page(None, max_keys)
        .with_context(|| format!("list {container}"))?;
    loop {
        let truncated = page.truncated;
        let token = page.continuation.take();
        for object in page.objects {
            if cancel.load(Ordering::Acquire) {
                debug!("list: cancelled after {} objects", count);
                return Ok(count);
            }
            output.put(object)?;
            count += 1;
        }
        if !truncated || cancel.load(Ordering::Acquire) {
            break;
        }
        let token = token.ok_or_else(|| {
            anyhow::anyhow!("list {container}: page {pages} truncated without a continuation token")
        })?;
        pages += 1;
        page = lister
            .list_page(Some(&token), max_keys)
            .with_context(|| format!("list {container} (page {pages})"))?;
    }
    debug!("list: {} pages from {}", pages, container);
    Ok(count)
}
