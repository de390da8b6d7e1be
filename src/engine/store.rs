//! Object store collaborators: paginated listing and whole-object fetch.

use anyhow::Result;

use crate::types::{ListingPage, ObjectRef};

/// Paginated listing of one container.
///
/// `continuation` is None for the first page, then the token from the previous page.
/// Errors are fatal to the run.
pub trait ObjectLister: Send + Sync {
    fn list_page(&self, continuation: Option<&str>, max_keys: usize) -> Result<ListingPage>;

    /// Container identifier, for logs.
    fn container(&self) -> &str;
}

/// Whole-object download. Errors are per item.
pub trait ObjectFetcher: Send + Sync {
    fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>>;
}

/// Read exactly `size` bytes from `reader`; a shorter body is an error, trailing bytes are ignored.
pub fn read_exact_size<R: std::io::Read>(reader: R, size: u64) -> Result<Vec<u8>> {
    use std::io::Read;
    let capacity = usize::try_from(size)
        .map_err(|_| anyhow::anyhow!("object of {size} bytes does not fit in memory"))?;
    let mut buf = Vec::with_capacity(capacity);
    reader.take(size).read_to_end(&mut buf)?;
    if buf.len() != capacity {
        anyhow::bail!("short read: got {} of {} bytes", buf.len(), size);
    }
    Ok(buf)
}
