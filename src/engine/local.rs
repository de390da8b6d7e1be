//! Local directory tree served as a bucket: keys are `/`-separated paths relative to the root.

use anyhow::{Context, Result};
use log::warn;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::store::{ObjectFetcher, ObjectLister, read_exact_size};
use crate::types::{ListingPage, ObjectRef};

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Normalize a relative path to an object key (forward slashes on every platform).
pub fn path_to_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Check if a file should be excluded based on OS-specific hidden files
pub fn is_os_hidden_file(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        match name {
            // macOS
            ".DS_Store" | ".AppleDouble" | ".LSOverride" => true,
            // Windows
            "Thumbs.db" | "ehthumbs.db" | "Desktop.ini" => true,
            // Linux
            ".directory" => true,
            // macOS resource forks
            _ => name.starts_with("._"),
        }
    } else {
        false
    }
}

/// Snapshot of the regular files under a root, taken at [`DirectoryStore::open`].
///
/// Continuation tokens are decimal offsets into the snapshot.
pub struct DirectoryStore {
    root: PathBuf,
    container: String,
    objects: Vec<ObjectRef>,
}

impl DirectoryStore {
    /// Walk `root` (sorted by file name) and record every regular file.
    /// Unreadable entries are skipped with a warning.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("canonicalize {}", root.display()))?;
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }
        let container = root.display().to_string();
        let mut objects = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!("skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() || is_os_hidden_file(entry.path()) {
                continue;
            }
            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(err) => {
                    warn!("skipping {}: {}", entry.path().display(), err);
                    continue;
                }
            };
            let Some(rel) = path_relative_to(entry.path(), &root) else {
                continue;
            };
            objects.push(ObjectRef::new(container.clone(), path_to_key(&rel), size));
        }
        Ok(Self {
            root,
            container,
            objects,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectLister for DirectoryStore {
    fn list_page(&self, continuation: Option<&str>, max_keys: usize) -> Result<ListingPage> {
        let start = match continuation {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .with_context(|| format!("invalid continuation token {token:?}"))?,
        };
        if start > self.objects.len() {
            anyhow::bail!("continuation token {start} is past the end of the listing");
        }
        let end = start.saturating_add(max_keys.max(1)).min(self.objects.len());
        let truncated = end < self.objects.len();
        Ok(ListingPage {
            objects: self.objects[start..end].to_vec(),
            continuation: truncated.then(|| end.to_string()),
            truncated,
        })
    }

    fn container(&self) -> &str {
        &self.container
    }
}

impl ObjectFetcher for DirectoryStore {
    fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        let path = self.root.join(&object.key);
        let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
        read_exact_size(file, object.size)
    }
}
