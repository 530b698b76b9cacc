//! Template file access
//!
//! Every file the engine touches goes through a [`TemplateLoader`]. The default
//! [`FsLoader`] reads from disk; tests wrap it to count reads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ViewError;

/// Source of template, layout and partial text
#[async_trait]
pub trait TemplateLoader: Send + Sync {
    /// Read a file as UTF-8 text
    async fn read(&self, path: &Path) -> Result<String, ViewError>;

    /// Synchronous existence probe used by path resolution
    fn exists(&self, path: &Path) -> bool;

    /// Recursively list files under `root` whose names end in `extname`.
    ///
    /// Returned paths are relative to `root`.
    async fn list(&self, root: &Path, extname: &str) -> Result<Vec<PathBuf>, ViewError>;
}

/// Loader backed by the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

#[async_trait]
impl TemplateLoader for FsLoader {
    async fn read(&self, path: &Path) -> Result<String, ViewError> {
        debug!(?path, "FsLoader::read: called");
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ViewError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    async fn list(&self, root: &Path, extname: &str) -> Result<Vec<PathBuf>, ViewError> {
        debug!(?root, %extname, "FsLoader::list: called");
        let root = root.to_path_buf();
        let extname = extname.to_string();
        let walk_root = root.clone();

        let listed = tokio::task::spawn_blocking(move || walk(&walk_root, &extname))
            .await
            .map_err(|e| ViewError::io(&root, std::io::Error::other(e)))??;

        debug!(count = listed.len(), "FsLoader::list: done");
        Ok(listed)
    }
}

fn walk(root: &Path, extname: &str) -> Result<Vec<PathBuf>, ViewError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            ViewError::io(path, e.into())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(extname));
        if !matches {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(rel.to_path_buf());
        }
    }
    Ok(files)
}
