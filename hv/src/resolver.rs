//! Logical name to file path resolution

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::loader::TemplateLoader;

/// Maps logical template names to files under the view directory
///
/// Successful lookups are memoized when caching is enabled. A memoized path is
/// returned from then on without checking the file again.
pub struct PathResolver {
    view_path: PathBuf,
    layouts_path: PathBuf,
    extname: String,
    cache_enabled: bool,
    path_cache: RwLock<HashMap<String, PathBuf>>,
    loader: Arc<dyn TemplateLoader>,
}

impl PathResolver {
    pub fn new(
        view_path: impl Into<PathBuf>,
        layouts_path: impl Into<PathBuf>,
        extname: impl Into<String>,
        cache_enabled: bool,
        loader: Arc<dyn TemplateLoader>,
    ) -> Self {
        Self {
            view_path: view_path.into(),
            layouts_path: layouts_path.into(),
            extname: extname.into(),
            cache_enabled,
            path_cache: RwLock::new(HashMap::new()),
            loader,
        }
    }

    /// Resolve `name` (already theme-qualified) to an existing template file.
    ///
    /// Returns `None` when no file backs the name. Absolute names skip the
    /// lookup and get the extension appended as-is.
    pub async fn resolve(&self, name: &str) -> Option<PathBuf> {
        debug!(%name, "PathResolver::resolve: called");
        if Path::new(name).is_absolute() {
            debug!("PathResolver::resolve: absolute name, bypassing lookup");
            return Some(PathBuf::from(format!("{}{}", name, self.extname)));
        }

        if let Some(path) = self.path_cache.read().await.get(name) {
            debug!(?path, "PathResolver::resolve: memoized");
            return Some(path.clone());
        }

        let path = self.template_path(name);
        if !self.loader.exists(&path) {
            debug!(?path, "PathResolver::resolve: not found");
            return None;
        }

        if self.cache_enabled {
            self.path_cache.write().await.insert(name.to_string(), path.clone());
        }
        Some(path)
    }

    /// Path a template name maps to, whether or not the file exists
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.view_path.join(format!("{}{}", name, self.extname))
    }

    /// Path of a layout file
    pub fn layout_path(&self, layout: &str) -> PathBuf {
        self.layouts_path.join(format!("{}{}", layout, self.extname))
    }

    /// Number of memoized lookups
    pub async fn memoized(&self) -> usize {
        self.path_cache.read().await.len()
    }
}

/// Theme prefix (`"<theme>/"`) from request state, or empty
pub fn theme_prefix(state: &Map<String, Value>) -> String {
    match state.get("theme").and_then(Value::as_str) {
        Some(theme) if !theme.is_empty() => format!("{}/", theme),
        _ => String::new(),
    }
}
