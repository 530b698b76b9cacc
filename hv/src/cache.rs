//! Compiled template and layout cache

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::compiler::CompiledTemplate;

/// A compiled view and the layout chosen for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub template: CompiledTemplate,
    pub layout: Option<CompiledTemplate>,
}

impl CacheEntry {
    pub fn new(template: CompiledTemplate) -> Self {
        Self { template, layout: None }
    }
}

/// Per-name compiled views plus the lazily compiled default layout
///
/// When disabled nothing is stored, so every lookup misses.
pub struct TemplateCache {
    enabled: bool,
    entries: RwLock<HashMap<String, CacheEntry>>,
    default_layout: RwLock<Option<CompiledTemplate>>,
}

impl TemplateCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
            default_layout: RwLock::new(None),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Cached entry for a view name
    pub async fn get(&self, name: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }
        let entry = self.entries.read().await.get(name).cloned();
        debug!(%name, hit = entry.is_some(), "TemplateCache::get: called");
        entry
    }

    /// Store an entry, replacing any previous one for the name
    pub async fn insert(&self, name: &str, entry: CacheEntry) {
        if !self.enabled {
            return;
        }
        debug!(%name, "TemplateCache::insert: called");
        self.entries.write().await.insert(name.to_string(), entry);
    }

    /// The cached default layout
    pub async fn default_layout(&self) -> Option<CompiledTemplate> {
        if !self.enabled {
            return None;
        }
        self.default_layout.read().await.clone()
    }

    pub async fn set_default_layout(&self, layout: CompiledTemplate) {
        if !self.enabled {
            return;
        }
        *self.default_layout.write().await = Some(layout);
    }

    /// Number of cached views
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
