//! Per-render content blocks
//!
//! A child template captures fragments with the content helper
//! (`{{#contentFor "sidebar"}}...{{/contentFor}}`); its layout emits them with
//! the block helper (`{{{block "sidebar"}}}`). Each render owns one
//! [`RenderScope`], so concurrent requests never see each other's blocks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::debug;

/// Request-scoped state visible to helpers while a view executes
///
/// Cloning is cheap and shares the same block table, so the scope can be
/// handed to the compiler for the template and then the layout.
#[derive(Debug, Clone, Default)]
pub struct RenderScope {
    blocks: Arc<Mutex<HashMap<String, Vec<String>>>>,
    data: Arc<Map<String, Value>>,
}

impl RenderScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope carrying execution data (template options plus the
    /// request context)
    pub fn with_data(data: Map<String, Value>) -> Self {
        Self {
            blocks: Arc::new(Mutex::new(HashMap::new())),
            data: Arc::new(data),
        }
    }

    /// Execution data for helpers
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Append a rendered fragment to the named block
    pub fn append_content(&self, name: &str, fragment: impl Into<String>) {
        debug!(%name, "RenderScope::append_content: called");
        self.lock().entry(name.to_string()).or_default().push(fragment.into());
    }

    /// Join the named block's fragments with newlines and clear it.
    ///
    /// Returns an empty string when nothing was captured.
    pub fn consume_block(&self, name: &str) -> String {
        debug!(%name, "RenderScope::consume_block: called");
        match self.lock().get_mut(name) {
            Some(fragments) => std::mem::take(fragments).join("\n"),
            None => String::new(),
        }
    }

    /// Names of blocks that still hold fragments
    pub fn pending_blocks(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, fragments)| !fragments.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_then_consume_joins_with_newline() {
        let scope = RenderScope::new();
        scope.append_content("scripts", "<script src=a.js></script>");
        scope.append_content("scripts", "<script src=b.js></script>");

        assert_eq!(
            scope.consume_block("scripts"),
            "<script src=a.js></script>\n<script src=b.js></script>"
        );
    }

    #[test]
    fn test_consume_clears_block() {
        let scope = RenderScope::new();
        scope.append_content("sidebar", "X");

        assert_eq!(scope.consume_block("sidebar"), "X");
        assert_eq!(scope.consume_block("sidebar"), "");
    }

    #[test]
    fn test_consume_unknown_block_is_empty() {
        let scope = RenderScope::new();
        assert_eq!(scope.consume_block("nothing"), "");
    }

    #[test]
    fn test_pending_blocks_lists_unconsumed() {
        let scope = RenderScope::new();
        scope.append_content("b", "1");
        scope.append_content("a", "2");
        scope.consume_block("b");

        assert_eq!(scope.pending_blocks(), vec!["a".to_string()]);
    }

    #[test]
    fn test_scopes_are_isolated() {
        let first = RenderScope::new();
        let second = RenderScope::new();
        first.append_content("sidebar", "X");

        assert_eq!(second.consume_block("sidebar"), "");
        assert_eq!(first.consume_block("sidebar"), "X");
    }

    #[test]
    fn test_clones_share_blocks() {
        let scope = RenderScope::new();
        let handle = scope.clone();
        handle.append_content("sidebar", "X");

        assert_eq!(scope.consume_block("sidebar"), "X");
        assert_eq!(handle.consume_block("sidebar"), "");
    }

    #[test]
    fn test_with_data() {
        let mut data = Map::new();
        data.insert("request".to_string(), Value::from("/home"));
        let scope = RenderScope::with_data(data);

        assert_eq!(scope.data()["request"], Value::from("/home"));
    }
}
