//! Template compiler seam
//!
//! The engine never evaluates Handlebars expressions itself. It hands raw text
//! to a [`TemplateCompiler`] and later asks it to execute the compiled form.
//! [`HandlebarsCompiler`] is the default implementation.

mod hbs;

use serde_json::Value;

use crate::blocks::RenderScope;
use crate::error::ViewError;

pub use hbs::{HandlebarsCompiler, current_scope};

/// Handle to a template the compiler has accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    key: String,
    name: String,
}

impl CompiledTemplate {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }

    /// Key the compiler stores the template under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human-readable name used in errors and logs
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Compiles and executes templates, and owns the partial table
///
/// Implementations must be usable from many renders at once.
pub trait TemplateCompiler: Send + Sync {
    /// Compile `source` and store it under `key`, replacing any previous
    /// template with that key
    fn compile(&self, key: &str, source: &str) -> Result<CompiledTemplate, ViewError>;

    /// Execute a compiled template against `locals`.
    ///
    /// `scope` is the render the execution belongs to; block helpers read and
    /// write its content blocks.
    fn execute(&self, template: &CompiledTemplate, locals: &Value, scope: &RenderScope) -> Result<String, ViewError>;

    /// Register a partial by name (last write wins)
    fn register_partial(&self, name: &str, source: &str) -> Result<(), ViewError>;

    /// Whether a partial with this name is registered
    fn has_partial(&self, name: &str) -> bool;

    /// Install the content-capture and block-consume helpers under the given
    /// names
    fn register_block_helpers(&self, block_helper: &str, content_helper: &str);
}
