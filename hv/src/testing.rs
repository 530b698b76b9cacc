//! Test doubles shared by unit tests

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::blocks::RenderScope;
use crate::compiler::{CompiledTemplate, HandlebarsCompiler, TemplateCompiler};
use crate::error::ViewError;
use crate::loader::{FsLoader, TemplateLoader};

/// File-system loader that records every read and listing
#[derive(Default)]
pub(crate) struct CountingLoader {
    inner: FsLoader,
    reads: Mutex<Vec<PathBuf>>,
    lists: AtomicUsize,
}

impl CountingLoader {
    pub(crate) fn reads(&self) -> usize {
        self.reads.lock().unwrap().len()
    }

    pub(crate) fn reads_of(&self, path: &Path) -> usize {
        self.reads.lock().unwrap().iter().filter(|p| p.as_path() == path).count()
    }

    pub(crate) fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateLoader for CountingLoader {
    async fn read(&self, path: &Path) -> Result<String, ViewError> {
        self.reads.lock().unwrap().push(path.to_path_buf());
        self.inner.read(path).await
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    async fn list(&self, root: &Path, extname: &str) -> Result<Vec<PathBuf>, ViewError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list(root, extname).await
    }
}

/// Handlebars compiler that counts compilations per key
#[derive(Default)]
pub(crate) struct CountingCompiler {
    inner: HandlebarsCompiler,
    compiles: Mutex<Vec<String>>,
}

impl CountingCompiler {
    pub(crate) fn compiles(&self) -> usize {
        self.compiles.lock().unwrap().len()
    }

    pub(crate) fn compiles_matching(&self, needle: &str) -> usize {
        self.compiles.lock().unwrap().iter().filter(|k| k.contains(needle)).count()
    }
}

impl TemplateCompiler for CountingCompiler {
    fn compile(&self, key: &str, source: &str) -> Result<CompiledTemplate, ViewError> {
        self.compiles.lock().unwrap().push(key.to_string());
        self.inner.compile(key, source)
    }

    fn execute(&self, template: &CompiledTemplate, locals: &Value, scope: &RenderScope) -> Result<String, ViewError> {
        self.inner.execute(template, locals, scope)
    }

    fn register_partial(&self, name: &str, source: &str) -> Result<(), ViewError> {
        self.inner.register_partial(name, source)
    }

    fn has_partial(&self, name: &str) -> bool {
        self.inner.has_partial(name)
    }

    fn register_block_helpers(&self, block_helper: &str, content_helper: &str) {
        self.inner.register_block_helpers(block_helper, content_helper)
    }
}
