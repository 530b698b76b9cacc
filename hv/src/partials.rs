//! Partial discovery and registration
//!
//! Partials are found two ways:
//!
//! 1. Directory scan: every `*<extname>` file under the partials root
//! 2. Reference scan: only the names a template mentions via `{{> name}}`
//!
//! Either way each file is read and registered with the compiler under its path
//! relative to the partials root, minus the extension (`nav/top.hbs` becomes
//! `nav/top`). Failures are logged and never abort a render.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info};

use crate::compiler::TemplateCompiler;
use crate::error::ViewError;
use crate::loader::TemplateLoader;

/// Registers partial files with a [`TemplateCompiler`]
pub struct PartialRegistry {
    root: PathBuf,
    extname: String,
    loader: Arc<dyn TemplateLoader>,
    compiler: Arc<dyn TemplateCompiler>,
    scanned: AtomicBool,
}

impl PartialRegistry {
    pub fn new(
        root: impl Into<PathBuf>,
        extname: impl Into<String>,
        loader: Arc<dyn TemplateLoader>,
        compiler: Arc<dyn TemplateCompiler>,
    ) -> Self {
        Self {
            root: root.into(),
            extname: extname.into(),
            loader,
            compiler,
            scanned: AtomicBool::new(false),
        }
    }

    /// Whether a partials root is configured at all
    pub fn enabled(&self) -> bool {
        !self.root.as_os_str().is_empty()
    }

    /// Whether a directory scan has completed successfully
    fn scanned(&self) -> bool {
        self.scanned.load(Ordering::Acquire)
    }

    /// Run the directory scan unless one already succeeded.
    ///
    /// A failed scan is retried on the next call.
    pub async fn ensure_scanned(&self) {
        if self.enabled() && !self.scanned() {
            self.register_all(None).await;
        }
    }

    /// Register partials, returning how many were registered.
    ///
    /// With `None` the whole partials directory is scanned. With a list only
    /// those names are read. Errors are logged and swallowed; partials
    /// registered before the failure stay registered.
    pub async fn register_all(&self, explicit: Option<Vec<String>>) -> usize {
        debug!(?explicit, "PartialRegistry::register_all: called");
        if !self.enabled() {
            debug!("PartialRegistry::register_all: no partials root, skipping");
            return 0;
        }

        let directory_scan = explicit.is_none();
        let mut registered = 0;
        match self.try_register_all(explicit, &mut registered).await {
            Ok(()) => {
                if directory_scan {
                    self.scanned.store(true, Ordering::Release);
                    info!(count = registered, root = ?self.root, "Registered partials from directory");
                }
            }
            Err(e) => {
                error!(error = %e, registered, "Error caught while registering partials");
            }
        }
        registered
    }

    async fn try_register_all(&self, explicit: Option<Vec<String>>, registered: &mut usize) -> Result<(), ViewError> {
        let files = match explicit {
            Some(names) => names
                .into_iter()
                .map(|name| PathBuf::from(format!("{}{}", name, self.extname)))
                .collect(),
            None => self.loader.list(&self.root, &self.extname).await?,
        };

        for rel in files {
            let name = self.partial_name(&rel);
            let source = self.loader.read(&self.root.join(&rel)).await?;
            self.compiler.register_partial(&name, &source)?;
            debug!(%name, "PartialRegistry::try_register_all: registered");
            *registered += 1;
        }
        Ok(())
    }

    /// Registration name for a path relative to the partials root
    pub fn partial_name(&self, rel: &Path) -> String {
        let rel = rel.to_string_lossy().replace('\\', "/");
        match rel.strip_suffix(&self.extname) {
            Some(stem) => stem.to_string(),
            None => rel,
        }
    }
}
