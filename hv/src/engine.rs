//! The render pipeline
//!
//! One [`Engine`] serves every request. A render:
//!
//! 1. Resolves the (theme-qualified) view name to a file
//! 2. Merges locals: call-time over request state over engine defaults
//! 3. Loads and compiles the view unless cached, registering referenced
//!    partials first when caching is off (the partials directory itself is
//!    scanned once, on the first render)
//! 4. Picks a layout: `locals.layout`, then a `{{!< name}}` marker, then the
//!    default layout
//! 5. Executes the view into `body`, then the layout around it
//!
//! Content blocks live in a [`RenderScope`] created for that render alone.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::blocks::RenderScope;
use crate::cache::{CacheEntry, TemplateCache};
use crate::compiler::{CompiledTemplate, HandlebarsCompiler, TemplateCompiler};
use crate::config::ViewConfig;
use crate::context::{Middleware, ViewContext};
use crate::error::ViewError;
use crate::loader::{FsLoader, TemplateLoader};
use crate::markers;
use crate::partials::PartialRegistry;
use crate::resolver::{PathResolver, theme_prefix};

/// Layout that emits the body unchanged
const IDENTITY_LAYOUT: &str = "{{{body}}}";
const IDENTITY_LAYOUT_KEY: &str = "layout::@identity";

/// Handlebars view engine
pub struct Engine {
    config: ViewConfig,
    compiler: Arc<dyn TemplateCompiler>,
    loader: Arc<dyn TemplateLoader>,
    resolver: PathResolver,
    partials: PartialRegistry,
    cache: TemplateCache,
    generation: AtomicU64,
}

impl Engine {
    /// Create an engine with the default Handlebars compiler and file loader
    pub fn new(config: ViewConfig) -> Result<Self, ViewError> {
        let compiler = Arc::new(HandlebarsCompiler::new(&config.template_options));
        Self::with_parts(config, compiler, Arc::new(FsLoader))
    }

    /// Create an engine around a pre-built compiler
    pub fn with_compiler(config: ViewConfig, compiler: Arc<dyn TemplateCompiler>) -> Result<Self, ViewError> {
        Self::with_parts(config, compiler, Arc::new(FsLoader))
    }

    /// Create an engine from explicit collaborators
    pub fn with_parts(
        config: ViewConfig,
        compiler: Arc<dyn TemplateCompiler>,
        loader: Arc<dyn TemplateLoader>,
    ) -> Result<Self, ViewError> {
        config.validate()?;
        info!(
            view_path = ?config.view_path,
            partials_path = ?config.partials_path,
            disable_cache = config.disable_cache,
            "Configuring view engine"
        );

        compiler.register_block_helpers(&config.block_helper_name, &config.content_helper_name);

        let cache_enabled = !config.disable_cache;
        let resolver = PathResolver::new(
            &config.view_path,
            config.layouts_dir(),
            &config.extname,
            cache_enabled,
            loader.clone(),
        );
        let partials = PartialRegistry::new(&config.partials_path, &config.extname, loader.clone(), compiler.clone());

        Ok(Self {
            resolver,
            partials,
            cache: TemplateCache::new(cache_enabled),
            generation: AtomicU64::new(0),
            config,
            compiler,
            loader,
        })
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn compiler(&self) -> &Arc<dyn TemplateCompiler> {
        &self.compiler
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Middleware that attaches this engine to each request
    pub fn middleware(self: &Arc<Self>) -> Middleware {
        Middleware::new(self.clone())
    }

    /// Scan the partials directory and register everything found.
    ///
    /// Runs automatically on the first render, cached or not.
    pub async fn register_partials(&self) -> usize {
        self.partials.register_all(None).await
    }

    /// Register a single partial from source text
    pub fn register_partial(&self, name: &str, source: &str) -> Result<(), ViewError> {
        self.compiler.register_partial(name, source)
    }

    /// Render `name` into the context body.
    ///
    /// On failure the body is left untouched.
    pub async fn render(&self, ctx: &mut ViewContext, name: &str, locals: Map<String, Value>) -> Result<(), ViewError> {
        let output = self.render_view(&ctx.state, &ctx.request, name, locals).await?;
        ctx.body = Some(output);
        Ok(())
    }

    /// Render `name` and return the output
    pub async fn render_view(
        &self,
        state: &Map<String, Value>,
        request: &Value,
        name: &str,
        locals: Map<String, Value>,
    ) -> Result<String, ViewError> {
        debug!(%name, "Engine::render_view: called");
        let logical = if Path::new(name).is_absolute() {
            name.to_string()
        } else {
            format!("{}{}", theme_prefix(state), name)
        };

        let path = match self.resolver.resolve(&logical).await {
            Some(path) => path,
            None => return Err(ViewError::missing_template(self.resolver.template_path(&logical))),
        };

        let mut locals = merge_locals(&self.config.locals, state, locals);

        self.partials.ensure_scanned().await;

        let entry = self.get_or_compile(&logical, &path, &locals).await?;
        let layout = match entry.layout {
            Some(layout) => Some(layout),
            None => self.default_layout().await,
        };

        let scope = RenderScope::with_data(self.execution_data(request));

        let body = self
            .compiler
            .execute(&entry.template, &Value::Object(locals.clone()), &scope)?;
        locals.insert("body".to_string(), Value::String(body));

        let layout = layout.ok_or_else(|| ViewError::LayoutUnavailable {
            template: logical.clone(),
        })?;
        let output = self.compiler.execute(&layout, &Value::Object(locals), &scope)?;

        let pending = scope.pending_blocks();
        if !pending.is_empty() {
            debug!(?pending, %logical, "Engine::render_view: blocks captured but never emitted");
        }
        Ok(output)
    }

    /// Compiled view and layout for `name`, from cache or freshly loaded
    async fn get_or_compile(&self, name: &str, path: &Path, locals: &Map<String, Value>) -> Result<CacheEntry, ViewError> {
        if let Some(entry) = self.cache.get(name).await {
            return Ok(entry);
        }

        debug!(%name, ?path, "Engine::get_or_compile: loading");
        let raw = self.loader.read(path).await?;
        if !self.cache.enabled() {
            self.register_referenced_partials(&raw).await;
        }

        let template = self.compiler.compile(&self.compile_key("view", path), &raw)?;
        let mut entry = CacheEntry::new(template);
        entry.layout = self.layout_for(&raw, locals).await?;

        self.cache.insert(name, entry.clone()).await;
        Ok(entry)
    }

    /// Layout chosen by locals or by a marker in the view text.
    ///
    /// `None` means neither applies and the default layout should be used.
    async fn layout_for(&self, raw: &str, locals: &Map<String, Value>) -> Result<Option<CompiledTemplate>, ViewError> {
        let name = match locals.get("layout") {
            Some(Value::Bool(false)) => return self.identity_layout().map(Some),
            Some(Value::String(name)) => Some(name.as_str()),
            Some(Value::Null) | None => markers::layout_name(raw),
            Some(other) => {
                warn!(layout = %other, "Ignoring layout local that is neither a name nor false");
                markers::layout_name(raw)
            }
        };

        match name {
            Some(name) => self.load_layout(name).await.map(Some),
            None => Ok(None),
        }
    }

    /// Read and compile a layout file; errors propagate
    async fn load_layout(&self, name: &str) -> Result<CompiledTemplate, ViewError> {
        let path = self.resolver.layout_path(name);
        debug!(%name, ?path, "Engine::load_layout: called");

        let raw = self.loader.read(&path).await?;
        if !self.cache.enabled() {
            self.register_referenced_partials(&raw).await;
        }
        self.compiler.compile(&self.compile_key("layout", &path), &raw)
    }

    /// The default layout, compiled once unless caching is off.
    ///
    /// Load failures are logged and yield `None`; the render then fails when
    /// it needs the layout.
    async fn default_layout(&self) -> Option<CompiledTemplate> {
        if let Some(layout) = self.cache.default_layout().await {
            return Some(layout);
        }

        let compiled = match self.config.default_layout.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => self.load_layout(name).await,
            None => self.identity_layout(),
        };

        match compiled {
            Ok(layout) => {
                self.cache.set_default_layout(layout.clone()).await;
                Some(layout)
            }
            Err(e) => {
                error!(error = %e, "Failed to load default layout");
                None
            }
        }
    }

    /// Registry key for a compiled file.
    ///
    /// With caching on every compile gets its own key, so recompiling a file
    /// for one view never changes what another cached entry executes.
    fn compile_key(&self, kind: &str, path: &Path) -> String {
        if self.cache.enabled() {
            let generation = self.generation.fetch_add(1, Ordering::Relaxed);
            format!("{}::{}#{}", kind, path.display(), generation)
        } else {
            format!("{}::{}", kind, path.display())
        }
    }

    fn identity_layout(&self) -> Result<CompiledTemplate, ViewError> {
        self.compiler.compile(IDENTITY_LAYOUT_KEY, IDENTITY_LAYOUT)
    }

    async fn register_referenced_partials(&self, raw: &str) {
        if !self.partials.enabled() {
            return;
        }
        let names = markers::partial_references(raw);
        if !names.is_empty() {
            self.partials.register_all(Some(names)).await;
        }
    }

    /// Template-option data plus the request under the host key
    fn execution_data(&self, request: &Value) -> Map<String, Value> {
        let mut data = self.config.template_options.data.clone();
        data.insert(self.config.host_key.clone(), request.clone());
        data
    }
}

/// Merge render variables; later layers win.
///
/// Precedence: `locals` over `state` over `defaults`.
pub fn merge_locals(
    defaults: &Map<String, Value>,
    state: &Map<String, Value>,
    locals: Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in state {
        merged.insert(key.clone(), value.clone());
    }
    merged.extend(locals);
    merged
}
