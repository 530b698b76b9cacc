//! Handlebars-backed template compiler

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderErrorReason, Renderable,
    StringOutput, no_escape,
};
use serde_json::Value;
use tracing::debug;

use super::{CompiledTemplate, TemplateCompiler};
use crate::blocks::RenderScope;
use crate::config::TemplateOptions;
use crate::error::ViewError;

tokio::task_local! {
    static ACTIVE_SCOPE: RenderScope;
}

/// The render scope of the execution currently running on this task, if any.
///
/// Custom helpers use this to reach the request data injected by the engine.
pub fn current_scope() -> Option<RenderScope> {
    ACTIVE_SCOPE.try_with(|scope| scope.clone()).ok()
}

/// [`TemplateCompiler`] over a shared Handlebars registry
pub struct HandlebarsCompiler {
    registry: RwLock<Handlebars<'static>>,
}

impl HandlebarsCompiler {
    /// Create a compiler with a fresh registry configured from `options`
    pub fn new(options: &TemplateOptions) -> Self {
        debug!(?options, "HandlebarsCompiler::new: called");
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(options.strict_mode);
        if options.no_escape {
            hbs.register_escape_fn(no_escape);
        }
        Self::from_registry(hbs)
    }

    /// Wrap a pre-built registry (custom helpers, escape fn, etc.)
    pub fn from_registry(hbs: Handlebars<'static>) -> Self {
        Self {
            registry: RwLock::new(hbs),
        }
    }

    /// Register an additional helper on the underlying registry
    pub fn register_helper(&self, name: &str, helper: Box<dyn HelperDef + Send + Sync + 'static>) {
        debug!(%name, "HandlebarsCompiler::register_helper: called");
        self.write().register_helper(name, helper);
    }

    fn read(&self) -> RwLockReadGuard<'_, Handlebars<'static>> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Handlebars<'static>> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HandlebarsCompiler {
    fn default() -> Self {
        Self::new(&TemplateOptions::default())
    }
}

impl TemplateCompiler for HandlebarsCompiler {
    fn compile(&self, key: &str, source: &str) -> Result<CompiledTemplate, ViewError> {
        debug!(%key, "HandlebarsCompiler::compile: called");
        self.write()
            .register_template_string(key, source)
            .map_err(|e| ViewError::Compile {
                name: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(CompiledTemplate::new(key, key))
    }

    fn execute(&self, template: &CompiledTemplate, locals: &Value, scope: &RenderScope) -> Result<String, ViewError> {
        debug!(key = %template.key(), "HandlebarsCompiler::execute: called");
        let registry = self.read();
        ACTIVE_SCOPE
            .sync_scope(scope.clone(), || registry.render(template.key(), locals))
            .map_err(|e| ViewError::Execute {
                name: template.name().to_string(),
                message: e.to_string(),
            })
    }

    fn register_partial(&self, name: &str, source: &str) -> Result<(), ViewError> {
        debug!(%name, "HandlebarsCompiler::register_partial: called");
        self.write()
            .register_partial(name, source)
            .map_err(|e| ViewError::Compile {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    fn has_partial(&self, name: &str) -> bool {
        self.read().has_template(name)
    }

    fn register_block_helpers(&self, block_helper: &str, content_helper: &str) {
        debug!(%block_helper, %content_helper, "HandlebarsCompiler::register_block_helpers: called");
        let mut hbs = self.write();
        hbs.register_helper(block_helper, Box::new(BlockHelper));
        hbs.register_helper(content_helper, Box::new(ContentForHelper));
    }
}

/// `{{#contentFor "name"}}...{{/contentFor}}` - render the inner template and
/// append it to the named block
struct ContentForHelper;

impl HelperDef for ContentForHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        _out: &mut dyn Output,
    ) -> HelperResult {
        let name = block_name(h)?;
        let scope = scope_for(h)?;

        let mut captured = StringOutput::new();
        if let Some(template) = h.template() {
            template.render(r, ctx, rc, &mut captured)?;
        }
        let fragment = captured
            .into_string()
            .map_err(|e| RenderErrorReason::Other(e.to_string()))?;

        scope.append_content(&name, fragment);
        Ok(())
    }
}

/// `{{{block "name"}}}` or `{{#block "name"}}default{{/block}}` - emit the
/// named block, falling back to the inner template when it is empty
struct BlockHelper;

impl HelperDef for BlockHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let name = block_name(h)?;
        let scope = scope_for(h)?;

        let content = scope.consume_block(&name);
        if content.is_empty() {
            if let Some(default) = h.template() {
                return default.render(r, ctx, rc, out);
            }
        }
        out.write(&content)?;
        Ok(())
    }
}

fn block_name(h: &Helper<'_>) -> Result<String, RenderErrorReason> {
    h.param(0)
        .and_then(|p| p.value().as_str())
        .map(str::to_string)
        .ok_or_else(|| RenderErrorReason::Other(format!("Helper `{}` requires a block name", h.name())))
}

fn scope_for(h: &Helper<'_>) -> Result<RenderScope, RenderErrorReason> {
    current_scope()
        .ok_or_else(|| RenderErrorReason::Other(format!("Helper `{}` used outside of a view render", h.name())))
}
