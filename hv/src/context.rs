//! Request context and middleware
//!
//! The HTTP framework is not part of this crate. [`ViewContext`] models the
//! little of a request it needs: ambient state (including the theme), the
//! request itself as data for helpers, and the response body.

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::Engine;
use crate::error::ViewError;

/// Per-request state a view renders into
#[derive(Clone, Default)]
pub struct ViewContext {
    /// Ambient request state, merged between engine defaults and call locals
    pub state: Map<String, Value>,

    /// The request, injected into execution data under the engine's host key
    pub request: Value,

    /// Response body, set by a successful render
    pub body: Option<String>,

    engine: Option<Arc<Engine>>,
}

impl ViewContext {
    /// Create a context for a request
    pub fn new(request: Value) -> Self {
        debug!(?request, "ViewContext::new: called");
        Self {
            request,
            ..Self::default()
        }
    }

    /// Replace the ambient state
    pub fn with_state(mut self, state: Map<String, Value>) -> Self {
        self.state = state;
        self
    }

    /// Set a single state value
    pub fn set_state(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.insert(key.into(), value.into());
    }

    /// Select a theme directory for this request
    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.set_state("theme", theme.into());
    }

    /// Attach the engine `render` delegates to
    pub fn attach(&mut self, engine: Arc<Engine>) {
        self.engine = Some(engine);
    }

    pub fn is_attached(&self) -> bool {
        self.engine.is_some()
    }

    /// Render a view into `body`
    pub async fn render(&mut self, name: &str, locals: Map<String, Value>) -> Result<(), ViewError> {
        let engine = self.engine.clone().ok_or(ViewError::NotAttached)?;
        engine.render(self, name, locals).await
    }
}

impl std::fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewContext")
            .field("state", &self.state)
            .field("request", &self.request)
            .field("body", &self.body)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Attaches an engine to each request before handing it on
#[derive(Clone)]
pub struct Middleware {
    engine: Arc<Engine>,
}

impl Middleware {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Attach the engine to `ctx`, then run the rest of the chain
    pub async fn handle<F, Fut>(&self, mut ctx: ViewContext, next: F) -> Result<ViewContext, ViewError>
    where
        F: FnOnce(ViewContext) -> Fut,
        Fut: Future<Output = Result<ViewContext, ViewError>>,
    {
        debug!("Middleware::handle: called");
        ctx.attach(self.engine.clone());
        next(ctx).await
    }
}
