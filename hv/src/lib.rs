//! hbsview - Handlebars view rendering
//!
//! A view engine that turns a logical template name plus data into HTML,
//! wrapping the result in a layout. Built on the `handlebars` crate.
//!
//! # Features
//!
//! - **Layouts**: chosen per render by `locals.layout`, a `{{!< name}}` marker
//!   in the view, or the configured default
//! - **Partials**: registered from a directory, or only the ones a template
//!   references when caching is off
//! - **Content blocks**: `{{#contentFor "x"}}` in a view feeds `{{{block "x"}}}`
//!   in its layout, isolated per render
//! - **Themes**: a `theme` entry in request state selects a view subdirectory
//! - **Caching**: compiled views, chosen layouts and resolved paths are kept
//!   unless `disable-cache` is set
//!
//! # Modules
//!
//! - [`engine`] - the render pipeline
//! - [`context`] - per-request context and middleware
//! - [`compiler`] - compiler trait and Handlebars adapter
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod blocks;
pub mod cache;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod loader;
pub mod markers;
pub mod partials;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use blocks::RenderScope;
pub use compiler::{CompiledTemplate, HandlebarsCompiler, TemplateCompiler, current_scope};
pub use config::{TemplateOptions, ViewConfig};
pub use context::{Middleware, ViewContext};
pub use engine::{Engine, merge_locals};
pub use error::ViewError;
pub use loader::{FsLoader, TemplateLoader};
