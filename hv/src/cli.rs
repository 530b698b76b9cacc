//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::{Context, Result, bail};
use serde_json::{Map, Value};

/// hbsview - render Handlebars views from the command line
#[derive(Parser)]
#[command(name = "hv", about = "Render Handlebars views with layouts, partials and content blocks", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Override the configured view directory
    #[arg(short = 'v', long = "view-path", global = true)]
    pub view_path: Option<PathBuf>,

    /// Disable template caching
    #[arg(long = "no-cache", global = true)]
    pub no_cache: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a view to stdout
    Render {
        /// Logical view name, relative to the view directory
        name: String,

        /// Render locals as a JSON object
        #[arg(long)]
        locals: Option<String>,

        /// Request state as a JSON object
        #[arg(long)]
        state: Option<String>,

        /// Request data exposed to helpers, as JSON
        #[arg(long)]
        request: Option<String>,

        /// Theme subdirectory to render from
        #[arg(short, long)]
        theme: Option<String>,
    },

    /// List partials found under the partials directory
    Partials,

    /// Show which layout a view declares
    Layout {
        /// Logical view name
        name: String,
    },
}

/// Parse an optional JSON object argument
pub fn parse_object(arg: Option<&str>, what: &str) -> Result<Map<String, Value>> {
    let Some(raw) = arg else {
        return Ok(Map::new());
    };
    match serde_json::from_str(raw).context(format!("Failed to parse --{} as JSON", what))? {
        Value::Object(map) => Ok(map),
        other => bail!("--{} must be a JSON object, got {}", what, other),
    }
}
