//! View engine configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ViewError;

/// File name looked up in the working and user config directories
const CONFIG_FILE: &str = "hbsview.yml";

/// Main view engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Base directory for templates (required)
    #[serde(rename = "view-path")]
    pub view_path: PathBuf,

    /// File suffix applied to every logical name
    pub extname: String,

    /// Base directory for partials (empty disables auto-registration)
    #[serde(rename = "partials-path")]
    pub partials_path: PathBuf,

    /// Separate directory for layouts (empty falls back to view-path)
    #[serde(rename = "layouts-path")]
    pub layouts_path: PathBuf,

    /// Logical name of the fallback layout
    #[serde(rename = "default-layout")]
    pub default_layout: Option<String>,

    /// Name of the helper that captures content for a layout block
    #[serde(rename = "content-helper-name")]
    pub content_helper_name: String,

    /// Name of the helper that emits a captured block
    #[serde(rename = "block-helper-name")]
    pub block_helper_name: String,

    /// Engine-wide default render variables
    pub locals: Map<String, Value>,

    /// Recompile and re-register everything on each render
    #[serde(rename = "disable-cache")]
    pub disable_cache: bool,

    /// Key under which the request context is injected into execution data
    #[serde(rename = "host-key")]
    pub host_key: String,

    /// Options handed to the template compiler
    #[serde(rename = "template-options")]
    pub template_options: TemplateOptions,

    /// Log level for the `hv` binary (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            view_path: PathBuf::new(),
            extname: ".hbs".to_string(),
            partials_path: PathBuf::new(),
            layouts_path: PathBuf::new(),
            default_layout: None,
            content_helper_name: "contentFor".to_string(),
            block_helper_name: "block".to_string(),
            locals: Map::new(),
            disable_cache: false,
            host_key: "request".to_string(),
            template_options: TemplateOptions::default(),
            log_level: None,
        }
    }
}

impl ViewConfig {
    /// Create a config rooted at the given view directory
    pub fn new(view_path: impl Into<PathBuf>) -> Self {
        Self {
            view_path: view_path.into(),
            ..Self::default()
        }
    }

    /// Validate configuration before use
    ///
    /// `view-path` is the only required option. Everything else has a default.
    pub fn validate(&self) -> Result<(), ViewError> {
        if self.view_path.as_os_str().is_empty() {
            return Err(ViewError::bad_options(
                "The option `view-path` must be specified",
                "view-path",
            ));
        }
        if self.extname.is_empty() {
            return Err(ViewError::bad_options("The option `extname` must not be empty", "extname"));
        }
        if self.block_helper_name == self.content_helper_name {
            return Err(ViewError::bad_options(
                "The block and content helpers must have different names",
                "block-helper-name",
            ));
        }
        Ok(())
    }

    /// Whether partial auto-registration is enabled
    pub fn partials_enabled(&self) -> bool {
        !self.partials_path.as_os_str().is_empty()
    }

    /// Directory layouts are read from
    pub fn layouts_dir(&self) -> &Path {
        if self.layouts_path.as_os_str().is_empty() {
            &self.view_path
        } else {
            &self.layouts_path
        }
    }

    /// Load configuration from `config_path`, or else from the first
    /// candidate file that parses: `./hbsview.yml`, then
    /// `<config_dir>/hbsview/hbsview.yml`. Defaults apply when none does.
    ///
    /// An explicit path must load; broken candidates are skipped.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let candidates = std::iter::once(PathBuf::from(CONFIG_FILE))
            .chain(dirs::config_dir().map(|dir| dir.join("hbsview").join(CONFIG_FILE)));
        for candidate in candidates.filter(|path| path.is_file()) {
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!(path = %candidate.display(), error = %e, "Skipping unreadable config"),
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// Options handed to the template compiler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Fail on missing fields instead of rendering them empty
    #[serde(rename = "strict-mode")]
    pub strict_mode: bool,

    /// Disable HTML escaping of `{{expression}}` output
    #[serde(rename = "no-escape")]
    pub no_escape: bool,

    /// Data visible to helpers during execution
    pub data: Map<String, Value>,
}
