//! View error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring the engine or rendering a view
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("{message} (option: {option})")]
    BadOptions { message: String, option: String },

    #[error("{message}: {}", path.display())]
    MissingTemplate { message: String, path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compile template {name}: {message}")]
    Compile { name: String, message: String },

    #[error("Failed to execute template {name}: {message}")]
    Execute { name: String, message: String },

    #[error("No layout available for template {template}")]
    LayoutUnavailable { template: String },

    #[error("No view engine attached to this context")]
    NotAttached,
}

impl ViewError {
    /// Missing `view-path` (or any other required option)
    pub fn bad_options(message: impl Into<String>, option: impl Into<String>) -> Self {
        ViewError::BadOptions {
            message: message.into(),
            option: option.into(),
        }
    }

    /// Template that could not be resolved to a file
    pub fn missing_template(path: impl Into<PathBuf>) -> Self {
        ViewError::MissingTemplate {
            message: "The template specified does not exist".to_string(),
            path: path.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ViewError::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error means the requested view does not exist
    pub fn is_missing_template(&self) -> bool {
        matches!(self, ViewError::MissingTemplate { .. })
    }

    /// The path that was attempted, when the error carries one
    pub fn attempted_path(&self) -> Option<&PathBuf> {
        match self {
            ViewError::MissingTemplate { path, .. } => Some(path),
            ViewError::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_template_message() {
        let err = ViewError::missing_template("/views/does/not/exist.hbs");

        let msg = err.to_string();
        assert!(msg.contains("does not exist"));
        assert!(msg.contains("/views/does/not/exist.hbs"));
        assert!(err.is_missing_template());
        assert_eq!(
            err.attempted_path(),
            Some(&PathBuf::from("/views/does/not/exist.hbs"))
        );
    }

    #[test]
    fn test_bad_options_message() {
        let err = ViewError::bad_options("The option `view-path` must be specified", "view-path");

        let msg = err.to_string();
        assert!(msg.contains("view-path"));
        assert!(!err.is_missing_template());
        assert!(err.attempted_path().is_none());
    }

    #[test]
    fn test_io_error_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ViewError::io("/layouts/main.hbs", source);

        let msg = err.to_string();
        assert!(msg.contains("/layouts/main.hbs"));
        assert!(msg.contains("gone"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
