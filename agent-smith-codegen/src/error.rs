//! Error types for code generation

use agent_smith_core::validation::ValidationReport;
use std::path::PathBuf;
use thiserror::Error;

/// Code generation error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration is not valid: {report}")]
    Validation { report: ValidationReport },

    #[error("Failed to write {}: {source}", .path.display())]
    Generation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template rendering error: {0}")]
    TemplateRendering(String),

    #[error("Storage error: {0}")]
    Storage(#[from] agent_smith_storage::Error),

    #[error("Core domain error: {0}")]
    Core(#[from] agent_smith_core::Error),
}

impl Error {
    pub fn generation<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Generation {
            path: path.into(),
            source,
        }
    }

    /// The validation report, if generation was refused because of findings
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Error::Validation { report } => Some(report),
            _ => None,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation",
            Error::Generation { .. } => "generation",
            Error::TemplateRendering(_) => "template_rendering",
            Error::Storage(err) => err.category(),
            Error::Core(err) => err.category(),
        }
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Error::TemplateRendering(err.to_string())
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Error::TemplateRendering(err.to_string())
    }
}

/// Convenience result type for generation operations
pub type Result<T> = std::result::Result<T, Error>;
