//! Unified error types for docforge.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown to callers for every failure whose detail stays server-side.
pub const GENERIC_FAILURE: &str = "Failed to process document";

/// All errors that can occur while generating a document.
#[derive(Error, Debug)]
pub enum DocforgeError {
    // --- Configuration ---

    /// The configuration file (`docforge.config.json`) was not found.
    #[error("config file not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but contains invalid JSON.
    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // --- Request ---

    /// No template is stored under the requested key.
    #[error("Template not found")]
    TemplateNotFound(String),

    /// The template key contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid template key: {0:?}")]
    InvalidTemplateKey(String),

    /// A template exists but no substitution variant is registered for it.
    #[error("no substitution variant registered for template '{0}'")]
    UnknownVariant(String),

    // --- Substitution passes (recovered locally) ---

    /// An expected landmark (section, table, drawing, date sentence) is absent.
    #[error("pattern not matched: {0}")]
    PatternNotMatched(String),

    /// A date value or row record failed validation.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A locator pattern in a variant descriptor does not compile.
    #[error("invalid pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Handlebars markup rendering failed (invalid snippet or missing variables).
    #[error("markup rendering failed: {0}")]
    TemplateRender(String),

    // --- Container / storage ---

    /// The template container could not be opened or re-serialised.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The container does not hold the expected markup part.
    #[error("archive part missing: {0}")]
    MissingPart(String),

    /// The template or output store failed.
    #[error("storage error: {0}")]
    Storage(String),

    // --- General ---

    /// A filesystem I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A catch-all for errors from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DocforgeError {
    /// Whether a substitution pass that raised this error may be skipped
    /// while the rest of the pipeline continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PatternNotMatched(_)
                | Self::MalformedInput(_)
                | Self::InvalidPattern { .. }
                | Self::TemplateRender(_)
        )
    }

    /// The message surfaced to the caller.
    ///
    /// Request errors are reported verbatim. Upstream failures collapse to
    /// [`GENERIC_FAILURE`]; their detail is only logged.
    pub fn user_message(&self) -> String {
        match self {
            Self::TemplateNotFound(_)
            | Self::InvalidTemplateKey(_)
            | Self::UnknownVariant(_) => self.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Alias for `Result<T, DocforgeError>`.
pub type Result<T> = std::result::Result<T, DocforgeError>;
