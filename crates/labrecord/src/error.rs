//! Error types for labrecord.
//!
//! This module defines all error types used throughout the labrecord crate.
//! Only [`Error::NoContent`] is a user-facing validation failure; everything
//! else indicates an environment or backend problem.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown when a render is attempted on an empty form.
pub const NO_CONTENT_MESSAGE: &str =
    "There is no content to include in the PDF. Please add some details or at least one experiment.";

/// The main error type for labrecord operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// The form has nothing to render.
    #[error("{NO_CONTENT_MESSAGE}")]
    NoContent,

    /// An experiment block reference did not resolve.
    #[error("no experiment block #{number}")]
    UnknownBlock {
        /// The 1-based block number that was requested.
        number: usize,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Form Errors ===
    /// A form file could not be read or parsed.
    #[error("failed to load form {path}: {message}")]
    FormLoad {
        /// Path to the form file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Render Errors ===
    /// The PDF backend failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// The DOCX package could not be written.
    #[error("DOCX generation failed: {0}")]
    Docx(#[from] zip::result::ZipError),

    // === Preview Errors ===
    /// The preview surface could not be updated.
    #[error("preview error: {0}")]
    Preview(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for labrecord operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new PDF backend error.
    #[must_use]
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf(message.into())
    }

    /// Create a new preview error.
    #[must_use]
    pub fn preview(message: impl Into<String>) -> Self {
        Self::Preview(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a form load error.
    #[must_use]
    pub fn form_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FormLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error is the empty-form validation failure.
    #[must_use]
    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }
}
