//! Error types for the PDF manager.
//!
//! Every fluent operation reports failures synchronously through
//! [`ManagerError`]. The variants follow the points where an operation can
//! fail: loading inputs, resolving a selection, compiling a scan pattern,
//! the serialized round trip used for redaction, and the final write.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Error type for all document collection operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// A PDF or image could not be read or parsed.
    #[error("Failed to load '{}': {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// A selection named a document that is not in the collection.
    #[error("Selection index {index} is out of range for a collection of {len} document(s)")]
    Selection { index: usize, len: usize },

    /// An operation that needs at least one target received none.
    #[error("Operation '{operation}' requires at least one selected document")]
    EmptySelection { operation: String },

    /// The scan pattern did not compile.
    #[error("Pattern error for '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// Writing or re-reading a serialized document failed.
    #[error("Serialization failed during {stage}: {reason}")]
    Serialization { stage: String, reason: String },

    /// The final write of an output file failed.
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid parameter passed to an operation.
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// The PDF engine (MuPDF, printpdf, image codecs) reported a failure.
    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },
}

impl ManagerError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn serialization(stage: &str, reason: impl ToString) -> Self {
        Self::Serialization {
            stage: stage.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_input(parameter: &str, reason: impl ToString) -> Self {
        Self::InvalidInput {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn backend(backend: &str, message: impl ToString) -> Self {
        Self::Backend {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<regex::Error> for ManagerError {
    fn from(err: regex::Error) -> Self {
        Self::Pattern {
            pattern: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}
