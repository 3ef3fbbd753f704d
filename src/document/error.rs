//! Error types for document reading and writing.

use thiserror::Error;

/// Errors that can occur while reading or writing a model document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// XML parsing or serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Well-formed XML that is not a usable model document.
    #[error("Invalid document: {0}")]
    Invalid(String),
}

impl DocumentError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create an invalid-document error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
