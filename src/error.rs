//! Error types for document operations
//!
//! `AccessError` is what the document accessor reports; each core operation
//! maps it onto a `DocumentError` carrying the symbolic and resolved paths.

/// Failure of a single accessor call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Bytes are not JSON (comments and trailing commas allowed)
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Path is well formed but nothing lives there
    #[error("path not found")]
    NotFound,

    /// Path string itself is unusable
    #[error("bad path: {0}")]
    BadPath(String),
}

/// Errors reported by resolve/read/write/list operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Document does not parse, or its top-level value is not an object
    /// where one is required
    #[error("document is not a valid JSON object")]
    InvalidDocument,

    /// Resolved path does not exist in the document
    #[error("path '{symbolic}' (resolved to '{resolved}') does not exist")]
    PathNotFound { symbolic: String, resolved: String },

    /// Accessor rejected the path syntax
    #[error("malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// Accessor could not apply the write
    #[error("failed to write at '{path}': {reason}")]
    WriteFailure { path: String, reason: String },
}

impl DocumentError {
    /// Map an accessor failure for `symbolic` (resolved to `resolved`) onto a
    /// write-side error
    pub(crate) fn from_write(err: AccessError, symbolic: &str, resolved: &str) -> Self {
        match err {
            AccessError::NotFound => DocumentError::PathNotFound {
                symbolic: symbolic.to_string(),
                resolved: resolved.to_string(),
            },
            AccessError::BadPath(reason) => DocumentError::MalformedPath {
                path: resolved.to_string(),
                reason,
            },
            err @ AccessError::Syntax(_) => DocumentError::WriteFailure {
                path: resolved.to_string(),
                reason: err.to_string(),
            },
        }
    }

    /// Same mapping for lookups, where an unparsable document is reported as
    /// such instead of as a missing value
    pub(crate) fn from_read(err: AccessError, symbolic: &str, resolved: &str) -> Self {
        match err {
            AccessError::Syntax(_) => DocumentError::InvalidDocument,
            AccessError::BadPath(reason) => DocumentError::MalformedPath {
                path: resolved.to_string(),
                reason,
            },
            AccessError::NotFound => DocumentError::PathNotFound {
                symbolic: symbolic.to_string(),
                resolved: resolved.to_string(),
            },
        }
    }
}
