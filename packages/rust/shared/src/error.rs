//! Error types for Newsdesk.
//!
//! Library crates use [`NewsdeskError`] via `thiserror`.
//! App crates (cli/runtime) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Message shown to callers in place of any internal failure detail.
pub const OPAQUE_FAILURE: &str = "internal server error";

/// Top-level error type for all Newsdesk operations.
#[derive(Debug, thiserror::Error)]
pub enum NewsdeskError {
    /// Extractor stage failed or produced unparseable output.
    #[error("extraction failure: {0}")]
    Extraction(String),

    /// Research query builder failed or received malformed input.
    #[error("query build failure: {0}")]
    QueryBuild(String),

    /// Knowledge retrieval failed or returned nothing.
    #[error("retrieval failure: {0}")]
    Retrieval(String),

    /// Article writer failed or produced a structurally invalid draft.
    #[error("generation failure: {0}")]
    Generation(String),

    /// Article reviewer failed.
    #[error("review failure: {0}")]
    Review(String),

    /// A required field was missing from an inbound payload.
    #[error("missing required field: {field}")]
    MalformedRequest { field: String },

    /// A tool name that is not part of the dispatch table.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure talking to a remote service.
    #[error("network error: {0}")]
    Network(String),

    /// A remote service answered with a non-success status.
    #[error("{service} returned HTTP {status}: {message}")]
    Service {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NewsdeskError>;

impl NewsdeskError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Report a missing payload field by its literal name.
    pub fn malformed(field: impl Into<String>) -> Self {
        Self::MalformedRequest {
            field: field.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the five pipeline stage failures.
    pub fn is_stage_failure(&self) -> bool {
        matches!(
            self,
            Self::Extraction(_)
                | Self::QueryBuild(_)
                | Self::Retrieval(_)
                | Self::Generation(_)
                | Self::Review(_)
        )
    }

    /// True for failures whose detail must not reach a caller.
    pub fn is_internal(&self) -> bool {
        !self.is_stage_failure()
            && !matches!(self, Self::MalformedRequest { .. } | Self::UnknownTool(_))
    }

    /// The message a caller is allowed to see.
    ///
    /// Stage failures, malformed requests and unknown tools are reported
    /// verbatim; everything else collapses to [`OPAQUE_FAILURE`].
    pub fn caller_message(&self) -> String {
        if self.is_internal() {
            OPAQUE_FAILURE.to_string()
        } else {
            self.to_string()
        }
    }
}
