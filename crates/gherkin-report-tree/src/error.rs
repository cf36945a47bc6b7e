//! Errors raised while persisting a report tree.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when a report is flushed to its outputs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TreeError {
    /// Writing a report file failed.
    #[error("failed to write report to {path}: {source}")]
    Write {
        /// Destination that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Serialising the JSON report failed.
    #[error("failed to serialise JSON report: {0}")]
    Json(#[from] serde_json::Error),
    /// Rendering the JUnit report failed.
    #[error("failed to render JUnit report")]
    Junit(#[from] std::fmt::Error),
}
