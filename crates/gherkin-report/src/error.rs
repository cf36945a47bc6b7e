//! Error types for the correlation engine.
//!
//! Only contract violations and report persistence failures are surfaced to
//! callers. Source parse failures and attachment write failures are logged
//! and absorbed where they occur, so that a single bad file or a full disk
//! degrades the report rather than aborting the run.

use camino::Utf8PathBuf;
use gherkin_report_tree::TreeError;
use thiserror::Error;

/// Errors surfaced by [`Reporter::dispatch`](crate::Reporter::dispatch) and
/// configuration loading.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// A table argument violated the rectangular-grid contract.
    #[error(transparent)]
    Table(#[from] TableError),

    /// An embedded attachment could not be written.
    #[error("failed to write attachment {path}: {source}")]
    Attachment {
        /// Destination of the attachment.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The report backend failed to persist the report.
    #[error("failed to flush report: {0}")]
    Flush(#[from] TreeError),

    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised when table rows do not form a rectangular grid.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableError {
    /// A row contains more or fewer cells than the first row.
    #[error("table row {row_number} has {actual} cells but expected {expected}")]
    UnevenRow {
        /// 1-based index of the offending row, including the header.
        row_number: usize,
        /// Number of cells in the first row.
        expected: usize,
        /// Number of cells present in the offending row.
        actual: usize,
    },
}

/// Raised when a feature source cannot be indexed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The Gherkin parser rejected the source.
    #[error("failed to parse feature source {uri}: {source}")]
    Parse {
        /// URI of the rejected source.
        uri: String,
        /// Parser failure.
        #[source]
        source: gherkin::ParseError,
    },
}
