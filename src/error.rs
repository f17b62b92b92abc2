//! Error types for the decision engine boundary

use thiserror::Error;

/// Result type for fallible operations around the core
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside the pure normalize/decide path.
///
/// Malformed extraction data is never an error: the normalizer absorbs it.
#[derive(Error, Debug)]
pub enum Error {
    /// The extraction source failed or returned something that is not JSON
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Policy file could not be parsed
    #[error("Policy parse error: {0}")]
    PolicyParse(#[from] toml::de::Error),

    /// Policy could not be rendered as TOML
    #[error("Policy encode error: {0}")]
    PolicyEncode(#[from] toml::ser::Error),

    /// Policy parsed but violates its own constraints
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
