//! Error types for the intake-core library.

use thiserror::Error;

/// Main error type for the intake library.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Record extraction/classification error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Configuration error (bad synonym table artifact, etc.).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to record extraction and classification.
///
/// A synonym that matches nothing is *not* an error: the matcher returns
/// `None` and the extractor drops the pair. These variants only cover
/// malformed record input at the classification boundary.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Classifier input is not a field-identifier-keyed mapping of strings.
    #[error("record input is not a field map: {0}")]
    InvalidRecord(String),

    /// A record key is outside the closed canonical field set.
    #[error("unknown canonical field: {0}")]
    UnknownField(String),
}

/// Result type for the intake library.
pub type Result<T> = std::result::Result<T, IntakeError>;
