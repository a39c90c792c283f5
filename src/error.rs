//! Error taxonomy shared by every stage of the conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting a BibTeX entry to CFF.
///
/// Every variant is fatal to the current conversion. Nothing is retried and no
/// partial record is produced.
#[derive(Error, Debug)]
pub enum CffError {
    /// The source does not hold exactly one entry, or a field has an
    /// unusable shape (author without a single comma, unparsable date, ...).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Export was attempted before both bibliographic and repository data
    /// were supplied.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The BibTeX entry type has no CFF counterpart.
    #[error("Unsupported entry type: '{0}'")]
    UnsupportedType(String),

    /// A feature that is explicitly not implemented was requested.
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CffError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CffError::Io {
            path: path.into(),
            source,
        }
    }
}
