//! Bitrow - Error types
//!
//! Typed errors for the dataset library. The binary wraps these in `anyhow`
//! at the CLI boundary; bit-range violations inside the codec are assertions
//! rather than error values, since they can only come from a caller bug.

use thiserror::Error;

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, mutating, or loading datasets.
#[derive(Debug, Error)]
pub enum Error {
    /// Dataset dimensions that cannot describe a non-empty dataset.
    #[error(
        "invalid dataset dimensions: {n_observations} observations, \
         {n_attributes} attributes, {n_classes} classes"
    )]
    InvalidDimensions {
        n_observations: u32,
        n_attributes: u32,
        n_classes: u32,
    },

    /// An I/O operation failed in the storage layer.
    ///
    /// Propagated verbatim, no retry. A run aborted mid-generation leaves a
    /// partial file behind.
    #[error("storage failure: {context}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The container header is missing, truncated, or unparsable.
    #[error("malformed dataset header: {0}")]
    MalformedHeader(String),

    /// A row decodes to a class id outside the declared class count.
    ///
    /// Reachable only with externally supplied data: when `n_classes` is not
    /// a power of two, the class bit-field can hold values the metadata does
    /// not admit.
    #[error("row {row} has class {class_id} but dataset declares {n_classes} classes")]
    ClassOutOfRange {
        row: u32,
        class_id: u32,
        n_classes: u32,
    },
}

impl Error {
    /// Wrap an I/O error with a short description of the failed operation.
    pub fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }
}
