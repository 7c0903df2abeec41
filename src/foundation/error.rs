/// Result alias used throughout the crate.
pub type AnnotateResult<T> = Result<T, AnnotateError>;

/// Top-level error type.
///
/// Every variant except a failure to create the output directory is isolated to a single video by
/// the batch driver: the video is skipped with a diagnostic and the batch continues.
#[derive(thiserror::Error, Debug)]
pub enum AnnotateError {
    /// A metadata row could not be turned into an [`crate::AnnotationRecord`].
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// No metadata row exists for the given video key.
    #[error("not found: no metadata for video '{0}'")]
    NotFound(String),

    /// A video could not be probed, decoded, or encoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// Invalid input values (options, dimensions, frame rates).
    #[error("validation error: {0}")]
    Validation(String),

    /// Work stopped at a frame boundary because cancellation was requested.
    #[error("cancelled")]
    Cancelled,

    /// Catch-all error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnnotateError {
    /// Build an [`AnnotateError::Codec`] value.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Build an [`AnnotateError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`AnnotateError::NotFound`] value.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }
}

/// Failure to decode one metadata row.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The row ends before a required field.
    #[error("missing field '{field}' (index {index})")]
    MissingField {
        /// Field name.
        field: &'static str,
        /// Zero-based field index in the row.
        index: usize,
    },

    /// A field is present but its literal does not decode to the expected shape.
    #[error("malformed field '{field}': {reason}")]
    MalformedField {
        /// Field name.
        field: &'static str,
        /// Human-readable cause.
        reason: String,
    },

    /// The trigger list does not hold exactly nine frame indices.
    #[error("expected 9 trigger frame indices, found {found}")]
    TriggerCountMismatch {
        /// Decoded list length.
        found: usize,
    },
}

impl ParseError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
