//! Error types and result utilities for digitization operations.

use thiserror::Error;

/// Convenience type alias for results that may contain a [`DigitizerError`].
pub type DigitizerResult<T> = Result<T, DigitizerError>;

/// Error types that can occur while sampling, quantizing or reducing data.
///
/// Every operation in this crate is deterministic, so none of these errors are
/// transient. They signal a caller supplying a value outside the documented range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DigitizerError {
    /// A single parameter is outside its valid domain.
    ///
    /// This includes cases like a zero sampling rate, a zero level count or a
    /// resolution percentage above 100.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A `[min, max]` pair does not describe a usable range.
    ///
    /// This typically happens when min > max, or min == max while more than one
    /// quantization level is requested.
    #[error("Invalid range error: {0}")]
    InvalidRange(String),

    /// Array dimensions don't match expected values.
    #[error("Dimension mismatch error: {0}")]
    DimensionMismatch(String),

    /// A numeric value could not be represented in the target type.
    #[error("Conversion error: failed to convert {value} to {target}: {reason}")]
    Conversion {
        /// The value as it was before the conversion.
        value: String,
        /// Name of the target type.
        target: &'static str,
        /// Why the conversion failed.
        reason: String,
    },
}

impl DigitizerError {
    /// Builds an [`DigitizerError::InvalidParameter`] from anything string-like.
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        DigitizerError::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}
