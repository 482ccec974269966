//! Error taxonomy for the tracking core.
//!
//! Only genuinely fatal conditions are errors. An empty trajectory set is a
//! valid result, and a base point with no time-aligned partner in the
//! distance extraction is silently dropped rather than reported.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KymoError {
    /// Channel dimensions disagree, or a mask references rows/columns
    /// outside the image. Fatal for the current file; batch processing
    /// logs and skips.
    #[error("input shape mismatch: {0}")]
    InputShape(String),

    /// A parameter override failed to parse or referenced an unknown
    /// field. The previous value is retained.
    #[error("invalid parameter edit: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, KymoError>;
