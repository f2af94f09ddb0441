use thiserror::Error;

/// Precondition failures raised before any pixel is written.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DitherError {
    /// Unknown algorithm name or an ordered matrix order that is not a power of two.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(
        "buffer size mismatch: {width}x{height} RGBA needs {expected} samples, got {actual}"
    )]
    BufferSizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid factor {0}: must be a positive integer")]
    InvalidFactor(i64),

    /// The engine reads R as the representative channel, so R, G and B must agree.
    #[error("non-achromatic input at pixel ({x}, {y}): R, G and B must be equal")]
    NonAchromaticInput { x: usize, y: usize },
}

pub type Result<T> = std::result::Result<T, DitherError>;
