use thiserror::Error;

/// Error type for the enhancement and refinement operations
///
/// Every variant is a precondition failure detected before any pixel is
/// processed. None of them is retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An image has zero width or height
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Two paired images do not share the same size
    ///
    /// Returned when an alpha mask and its RGB image, or the planes of a
    /// luminance/chrominance split, disagree on their dimensions.
    #[error("Image dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// A numeric parameter is outside its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Error type for the end-to-end background removal pipeline
///
/// This wraps processing failures of the core stages together with
/// failures reported by the external matting backend.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One of the enhancement or refinement stages rejected its input
    #[error(transparent)]
    Processing(#[from] Error),

    /// The matting backend failed to produce a matte
    #[error("Matting backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}
