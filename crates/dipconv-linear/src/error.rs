use dipconv_image::ImageError;

use crate::parallel::ParallelError;

/// An error type for the filtering operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// The kernel specification is malformed.
    #[error("Invalid kernel: {0}")]
    InvalidKernel(String),

    /// A per-axis list has neither one entry nor one entry per image dimension.
    #[error("Dimensionality mismatch: expected 1 or {expected} entries, got {actual}")]
    DimensionalityMismatch {
        /// Dimensionality of the image.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },

    /// The boundary condition is not recognized or not supported by the operation.
    #[error("Boundary condition not supported: {0}")]
    UnsupportedBoundaryCondition(String),

    /// The Fourier transform could not be computed.
    #[error("Fourier transform failed: {0}")]
    NativeTransformFailure(String),

    /// Error from the image layer.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error from the parallel execution layer.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

impl FilterError {
    /// Creates an `InvalidKernel` error.
    pub fn invalid_kernel(reason: impl Into<String>) -> Self {
        Self::InvalidKernel(reason.into())
    }

    /// Creates a `DimensionalityMismatch` error.
    pub fn dimensionality_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionalityMismatch { expected, actual }
    }
}
