#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// boundary conditions and border extension.
pub mod boundary;

/// error types for the filtering operations.
pub mod error;

/// image filtering module.
pub mod filter;

/// n-dimensional discrete Fourier transform.
pub mod fourier;

/// module containing parallelization utilities.
pub mod parallel;

mod lines;

pub use crate::boundary::BoundaryCondition;
pub use crate::error::FilterError;
pub use crate::filter::{
    convolve, convolve_with_config, ConvolutionConfig, ConvolutionStrategy, KernelSpec,
    OneDimensionalFilter, Symmetry,
};
pub use crate::fourier::{fourier_transform, FourierNormalization, FourierOptions};
pub use crate::parallel::ExecutionStrategy;
