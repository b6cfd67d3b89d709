//! Filter operations
//!
//! This module provides linear convolution of n-dimensional images with separable, dense and
//! frequency-domain executors.

/// Filter kernels
pub mod kernels;

/// Frequency-domain convolution
mod convolve_ft;
pub use convolve_ft::*;

/// Brute-force spatial convolution
mod general;
pub use general::*;

/// One-dimensional filter descriptors
mod one_dimensional;
pub use one_dimensional::{FilterWeights, KernelSpec, OneDimensionalFilter, Symmetry};
pub(crate) use one_dimensional::{output_data_type, validate_dense_kernel};

/// Convolution entry points and strategy selection
mod ops;
pub use ops::*;

/// Separability test
mod separate;
pub use separate::*;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;
