#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// pixel data types and the flex promotion rules.
pub mod data_type;

/// Error types for the image module.
pub mod error;

/// n-dimensional image representation.
pub mod image;

/// sample buffers and the generic sample trait.
pub mod sample;

pub use crate::data_type::DataType;
pub use crate::error::ImageError;
pub use crate::image::{Image, PixelSize};
pub use crate::sample::{ImageData, Sample};

/// Complex sample type used throughout the workspace.
pub type Complex64 = num_complex::Complex<f64>;
