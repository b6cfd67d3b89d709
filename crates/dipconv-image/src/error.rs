use crate::data_type::DataType;

/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when the data length does not match the image sizes.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidDataLength(usize, usize),

    /// Error when an image is created without dimensions.
    #[error("Image must have at least one dimension")]
    ZeroDimensionality,

    /// Error when one of the image sizes is zero.
    #[error("Image size along dimension {0} is zero")]
    ZeroSize(usize),

    /// Error when the number of tensor elements is zero.
    #[error("Image must have at least one tensor element")]
    ZeroTensorElements,

    /// Error when a coordinate array does not match the dimensionality.
    #[error("Coordinate has {0} entries but the image has {1} dimensions")]
    InvalidCoordinate(usize, usize),

    /// Error when a coordinate is outside the image.
    #[error("Index {0} out of bounds for dimension {1} of size {2}")]
    IndexOutOfBounds(usize, usize, usize),

    /// Error when a tensor element index is outside the pixel.
    #[error("Tensor element {0} out of bounds, the image has {1}")]
    TensorElementOutOfBounds(usize, usize),

    /// Error when the data type does not match the sample storage.
    #[error("Data type {0} does not match the sample storage")]
    DataTypeMismatch(DataType),

    /// Error when complex samples are requested as real values.
    #[error("Cannot read complex samples as real values")]
    ComplexToReal,

    /// Error when the pixel size does not match the dimensionality.
    #[error("Pixel size has {0} entries but the image has {1} dimensions")]
    PixelSizeMismatch(usize, usize),
}
