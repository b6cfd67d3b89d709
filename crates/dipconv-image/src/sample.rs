use std::borrow::Cow;
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

use num_traits::Zero;

use crate::{error::ImageError, Complex64};

/// Owned sample storage of an image.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageData {
    /// Real valued samples.
    Real(Vec<f64>),
    /// Complex valued samples.
    Complex(Vec<Complex64>),
}

impl ImageData {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            ImageData::Real(v) => v.len(),
            ImageData::Complex(v) => v.len(),
        }
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer holds complex samples.
    pub fn is_complex(&self) -> bool {
        matches!(self, ImageData::Complex(_))
    }

    /// Whether every sample is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            ImageData::Real(v) => v.iter().all(|x| x.is_finite()),
            ImageData::Complex(v) => v.iter().all(|x| x.is_finite()),
        }
    }

    /// Read sample `index` as a complex value.
    pub fn get(&self, index: usize) -> Option<Complex64> {
        match self {
            ImageData::Real(v) => v.get(index).map(|&x| Complex64::new(x, 0.0)),
            ImageData::Complex(v) => v.get(index).copied(),
        }
    }
}

/// Trait for the two sample types a filter computes in, `f64` and `Complex<f64>`.
///
/// Filters are written once against this trait; the caller picks the complex instantiation
/// whenever the image or any filter weight is complex.
pub trait Sample:
    Copy
    + Debug
    + Send
    + Sync
    + Zero
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Mul<f64, Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Whether the sample type is complex.
    const IS_COMPLEX: bool;

    /// Convert a real value to the sample type.
    fn from_f64(val: f64) -> Self;

    /// Convert a complex value to the sample type, dropping the imaginary part for reals.
    fn from_complex(val: Complex64) -> Self;

    /// Widen the sample to a complex value.
    fn to_complex(self) -> Complex64;

    /// Borrow or convert the samples of `data` as this type.
    fn cast_slice(data: &ImageData) -> Result<Cow<'_, [Self]>, ImageError>;

    /// Wrap a buffer of this type into image data.
    fn into_data(samples: Vec<Self>) -> ImageData;
}

impl Sample for f64 {
    const IS_COMPLEX: bool = false;

    #[inline]
    fn from_f64(val: f64) -> Self {
        val
    }

    #[inline]
    fn from_complex(val: Complex64) -> Self {
        val.re
    }

    #[inline]
    fn to_complex(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }

    fn cast_slice(data: &ImageData) -> Result<Cow<'_, [Self]>, ImageError> {
        match data {
            ImageData::Real(v) => Ok(Cow::Borrowed(v.as_slice())),
            ImageData::Complex(_) => Err(ImageError::ComplexToReal),
        }
    }

    fn into_data(samples: Vec<Self>) -> ImageData {
        ImageData::Real(samples)
    }
}

impl Sample for Complex64 {
    const IS_COMPLEX: bool = true;

    #[inline]
    fn from_f64(val: f64) -> Self {
        Complex64::new(val, 0.0)
    }

    #[inline]
    fn from_complex(val: Complex64) -> Self {
        val
    }

    #[inline]
    fn to_complex(self) -> Complex64 {
        self
    }

    fn cast_slice(data: &ImageData) -> Result<Cow<'_, [Self]>, ImageError> {
        match data {
            ImageData::Real(v) => Ok(Cow::Owned(
                v.iter().map(|&x| Complex64::new(x, 0.0)).collect(),
            )),
            ImageData::Complex(v) => Ok(Cow::Borrowed(v.as_slice())),
        }
    }

    fn into_data(samples: Vec<Self>) -> ImageData {
        ImageData::Complex(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_real_to_complex() -> Result<(), ImageError> {
        let data = ImageData::Real(vec![1.0, -2.0]);
        let samples = Complex64::cast_slice(&data)?;
        assert_eq!(
            samples.as_ref(),
            &[Complex64::new(1.0, 0.0), Complex64::new(-2.0, 0.0)]
        );
        Ok(())
    }

    #[test]
    fn test_cast_complex_to_real_fails() {
        let data = ImageData::Complex(vec![Complex64::new(1.0, 1.0)]);
        assert_eq!(f64::cast_slice(&data).err(), Some(ImageError::ComplexToReal));
    }

    #[test]
    fn test_image_data_finite() {
        assert!(ImageData::Real(vec![0.0, 1.0]).is_finite());
        assert!(!ImageData::Real(vec![f64::NAN]).is_finite());
        assert!(!ImageData::Complex(vec![Complex64::new(0.0, f64::INFINITY)]).is_finite());
    }
}
