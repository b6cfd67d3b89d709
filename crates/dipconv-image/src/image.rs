use std::borrow::Cow;

use crate::{
    data_type::DataType,
    error::ImageError,
    sample::{ImageData, Sample},
    Complex64,
};

/// Physical spacing of the pixels along each dimension.
///
/// When there are fewer values than dimensions, the last value is repeated. An empty pixel
/// size means one unit per pixel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelSize {
    /// Spacing per dimension.
    pub values: Vec<f64>,
    /// Unit of the spacing values.
    pub unit: String,
}

impl Default for PixelSize {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            unit: "px".to_string(),
        }
    }
}

impl PixelSize {
    /// Create a pixel size from one value per dimension.
    pub fn new(values: Vec<f64>, unit: impl Into<String>) -> Self {
        Self {
            values,
            unit: unit.into(),
        }
    }

    /// Create the same spacing along every dimension.
    pub fn isotropic(value: f64, unit: impl Into<String>) -> Self {
        Self::new(vec![value], unit)
    }

    /// Spacing along dimension `dim`.
    pub fn get(&self, dim: usize) -> f64 {
        match self.values.last() {
            None => 1.0,
            Some(last) => self.values.get(dim).copied().unwrap_or(*last),
        }
    }

    /// Whether a physical spacing was set.
    pub fn is_defined(&self) -> bool {
        !self.values.is_empty()
    }
}

/// Represents an n-dimensional image.
///
/// The samples are stored in row-major order with the tensor elements of each pixel
/// interleaved last, i.e. the shape is `(s0, s1, ..., s(n-1), T)` where `T` is the number of
/// tensor elements. A scalar image has `T = 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    sizes: Vec<usize>,
    tensor_elements: usize,
    data: ImageData,
    data_type: DataType,
    pixel_size: PixelSize,
}

impl Image {
    /// Create a new scalar real image of type `DFloat`.
    ///
    /// # Arguments
    ///
    /// * `sizes` - The size of the image along each dimension.
    /// * `data` - The samples in row-major order.
    ///
    /// # Errors
    ///
    /// If the length of the data does not match the sizes, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use dipconv_image::Image;
    ///
    /// let image = Image::new(vec![2, 3], vec![0.0; 6]).unwrap();
    ///
    /// assert_eq!(image.sizes(), &[2, 3]);
    /// assert_eq!(image.num_pixels(), 6);
    /// ```
    pub fn new(sizes: Vec<usize>, data: Vec<f64>) -> Result<Self, ImageError> {
        Self::from_data(sizes, 1, ImageData::Real(data), DataType::DFloat)
    }

    /// Create a new scalar complex image of type `DComplex`.
    pub fn new_complex(sizes: Vec<usize>, data: Vec<Complex64>) -> Result<Self, ImageError> {
        Self::from_data(sizes, 1, ImageData::Complex(data), DataType::DComplex)
    }

    /// Create an image from sample data, tensor elements and a data type.
    ///
    /// # Errors
    ///
    /// Returns an error when the sizes are empty or contain a zero, when `tensor_elements` is
    /// zero, when the data length does not match, or when the data type does not match the
    /// storage (complex types need complex samples and the other way around).
    pub fn from_data(
        sizes: Vec<usize>,
        tensor_elements: usize,
        data: ImageData,
        data_type: DataType,
    ) -> Result<Self, ImageError> {
        if sizes.is_empty() {
            return Err(ImageError::ZeroDimensionality);
        }
        if let Some(dim) = sizes.iter().position(|&s| s == 0) {
            return Err(ImageError::ZeroSize(dim));
        }
        if tensor_elements == 0 {
            return Err(ImageError::ZeroTensorElements);
        }
        let expected = sizes.iter().product::<usize>() * tensor_elements;
        if data.len() != expected {
            return Err(ImageError::InvalidDataLength(data.len(), expected));
        }
        if data.is_complex() != data_type.is_complex() {
            return Err(ImageError::DataTypeMismatch(data_type));
        }

        Ok(Self {
            sizes,
            tensor_elements,
            data,
            data_type,
            pixel_size: PixelSize::default(),
        })
    }

    /// Create a scalar real image filled with `val`.
    pub fn from_size_val(sizes: Vec<usize>, val: f64) -> Result<Self, ImageError> {
        let len = sizes.iter().product();
        Self::new(sizes, vec![val; len])
    }

    /// Create a scalar real image from a function of the pixel coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use dipconv_image::Image;
    ///
    /// let ramp = Image::from_fn(vec![2, 2], |c| (c[0] * 2 + c[1]) as f64).unwrap();
    /// assert_eq!(ramp.as_real_slice(), Some(&[0.0, 1.0, 2.0, 3.0][..]));
    /// ```
    pub fn from_fn(sizes: Vec<usize>, f: impl Fn(&[usize]) -> f64) -> Result<Self, ImageError> {
        let len: usize = sizes.iter().product();
        let mut coords = vec![0; sizes.len()];
        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(f(&coords));
            increment_coords(&mut coords, &sizes);
        }
        Self::new(sizes, data)
    }

    /// Sizes of the image along each dimension.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Size of the image along dimension `dim`.
    pub fn size(&self, dim: usize) -> Option<usize> {
        self.sizes.get(dim).copied()
    }

    /// Number of spatial dimensions.
    pub fn dimensionality(&self) -> usize {
        self.sizes.len()
    }

    /// Number of pixels.
    pub fn num_pixels(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Number of tensor elements per pixel.
    pub fn tensor_elements(&self) -> usize {
        self.tensor_elements
    }

    /// Whether each pixel holds a single sample.
    pub fn is_scalar(&self) -> bool {
        self.tensor_elements == 1
    }

    /// Number of samples, i.e. pixels times tensor elements.
    pub fn num_samples(&self) -> usize {
        self.data.len()
    }

    /// Whether the samples are complex.
    pub fn is_complex(&self) -> bool {
        self.data.is_complex()
    }

    /// Data type of the pixels.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Physical pixel size.
    pub fn pixel_size(&self) -> &PixelSize {
        &self.pixel_size
    }

    /// The sample storage.
    pub fn data(&self) -> &ImageData {
        &self.data
    }

    /// Consume the image and return the sample storage.
    pub fn into_data(self) -> ImageData {
        self.data
    }

    /// The samples as a real slice, `None` for complex images.
    pub fn as_real_slice(&self) -> Option<&[f64]> {
        match &self.data {
            ImageData::Real(v) => Some(v),
            ImageData::Complex(_) => None,
        }
    }

    /// The samples as a complex slice, `None` for real images.
    pub fn as_complex_slice(&self) -> Option<&[Complex64]> {
        match &self.data {
            ImageData::Real(_) => None,
            ImageData::Complex(v) => Some(v),
        }
    }

    /// Borrow or convert the samples as `T`.
    ///
    /// # Errors
    ///
    /// Complex images cannot be read as `f64`.
    pub fn samples<T: Sample>(&self) -> Result<Cow<'_, [T]>, ImageError> {
        T::cast_slice(&self.data)
    }

    /// Strides in samples for each dimension, tensor elements included.
    pub fn strides(&self) -> Vec<usize> {
        strides(&self.sizes, self.tensor_elements)
    }

    /// Linear sample offset of a pixel coordinate and tensor element.
    pub fn offset(&self, coords: &[usize], tensor_element: usize) -> Result<usize, ImageError> {
        if coords.len() != self.sizes.len() {
            return Err(ImageError::InvalidCoordinate(coords.len(), self.sizes.len()));
        }
        if tensor_element >= self.tensor_elements {
            return Err(ImageError::TensorElementOutOfBounds(
                tensor_element,
                self.tensor_elements,
            ));
        }
        let mut offset = tensor_element;
        for (dim, ((&c, &size), stride)) in coords
            .iter()
            .zip(&self.sizes)
            .zip(self.strides())
            .enumerate()
        {
            if c >= size {
                return Err(ImageError::IndexOutOfBounds(c, dim, size));
            }
            offset += c * stride;
        }
        Ok(offset)
    }

    /// Read one sample as a complex value.
    pub fn get(&self, coords: &[usize], tensor_element: usize) -> Result<Complex64, ImageError> {
        let offset = self.offset(coords, tensor_element)?;
        self.data
            .get(offset)
            .ok_or(ImageError::InvalidDataLength(offset, self.data.len()))
    }

    /// Return a copy with a different data type.
    ///
    /// # Errors
    ///
    /// The data type must match the sample storage.
    pub fn with_data_type(mut self, data_type: DataType) -> Result<Self, ImageError> {
        if data_type.is_complex() != self.data.is_complex() {
            return Err(ImageError::DataTypeMismatch(data_type));
        }
        self.data_type = data_type;
        Ok(self)
    }

    /// Return a copy with a different pixel size.
    ///
    /// # Errors
    ///
    /// The pixel size may not have more entries than the image has dimensions.
    pub fn with_pixel_size(mut self, pixel_size: PixelSize) -> Result<Self, ImageError> {
        if pixel_size.values.len() > self.sizes.len() {
            return Err(ImageError::PixelSizeMismatch(
                pixel_size.values.len(),
                self.sizes.len(),
            ));
        }
        self.pixel_size = pixel_size;
        Ok(self)
    }

    /// Return an image with the same metadata and new samples.
    ///
    /// The data type becomes the complex or real counterpart of `data_type` to match the
    /// storage.
    pub fn with_samples(&self, data: ImageData, data_type: DataType) -> Result<Self, ImageError> {
        let data_type = if data.is_complex() {
            data_type.to_complex()
        } else {
            data_type.to_real()
        };
        let mut out = Self::from_data(self.sizes.clone(), self.tensor_elements, data, data_type)?;
        out.pixel_size = self.pixel_size.clone();
        Ok(out)
    }

    /// Append singleton dimensions until the image has `dimensionality` dimensions.
    ///
    /// Images that already have at least `dimensionality` dimensions are returned unchanged.
    pub fn expand_dimensionality(mut self, dimensionality: usize) -> Self {
        if self.sizes.len() < dimensionality {
            self.sizes.resize(dimensionality, 1);
        }
        self
    }
}

/// Row-major strides in samples of an image with the given sizes and tensor elements.
pub fn strides(sizes: &[usize], tensor_elements: usize) -> Vec<usize> {
    let mut strides = vec![0; sizes.len()];
    let mut stride = tensor_elements;
    for (s, &size) in strides.iter_mut().zip(sizes).rev() {
        *s = stride;
        stride *= size;
    }
    strides
}

/// Advance a row-major coordinate by one position.
///
/// The last dimension varies fastest. Wraps to all zeros after the last position.
pub fn increment_coords(coords: &mut [usize], sizes: &[usize]) {
    for (c, &size) in coords.iter_mut().zip(sizes).rev() {
        *c += 1;
        if *c < size {
            return;
        }
        *c = 0;
    }
}
