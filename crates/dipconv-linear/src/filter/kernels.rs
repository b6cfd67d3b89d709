use dipconv_image::{image::increment_coords, Image};

use super::one_dimensional::{OneDimensionalFilter, Symmetry};
use crate::error::FilterError;

/// Create a box blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn box_kernel_1d(kernel_size: usize) -> Vec<f64> {
    vec![1.0 / kernel_size as f64; kernel_size]
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f64> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = kernel_size.saturating_sub(1) as f64 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f64 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f64>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Create an even-symmetric gaussian filter truncated at `truncation * sigma`.
///
/// The filter stores only its left half and is normalized to unit sum. A `sigma` that is not
/// positive gives the identity filter.
pub fn gaussian_filter_1d(sigma: f64, truncation: f64) -> OneDimensionalFilter {
    if sigma.is_nan() || sigma <= 0.0 {
        return OneDimensionalFilter::identity();
    }
    let half = (truncation * sigma).ceil().max(0.0) as usize;
    let full = gaussian_kernel_1d(2 * half + 1, sigma);
    OneDimensionalFilter::new(full[..=half].to_vec()).with_symmetry(Symmetry::Even)
}

/// Create the central difference filter `[0.5, 0, -0.5]`.
///
/// Applied along an axis it computes `(x[i+1] - x[i-1]) / 2`.
pub fn derivative_kernel_1d() -> OneDimensionalFilter {
    OneDimensionalFilter::new(vec![0.5, 0.0]).with_symmetry(Symmetry::Odd)
}

/// Build a dense kernel as the outer product of one vector per axis.
///
/// # Errors
///
/// At least one non-empty vector is needed.
///
/// # Examples
///
/// ```
/// use dipconv_linear::filter::kernels::outer_product;
///
/// let kernel = outer_product(&[&[1.0, 2.0], &[1.0, 0.0, -1.0]]).unwrap();
/// assert_eq!(kernel.sizes(), &[2, 3]);
/// assert_eq!(kernel.as_real_slice(), Some(&[1.0, 0.0, -1.0, 2.0, 0.0, -2.0][..]));
/// ```
pub fn outer_product(vectors: &[&[f64]]) -> Result<Image, FilterError> {
    let sizes: Vec<usize> = vectors.iter().map(|v| v.len()).collect();
    let len: usize = sizes.iter().product();
    let mut coords = vec![0; sizes.len()];
    let mut data = Vec::with_capacity(len);
    for _ in 0..len {
        data.push(
            coords
                .iter()
                .zip(vectors)
                .map(|(&c, v)| v[c])
                .product::<f64>(),
        );
        increment_coords(&mut coords, &sizes);
    }
    Ok(Image::new(sizes, data)?)
}
