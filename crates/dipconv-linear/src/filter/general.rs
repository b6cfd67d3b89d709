use dipconv_image::{
    image::{increment_coords, strides},
    Complex64, Image, Sample,
};

use super::one_dimensional::{output_data_type, validate_dense_kernel};
use crate::{
    boundary::{broadcast_boundary, extend_samples, BoundaryCondition, BoundaryFill},
    error::FilterError,
    parallel::{for_each_chunk_mut, ExecutionStrategy},
};

fn brute_force<T: Sample>(
    src: &Image,
    kernel: &Image,
    kernel_sizes: &[usize],
    boundary: &[BoundaryCondition],
    strategy: ExecutionStrategy,
) -> Result<Vec<T>, FilterError> {
    let sizes = src.sizes();
    let ndims = sizes.len();
    let tensor_elements = src.tensor_elements();

    let high: Vec<usize> = kernel_sizes.iter().map(|&k| k / 2).collect();
    let low: Vec<usize> = kernel_sizes
        .iter()
        .zip(&high)
        .map(|(&k, &o)| k - 1 - o)
        .collect();
    let samples = src.samples::<T>()?;
    let (ext, ext_sizes) = extend_samples(
        &samples,
        sizes,
        tensor_elements,
        &low,
        &high,
        boundary,
        BoundaryFill::for_data_type(src.data_type().suggest_flex()),
        strategy,
    );
    let ext_strides = strides(&ext_sizes, tensor_elements);

    // offset table of the non-zero weights
    let weights = kernel.samples::<T>()?;
    let mut taps = Vec::new();
    let mut coords = vec![0; ndims];
    for &w in weights.iter() {
        if w != T::zero() {
            let offset = coords
                .iter()
                .zip(kernel_sizes)
                .zip(&ext_strides)
                .map(|((&k, &n), &s)| (n - 1 - k) * s)
                .sum::<usize>();
            taps.push((offset, w));
        }
        increment_coords(&mut coords, kernel_sizes);
    }
    log::trace!(
        "general convolution: {} of {} weights used",
        taps.len(),
        weights.len()
    );

    let last = ndims - 1;
    let row_len = sizes[last] * tensor_elements;
    let mut out = vec![T::zero(); src.num_samples()];
    for_each_chunk_mut(strategy, &mut out, row_len, |row, dst| {
        let mut rem = row;
        let mut base = 0;
        for d in (0..last).rev() {
            base += (rem % sizes[d]) * ext_strides[d];
            rem /= sizes[d];
        }
        for (j, pixel) in dst.chunks_mut(tensor_elements).enumerate() {
            let start = base + j * ext_strides[last];
            for (t, o) in pixel.iter_mut().enumerate() {
                let b = start + t;
                *o = taps
                    .iter()
                    .fold(T::zero(), |acc, &(off, w)| acc + w * ext[b + off]);
            }
        }
    });

    Ok(out)
}

/// Convolve an image with a dense kernel by direct summation.
///
/// Computes `out[p] = sum_k kernel[k] * src[p + origin - k]` with the origin at `size / 2`
/// along each kernel axis. Samples outside of the image come from the boundary condition.
/// The cost grows with the number of non-zero kernel weights, so this is meant for small
/// kernels.
///
/// A kernel with fewer dimensions than the image is extended with singleton axes.
///
/// # Errors
///
/// The kernel must be scalar with finite weights and at most as many dimensions as the image.
///
/// # Examples
///
/// ```
/// use dipconv_image::Image;
/// use dipconv_linear::{filter::general_convolution, BoundaryCondition, ExecutionStrategy};
///
/// let image = Image::new(vec![3, 3], vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
/// let kernel = Image::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let out = general_convolution(
///     &image,
///     &kernel,
///     &[BoundaryCondition::AddZeros],
///     ExecutionStrategy::Serial,
/// )
/// .unwrap();
/// assert_eq!(
///     out.as_real_slice(),
///     Some(&[1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0][..])
/// );
/// ```
pub fn general_convolution(
    src: &Image,
    kernel: &Image,
    boundary: &[BoundaryCondition],
    strategy: ExecutionStrategy,
) -> Result<Image, FilterError> {
    let ndims = src.dimensionality();
    let kernel_sizes = validate_dense_kernel(kernel, ndims)?;
    let boundary = broadcast_boundary(boundary, ndims)?;

    let complex = src.is_complex() || kernel.is_complex();
    let data = if complex {
        let out = strategy.run(|| {
            brute_force::<Complex64>(src, kernel, &kernel_sizes, &boundary, strategy)
        })??;
        Complex64::into_data(out)
    } else {
        let out = strategy
            .run(|| brute_force::<f64>(src, kernel, &kernel_sizes, &boundary, strategy))??;
        f64::into_data(out)
    };

    Ok(src.with_samples(data, output_data_type(src.data_type(), complex))?)
}
