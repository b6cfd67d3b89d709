use dipconv_image::{
    image::{increment_coords, strides},
    Complex64, Image, ImageData,
};

use super::{
    general::general_convolution,
    one_dimensional::{output_data_type, validate_dense_kernel},
};
use crate::{
    boundary::{broadcast_boundary, extend_samples, BoundaryCondition, BoundaryFill},
    error::FilterError,
    fourier::{fft_nd, next_fast_length, try_zeroed, FourierOptions},
    lines::offset_of,
    parallel::ExecutionStrategy,
};

/// Whether the border is filled with the extreme values of the computation type.
///
/// Such a border holds samples near the overflow limit, and any transform over it spreads
/// rounding errors of that size over the whole image.
fn has_extreme_fill(boundary: &[BoundaryCondition]) -> bool {
    boundary.iter().any(|bc| {
        matches!(bc, BoundaryCondition::AddMaxValue | BoundaryCondition::AddMinValue)
    })
}

fn frequency_domain(
    src: &Image,
    kernel: &Image,
    kernel_sizes: &[usize],
    boundary: &[BoundaryCondition],
    options: &FourierOptions,
    strategy: ExecutionStrategy,
) -> Result<Vec<Complex64>, FilterError> {
    let sizes = src.sizes();
    let ndims = sizes.len();
    let tensor_elements = src.tensor_elements();

    // extend by the kernel support
    let high: Vec<usize> = kernel_sizes.iter().map(|&k| k / 2).collect();
    let low: Vec<usize> = kernel_sizes
        .iter()
        .zip(&high)
        .map(|(&k, &o)| k - 1 - o)
        .collect();
    let fill = BoundaryFill::for_data_type(src.data_type().suggest_flex());
    let samples = src.samples::<Complex64>()?;
    let (mut ext, mut ext_sizes) = extend_samples(
        &samples,
        sizes,
        tensor_elements,
        &low,
        &high,
        boundary,
        fill,
        strategy,
    );

    // the valid part never reads the padding, so zeros are enough
    if options.fast_sizes {
        let extra: Vec<usize> = ext_sizes
            .iter()
            .map(|&n| next_fast_length(n) - n)
            .collect();
        if extra.iter().any(|&e| e > 0) {
            (ext, ext_sizes) = extend_samples(
                &ext,
                &ext_sizes,
                tensor_elements,
                &vec![0; ndims],
                &extra,
                &vec![BoundaryCondition::AddZeros; ndims],
                fill,
                strategy,
            );
        }
    }
    let total: usize = ext_sizes.iter().product();
    let ext_strides = strides(&ext_sizes, 1);
    log::trace!("frequency-domain convolution: transform sizes {ext_sizes:?}");

    let forward = options.normalization.scale(false, total);
    let inverse = options.normalization.scale(true, total);
    // undo the normalization of the transform pair
    let compensation = 1.0 / (forward * forward * inverse * total as f64);

    // kernel zero-padded to the transform domain, with its first weight at the origin
    let weights = kernel.samples::<Complex64>()?;
    let mut kernel_ft = try_zeroed(total)?;
    let no_shift = vec![0; ndims];
    let mut coords = vec![0; ndims];
    for &w in weights.iter() {
        kernel_ft[offset_of(&coords, &no_shift, &ext_strides)] = w;
        increment_coords(&mut coords, kernel_sizes);
    }
    fft_nd(&mut kernel_ft, &ext_sizes, 1, false, strategy)?;
    kernel_ft.iter_mut().for_each(|k| *k *= forward);

    // the valid part of the circular convolution starts at kernel_size - 1
    let crop: Vec<usize> = kernel_sizes.iter().map(|&k| k - 1).collect();
    let mut out = try_zeroed(src.num_samples())?;
    let mut plane = try_zeroed(total)?;
    for t in 0..tensor_elements {
        for (i, p) in plane.iter_mut().enumerate() {
            *p = ext[i * tensor_elements + t];
        }
        fft_nd(&mut plane, &ext_sizes, 1, false, strategy)?;
        for (p, &k) in plane.iter_mut().zip(&kernel_ft) {
            *p = *p * forward * k;
        }
        fft_nd(&mut plane, &ext_sizes, 1, true, strategy)?;

        let mut coords = vec![0; ndims];
        for pixel in 0..src.num_pixels() {
            out[pixel * tensor_elements + t] =
                plane[offset_of(&coords, &crop, &ext_strides)] * (inverse * compensation);
            increment_coords(&mut coords, sizes);
        }
    }

    Ok(out)
}

/// Convolve an image with a dense kernel through the discrete Fourier transform.
///
/// The image is first extended by the kernel support using the boundary conditions, so the
/// result equals [`crate::filter::general_convolution`] up to rounding, without circular
/// wrap-around. The extended image and the zero-padded kernel are transformed, multiplied and
/// transformed back, and the valid part is cropped out.
///
/// The output is real when both the image and the kernel are real. It does not depend on
/// `options.normalization`. With `options.fast_sizes` the transform domain is padded further
/// to a size with only the prime factors 2, 3 and 5.
///
/// [`BoundaryCondition::AddMaxValue`] and [`BoundaryCondition::AddMinValue`] fill the border
/// with the extreme values of the floating-point type, which no transform can carry without
/// overflow. With either of them on any axis the convolution is computed by direct summation
/// through [`crate::filter::general_convolution`] instead.
///
/// # Errors
///
/// The kernel must be scalar with finite weights and at most as many dimensions as the image.
/// Allocation failure of the working buffers gives [`FilterError::NativeTransformFailure`].
pub fn convolve_ft(
    src: &Image,
    kernel: &Image,
    boundary: &[BoundaryCondition],
    options: &FourierOptions,
    strategy: ExecutionStrategy,
) -> Result<Image, FilterError> {
    let ndims = src.dimensionality();
    let kernel_sizes = validate_dense_kernel(kernel, ndims)?;
    let boundary = broadcast_boundary(boundary, ndims)?;
    if has_extreme_fill(&boundary) {
        log::debug!("frequency-domain convolution: extreme fill, using direct summation");
        return general_convolution(src, kernel, &boundary, strategy);
    }

    let out = strategy
        .run(|| frequency_domain(src, kernel, &kernel_sizes, &boundary, options, strategy))??;

    let complex = src.is_complex() || kernel.is_complex();
    let data = if complex {
        ImageData::Complex(out)
    } else {
        ImageData::Real(out.iter().map(|v| v.re).collect())
    };
    Ok(src.with_samples(data, output_data_type(src.data_type(), complex))?)
}
