use dipconv_image::{Complex64, Image, ImageData};
use num_traits::Zero;
use rustfft::FftPlanner;

use crate::{
    error::FilterError,
    filter::output_data_type,
    lines::LineLayout,
    parallel::{for_each_chunk_mut, ExecutionStrategy},
};

/// Where the `1/N` factor of the discrete Fourier transform pair is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FourierNormalization {
    /// The inverse transform is scaled by `1/N`.
    #[default]
    Inverse,
    /// Both transforms are scaled by `1/sqrt(N)`.
    Symmetric,
    /// The forward transform is scaled by `1/N`.
    Forward,
}

impl FourierNormalization {
    /// Scale applied to a transform over `num_pixels` pixels.
    pub fn scale(&self, inverse: bool, num_pixels: usize) -> f64 {
        let n = num_pixels as f64;
        match (self, inverse) {
            (FourierNormalization::Inverse, false) | (FourierNormalization::Forward, true) => 1.0,
            (FourierNormalization::Inverse, true) | (FourierNormalization::Forward, false) => {
                1.0 / n
            }
            (FourierNormalization::Symmetric, _) => 1.0 / n.sqrt(),
        }
    }
}

/// Options of the Fourier transform and of the frequency-domain convolution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FourierOptions {
    /// Normalization of the transform pair.
    pub normalization: FourierNormalization,
    /// Pad the convolution domain to sizes with only the prime factors 2, 3 and 5.
    pub fast_sizes: bool,
}

impl Default for FourierOptions {
    fn default() -> Self {
        Self {
            normalization: FourierNormalization::Inverse,
            fast_sizes: true,
        }
    }
}

/// Smallest size of at least `n` whose only prime factors are 2, 3 and 5.
///
/// # Examples
///
/// ```
/// use dipconv_linear::fourier::next_fast_length;
///
/// assert_eq!(next_fast_length(7), 8);
/// assert_eq!(next_fast_length(11), 12);
/// assert_eq!(next_fast_length(125), 125);
/// ```
pub fn next_fast_length(n: usize) -> usize {
    let mut m = n.max(1);
    loop {
        let mut r = m;
        for p in [2, 3, 5] {
            while r % p == 0 {
                r /= p;
            }
        }
        if r == 1 {
            return m;
        }
        m += 1;
    }
}

/// Allocate a zeroed buffer, reporting allocation failure as an error.
pub(crate) fn try_zeroed(len: usize) -> Result<Vec<Complex64>, FilterError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|e| {
        FilterError::NativeTransformFailure(format!("cannot allocate {len} samples: {e}"))
    })?;
    buffer.resize(len, Complex64::zero());
    Ok(buffer)
}

/// Unnormalized in-place n-dimensional DFT over the spatial axes of a row-major buffer.
///
/// Each tensor element is transformed on its own. Axes of size 1 are skipped.
pub(crate) fn fft_nd(
    data: &mut [Complex64],
    sizes: &[usize],
    tensor_elements: usize,
    inverse: bool,
    strategy: ExecutionStrategy,
) -> Result<(), FilterError> {
    let mut planner = FftPlanner::<f64>::new();
    let mut lines = try_zeroed(data.len())?;

    for (axis, &len) in sizes.iter().enumerate() {
        if len == 1 {
            continue;
        }
        let fft = if inverse {
            planner.plan_fft_inverse(len)
        } else {
            planner.plan_fft_forward(len)
        };
        let layout = LineLayout::new(sizes, tensor_elements, axis);
        {
            let src: &[Complex64] = data;
            for_each_chunk_mut(strategy, &mut lines, len, |line, chunk| {
                layout.gather(src, line, chunk);
                fft.process(chunk);
            });
        }
        layout.scatter_all(&lines, data);
    }

    Ok(())
}

/// Compute the n-dimensional discrete Fourier transform of an image.
///
/// All spatial axes are transformed, each tensor element on its own. The output is complex
/// with the sizes of the input and is scaled according to `options.normalization`, so a
/// forward transform followed by an inverse one returns the input for every normalization.
///
/// # Arguments
///
/// * `src` - The source image, real or complex.
/// * `inverse` - Compute the inverse transform.
/// * `options` - The normalization. `fast_sizes` does not apply here.
/// * `strategy` - How the transform lines are distributed over threads.
///
/// # Errors
///
/// Allocation failure of the working buffers gives [`FilterError::NativeTransformFailure`].
///
/// # Examples
///
/// ```
/// use dipconv_image::{Complex64, Image};
/// use dipconv_linear::{fourier_transform, ExecutionStrategy, FourierOptions};
///
/// let image = Image::new(vec![4], vec![1.0, 1.0, 1.0, 1.0]).unwrap();
/// let ft = fourier_transform(&image, false, &FourierOptions::default(), ExecutionStrategy::Serial)
///     .unwrap();
/// assert_eq!(ft.get(&[0], 0).unwrap(), Complex64::new(4.0, 0.0));
/// ```
pub fn fourier_transform(
    src: &Image,
    inverse: bool,
    options: &FourierOptions,
    strategy: ExecutionStrategy,
) -> Result<Image, FilterError> {
    let samples = src.samples::<Complex64>()?;
    let mut data = try_zeroed(samples.len())?;
    data.copy_from_slice(&samples);

    strategy.run(|| {
        fft_nd(
            &mut data,
            src.sizes(),
            src.tensor_elements(),
            inverse,
            strategy,
        )
    })??;

    let scale = options.normalization.scale(inverse, src.num_pixels());
    if scale != 1.0 {
        data.iter_mut().for_each(|v| *v *= scale);
    }
    log::trace!(
        "fourier transform: sizes {:?}, inverse {inverse}, scale {scale}",
        src.sizes()
    );

    Ok(src.with_samples(
        ImageData::Complex(data),
        output_data_type(src.data_type(), true),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_next_fast_length() {
        assert_eq!(next_fast_length(0), 1);
        assert_eq!(next_fast_length(1), 1);
        assert_eq!(next_fast_length(13), 15);
        assert_eq!(next_fast_length(97), 100);
    }

    #[test]
    fn test_normalization_scale() {
        let n = 16;
        for normalization in [
            FourierNormalization::Inverse,
            FourierNormalization::Symmetric,
            FourierNormalization::Forward,
        ] {
            let product = normalization.scale(false, n) * normalization.scale(true, n);
            assert_relative_eq!(product, 1.0 / n as f64);
        }
    }

    #[test]
    fn test_fourier_transform_impulse() -> Result<(), FilterError> {
        let mut data = vec![0.0; 12];
        data[0] = 1.0;
        let image = Image::new(vec![3, 4], data)?;
        let ft = fourier_transform(
            &image,
            false,
            &FourierOptions::default(),
            ExecutionStrategy::Serial,
        )?;
        assert!(ft.is_complex());
        for v in ft.as_complex_slice().unwrap_or_default() {
            assert_relative_eq!(v.re, 1.0, epsilon = 1e-12);
            assert_relative_eq!(v.im, 0.0, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_fourier_transform_shift() -> Result<(), FilterError> {
        // an impulse at x = 1 gives exp(-2 pi i k / n)
        let image = Image::new(vec![8], vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])?;
        let ft = fourier_transform(
            &image,
            false,
            &FourierOptions::default(),
            ExecutionStrategy::Serial,
        )?;
        for (k, v) in ft.as_complex_slice().unwrap_or_default().iter().enumerate() {
            let phase = -2.0 * std::f64::consts::PI * k as f64 / 8.0;
            assert_relative_eq!(v.re, phase.cos(), epsilon = 1e-12);
            assert_relative_eq!(v.im, phase.sin(), epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_fourier_transform_tensor_elements() -> Result<(), FilterError> {
        let image = Image::from_data(
            vec![2],
            2,
            ImageData::Real(vec![1.0, 3.0, 2.0, 5.0]),
            dipconv_image::DataType::SFloat,
        )?;
        let ft = fourier_transform(
            &image,
            false,
            &FourierOptions::default(),
            ExecutionStrategy::Serial,
        )?;
        assert_eq!(ft.data_type(), dipconv_image::DataType::SComplex);
        let expected = [
            Complex64::new(3.0, 0.0),
            Complex64::new(8.0, 0.0),
            Complex64::new(-1.0, 0.0),
            Complex64::new(-2.0, 0.0),
        ];
        for (v, e) in ft.as_complex_slice().unwrap_or_default().iter().zip(expected) {
            assert_relative_eq!(v.re, e.re, epsilon = 1e-12);
            assert_relative_eq!(v.im, e.im, epsilon = 1e-12);
        }
        Ok(())
    }
}
