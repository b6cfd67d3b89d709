use dipconv_image::{Complex64, Image, ImageData, Sample};
use faer::{complex_native::c64, Mat};

use super::one_dimensional::{FilterWeights, OneDimensionalFilter};
use crate::error::FilterError;

/// Default relative tolerance on the second singular value of [`separate_filter`].
pub const SEPARABILITY_TOLERANCE: f64 = 1e-7;

/// Sample types that can be split into a rank-one factorization.
trait RankOne: Sample {
    /// Factor the row-major `rows x cols` matrix into a column and a row vector.
    ///
    /// Returns `None` when the second singular value is above the tolerance.
    fn rank_one(
        data: &[Self],
        rows: usize,
        cols: usize,
        tolerance: f64,
    ) -> Option<(Vec<Self>, Vec<Self>)>;

    fn into_weights(weights: Vec<Self>) -> FilterWeights;
}

#[inline]
fn is_rank_one(s1: f64, s2: f64, rows: usize, cols: usize, tolerance: f64) -> bool {
    s2 <= tolerance * rows.max(cols) as f64 * s1.abs()
}

impl RankOne for f64 {
    fn rank_one(
        data: &[f64],
        rows: usize,
        cols: usize,
        tolerance: f64,
    ) -> Option<(Vec<f64>, Vec<f64>)> {
        let m = Mat::<f64>::from_fn(rows, cols, |i, j| data[i * cols + j]);
        let svd = m.svd();
        let s = svd.s_diagonal();
        let s1 = s.read(0);
        let s2 = if rows.min(cols) > 1 { s.read(1) } else { 0.0 };
        if !is_rank_one(s1, s2, rows, cols, tolerance) {
            return None;
        }
        let (u, v) = (svd.u(), svd.v());
        let column = (0..rows).map(|i| u.read(i, 0) * s1).collect();
        let row = (0..cols).map(|j| v.read(j, 0)).collect();
        Some((column, row))
    }

    fn into_weights(weights: Vec<f64>) -> FilterWeights {
        FilterWeights::Real(weights)
    }
}

impl RankOne for Complex64 {
    fn rank_one(
        data: &[Complex64],
        rows: usize,
        cols: usize,
        tolerance: f64,
    ) -> Option<(Vec<Complex64>, Vec<Complex64>)> {
        let m = Mat::<c64>::from_fn(rows, cols, |i, j| {
            let z = data[i * cols + j];
            c64::new(z.re, z.im)
        });
        let svd = m.svd();
        let s = svd.s_diagonal();
        let s1 = s.read(0).re;
        let s2 = if rows.min(cols) > 1 { s.read(1).re } else { 0.0 };
        if !is_rank_one(s1, s2, rows, cols, tolerance) {
            return None;
        }
        let (u, v) = (svd.u(), svd.v());
        let column = (0..rows)
            .map(|i| {
                let z = u.read(i, 0);
                Complex64::new(z.re, z.im) * s1
            })
            .collect();
        // M = U S V^H, so the row factor is the conjugate of the first column of V
        let row = (0..cols)
            .map(|j| {
                let z = v.read(j, 0);
                Complex64::new(z.re, -z.im)
            })
            .collect();
        Some((column, row))
    }

    fn into_weights(weights: Vec<Complex64>) -> FilterWeights {
        FilterWeights::Complex(weights)
    }
}

/// Peel the axes from the last one down to axis 1, one rank-one split per axis.
fn separate<T: RankOne>(
    data: Vec<T>,
    sizes: &[usize],
    tolerance: f64,
) -> Option<Vec<OneDimensionalFilter>> {
    let mut filters = vec![OneDimensionalFilter::default(); sizes.len()];
    let mut rest = data;
    for axis in (1..sizes.len()).rev() {
        let len = sizes[axis];
        if len == 1 {
            continue;
        }
        let rows = rest.len() / len;
        let (remainder, filter) = if rows == 1 {
            (vec![T::from_f64(1.0)], rest)
        } else {
            T::rank_one(&rest, rows, len, tolerance)?
        };
        filters[axis] = OneDimensionalFilter::from_weights(T::into_weights(filter));
        rest = remainder;
    }
    filters[0] = OneDimensionalFilter::from_weights(T::into_weights(rest));
    Some(filters)
}

/// Split a dense kernel into one filter per kernel axis.
///
/// Returns `None` when the kernel is not the outer product of one-dimensional filters within
/// `tolerance`: the second singular value of one of the unfoldings exceeds
/// `tolerance * max(rows, cols) * s1`. The filters are general with a default origin, so the
/// separable convolution with them matches the convolution with the dense kernel. Axes of
/// size 1 get an empty filter, except for axis 0 which always holds the scale.
///
/// An all-zero kernel is separable into all-zero filters.
///
/// # Errors
///
/// The kernel must be scalar with finite weights.
///
/// # Examples
///
/// ```
/// use dipconv_image::Image;
/// use dipconv_linear::filter::{separate_filter, SEPARABILITY_TOLERANCE};
///
/// let separable = Image::new(vec![2, 2], vec![1.0, 2.0, 2.0, 4.0]).unwrap();
/// assert!(separate_filter(&separable, SEPARABILITY_TOLERANCE).unwrap().is_some());
///
/// let diagonal = Image::new(vec![2, 2], vec![1.0, 0.0, 0.0, 1.0]).unwrap();
/// assert!(separate_filter(&diagonal, SEPARABILITY_TOLERANCE).unwrap().is_none());
/// ```
pub fn separate_filter(
    kernel: &Image,
    tolerance: f64,
) -> Result<Option<Vec<OneDimensionalFilter>>, FilterError> {
    if !kernel.is_scalar() {
        return Err(FilterError::invalid_kernel(format!(
            "kernel must be scalar, got {} tensor elements",
            kernel.tensor_elements()
        )));
    }
    if !kernel.data().is_finite() {
        return Err(FilterError::invalid_kernel("kernel weights must be finite"));
    }

    let sizes = kernel.sizes();
    let is_zero = match kernel.data() {
        ImageData::Real(w) => w.iter().all(|&v| v == 0.0),
        ImageData::Complex(w) => w.iter().all(|&v| v == Complex64::new(0.0, 0.0)),
    };
    if is_zero {
        let filters = sizes
            .iter()
            .map(|&len| OneDimensionalFilter::new(vec![0.0; len]))
            .collect();
        return Ok(Some(filters));
    }

    let filters = match kernel.data() {
        ImageData::Real(w) => separate(w.clone(), sizes, tolerance),
        ImageData::Complex(w) => separate(w.clone(), sizes, tolerance),
    };
    Ok(filters)
}
