use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use dipconv_image::{Complex64, DataType, Image, ImageError, Sample};

use crate::{
    error::FilterError,
    lines::LineLayout,
    parallel::{for_each_chunk_mut, ExecutionStrategy},
};

/// The rule used to synthesize samples outside of the image domain.
///
/// The examples show the line `a b c d` and the samples that are added before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryCondition {
    /// Mirror including the edge sample.
    ///
    /// Example: ...c b a | a b c d
    #[default]
    SymmetricMirror,

    /// Mirror including the edge sample, negating the mirrored values.
    ///
    /// Example: ...-c -b -a | a b c d
    AsymmetricMirror,

    /// Wrap the content from the opposite side.
    ///
    /// Example: ...b c d | a b c d
    Periodic,

    /// Wrap the content from the opposite side, negating the wrapped values.
    ///
    /// Example: ...-b -c -d | a b c d
    AsymmetricPeriodic,

    /// Fill with zeros.
    AddZeros,

    /// Fill with the largest value of the image data type.
    AddMaxValue,

    /// Fill with the lowest value of the image data type.
    AddMinValue,

    /// Repeat the edge sample.
    ///
    /// Example: ...a a a | a b c d
    ZeroOrderExtrapolate,

    /// Continue the straight line through the two edge samples.
    FirstOrderExtrapolate,

    /// Quadratic that joins the two edge samples and reaches zero at the end of the border.
    SecondOrderExtrapolate,

    /// Cubic that joins the two edge samples and reaches zero with zero slope at the end of
    /// the border.
    ThirdOrderExtrapolate,
}

impl BoundaryCondition {
    /// The canonical name of the boundary condition.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryCondition::SymmetricMirror => "symmetric mirror",
            BoundaryCondition::AsymmetricMirror => "asymmetric mirror",
            BoundaryCondition::Periodic => "periodic",
            BoundaryCondition::AsymmetricPeriodic => "asymmetric periodic",
            BoundaryCondition::AddZeros => "add zeros",
            BoundaryCondition::AddMaxValue => "add max",
            BoundaryCondition::AddMinValue => "add min",
            BoundaryCondition::ZeroOrderExtrapolate => "zero order",
            BoundaryCondition::FirstOrderExtrapolate => "first order",
            BoundaryCondition::SecondOrderExtrapolate => "second order",
            BoundaryCondition::ThirdOrderExtrapolate => "third order",
        }
    }

    fn is_asymmetric(&self) -> bool {
        matches!(
            self,
            BoundaryCondition::AsymmetricMirror | BoundaryCondition::AsymmetricPeriodic
        )
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryCondition {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['-', '_'], " ");
        let bc = match name.as_str() {
            "" | "default" | "mirror" | "symmetric mirror" => BoundaryCondition::SymmetricMirror,
            "asym mirror" | "asymmetric mirror" => BoundaryCondition::AsymmetricMirror,
            "periodic" => BoundaryCondition::Periodic,
            "asym periodic" | "asymmetric periodic" => BoundaryCondition::AsymmetricPeriodic,
            "add zeros" => BoundaryCondition::AddZeros,
            "add max" => BoundaryCondition::AddMaxValue,
            "add min" => BoundaryCondition::AddMinValue,
            "zero order" => BoundaryCondition::ZeroOrderExtrapolate,
            "first order" => BoundaryCondition::FirstOrderExtrapolate,
            "second order" => BoundaryCondition::SecondOrderExtrapolate,
            "third order" => BoundaryCondition::ThirdOrderExtrapolate,
            _ => return Err(FilterError::UnsupportedBoundaryCondition(s.to_string())),
        };
        Ok(bc)
    }
}

/// Parse a list of boundary condition names.
///
/// # Errors
///
/// Unknown names give [`FilterError::UnsupportedBoundaryCondition`].
pub fn parse_boundary_conditions<S: AsRef<str>>(
    names: &[S],
) -> Result<Vec<BoundaryCondition>, FilterError> {
    names.iter().map(|s| s.as_ref().parse()).collect()
}

/// Expand a boundary condition list to one entry per dimension.
///
/// An empty list gives the default for every dimension and a single entry applies to all of
/// them.
///
/// # Errors
///
/// Any other length than 0, 1 or `dimensionality` gives
/// [`FilterError::DimensionalityMismatch`].
pub fn broadcast_boundary(
    boundary: &[BoundaryCondition],
    dimensionality: usize,
) -> Result<Vec<BoundaryCondition>, FilterError> {
    match boundary.len() {
        0 => Ok(vec![BoundaryCondition::default(); dimensionality]),
        1 => Ok(vec![boundary[0]; dimensionality]),
        n if n == dimensionality => Ok(boundary.to_vec()),
        n => Err(FilterError::dimensionality_mismatch(dimensionality, n)),
    }
}

/// The constants used by [`BoundaryCondition::AddMaxValue`] and
/// [`BoundaryCondition::AddMinValue`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryFill {
    /// Value used by `AddMaxValue`.
    pub max: f64,
    /// Value used by `AddMinValue`.
    pub min: f64,
}

impl BoundaryFill {
    /// The extreme values of `data_type`.
    pub fn for_data_type(data_type: DataType) -> Self {
        Self {
            max: data_type.max_value(),
            min: data_type.min_value(),
        }
    }
}

#[inline]
fn reflect(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * len as isize;
    let i = i.rem_euclid(period);
    if i >= len as isize {
        (period - 1 - i) as usize
    } else {
        i as usize
    }
}

#[inline]
fn wrap(i: isize, len: usize) -> usize {
    i.rem_euclid(len as isize) as usize
}

/// Polynomial coefficients `c0 + c1 i + c2 i^2 + c3 i^3` of an extrapolated border, where
/// `i = 1` is the sample next to the edge `d0` and `i = -1` is the sample `f1` inside.
fn extrapolation<T: Sample>(bc: BoundaryCondition, d0: T, f1: T, border: usize) -> [T; 4] {
    let b = border as f64 + 1.0;
    match bc {
        BoundaryCondition::FirstOrderExtrapolate => [d0, d0 - f1, T::zero(), T::zero()],
        BoundaryCondition::SecondOrderExtrapolate => [
            d0,
            d0 * ((b - 1.0) / b) - f1 * (b / (b + 1.0)),
            f1 * (1.0 / (b + 1.0)) - d0 * (1.0 / b),
            T::zero(),
        ],
        BoundaryCondition::ThirdOrderExtrapolate => {
            let b12 = (b + 1.0) * (b + 1.0);
            [
                d0,
                d0 * (1.0 - 2.0 / b) - f1 * (b * b / b12),
                f1 * (2.0 * b / b12) - d0 * ((2.0 * b - 1.0) / (b * b)),
                d0 * (1.0 / (b * b)) - f1 * (1.0 / b12),
            ]
        }
        _ => [d0, T::zero(), T::zero(), T::zero()],
    }
}

#[inline]
fn evaluate<T: Sample>(c: &[T; 4], i: usize) -> T {
    let x = i as f64;
    c[0] + c[1] * x + c[2] * (x * x) + c[3] * (x * x * x)
}

/// Fill the borders of a line buffer in place.
///
/// `buffer` holds `left` border samples, then the `len` samples of the line, then the right
/// border. The line itself must already be in place.
pub(crate) fn fill_border<T: Sample>(
    buffer: &mut [T],
    left: usize,
    len: usize,
    bc: BoundaryCondition,
    fill: BoundaryFill,
) {
    if buffer.len() == left + len || len == 0 {
        return;
    }
    let (head, rest) = buffer.split_at_mut(left);
    let (core, tail) = rest.split_at_mut(len);

    match bc {
        BoundaryCondition::SymmetricMirror
        | BoundaryCondition::AsymmetricMirror
        | BoundaryCondition::Periodic
        | BoundaryCondition::AsymmetricPeriodic => {
            let map = |i: isize| match bc {
                BoundaryCondition::Periodic | BoundaryCondition::AsymmetricPeriodic => {
                    wrap(i, len)
                }
                _ => reflect(i, len),
            };
            let sign = if bc.is_asymmetric() { -1.0 } else { 1.0 };
            for (ii, v) in head.iter_mut().enumerate() {
                *v = core[map(ii as isize - left as isize)] * sign;
            }
            for (ii, v) in tail.iter_mut().enumerate() {
                *v = core[map((len + ii) as isize)] * sign;
            }
        }
        BoundaryCondition::AddZeros => {
            head.fill(T::zero());
            tail.fill(T::zero());
        }
        BoundaryCondition::AddMaxValue => {
            head.fill(T::from_f64(fill.max));
            tail.fill(T::from_f64(fill.max));
        }
        BoundaryCondition::AddMinValue => {
            head.fill(T::from_f64(fill.min));
            tail.fill(T::from_f64(fill.min));
        }
        BoundaryCondition::ZeroOrderExtrapolate => {
            head.fill(core[0]);
            tail.fill(core[len - 1]);
        }
        BoundaryCondition::FirstOrderExtrapolate
        | BoundaryCondition::SecondOrderExtrapolate
        | BoundaryCondition::ThirdOrderExtrapolate => {
            if len == 1 {
                head.fill(core[0]);
                tail.fill(core[0]);
                return;
            }
            // a cubic needs more than two samples
            let bc = if len == 2 && bc == BoundaryCondition::ThirdOrderExtrapolate {
                BoundaryCondition::SecondOrderExtrapolate
            } else {
                bc
            };
            let c = extrapolation(bc, core[0], core[1], head.len());
            for (ii, v) in head.iter_mut().rev().enumerate() {
                *v = evaluate(&c, ii + 1);
            }
            let c = extrapolation(bc, core[len - 1], core[len - 2], tail.len());
            for (ii, v) in tail.iter_mut().enumerate() {
                *v = evaluate(&c, ii + 1);
            }
        }
    }
}

/// Extend a line with `left` samples before and `right` samples after it.
///
/// # Examples
///
/// ```
/// use dipconv_linear::boundary::{extend_line, BoundaryCondition, BoundaryFill};
/// use dipconv_image::DataType;
///
/// let fill = BoundaryFill::for_data_type(DataType::DFloat);
/// let ext = extend_line(&[1.0, 2.0, 3.0], 2, 1, BoundaryCondition::SymmetricMirror, fill);
/// assert_eq!(ext, vec![2.0, 1.0, 1.0, 2.0, 3.0, 3.0]);
/// ```
pub fn extend_line<T: Sample>(
    line: &[T],
    left: usize,
    right: usize,
    bc: BoundaryCondition,
    fill: BoundaryFill,
) -> Vec<T> {
    let mut buffer = vec![T::zero(); left + line.len() + right];
    buffer[left..left + line.len()].copy_from_slice(line);
    fill_border(&mut buffer, left, line.len(), bc, fill);
    buffer
}

/// Extend a row-major sample buffer by `low[d]` samples before and `high[d]` after each
/// dimension `d`.
///
/// The dimensions are extended one after the other, so the corners are synthesized along
/// every dimension. Returns the extended samples and their sizes.
#[allow(clippy::too_many_arguments)]
pub(crate) fn extend_samples<T: Sample>(
    samples: &[T],
    sizes: &[usize],
    tensor_elements: usize,
    low: &[usize],
    high: &[usize],
    boundary: &[BoundaryCondition],
    fill: BoundaryFill,
    strategy: ExecutionStrategy,
) -> (Vec<T>, Vec<usize>) {
    let mut data = Cow::Borrowed(samples);
    let mut sizes = sizes.to_vec();

    for axis in 0..sizes.len() {
        let (lo, hi) = (low[axis], high[axis]);
        if lo + hi == 0 {
            continue;
        }
        let len = sizes[axis];
        let src = LineLayout::new(&sizes, tensor_elements, axis);
        sizes[axis] += lo + hi;
        let dst = LineLayout::new(&sizes, tensor_elements, axis);

        let mut lines = vec![T::zero(); dst.count * dst.length];
        let bc = boundary[axis];
        for_each_chunk_mut(strategy, &mut lines, dst.length, |line, buffer| {
            src.gather(&data, line, &mut buffer[lo..lo + len]);
            fill_border(buffer, lo, len, bc, fill);
        });

        let mut out = vec![T::zero(); lines.len()];
        dst.scatter_all(&lines, &mut out);
        data = Cow::Owned(out);
    }

    (data.into_owned(), sizes)
}

/// Extend an image by `low[d]` samples before and `high[d]` samples after each dimension `d`.
///
/// The result keeps the data type, tensor elements and pixel size of the input, so
/// [`BoundaryCondition::AddMaxValue`] and [`BoundaryCondition::AddMinValue`] fill with the
/// extreme values of the input data type.
///
/// # Errors
///
/// `low`, `high` and `boundary` must have one entry per dimension (`boundary` may also have
/// zero or one entry).
pub fn extend_image(
    src: &Image,
    low: &[usize],
    high: &[usize],
    boundary: &[BoundaryCondition],
) -> Result<Image, FilterError> {
    let ndims = src.dimensionality();
    let boundary = broadcast_boundary(boundary, ndims)?;
    for list in [low, high] {
        if list.len() != ndims {
            return Err(FilterError::dimensionality_mismatch(ndims, list.len()));
        }
    }
    let fill = BoundaryFill::for_data_type(src.data_type());

    let (data, sizes) = if src.is_complex() {
        let samples = src.samples::<Complex64>()?;
        let (ext, sizes) = extend_samples(
            &samples,
            src.sizes(),
            src.tensor_elements(),
            low,
            high,
            &boundary,
            fill,
            ExecutionStrategy::Auto,
        );
        (Complex64::into_data(ext), sizes)
    } else {
        let samples = src.samples::<f64>()?;
        let (ext, sizes) = extend_samples(
            &samples,
            src.sizes(),
            src.tensor_elements(),
            low,
            high,
            &boundary,
            fill,
            ExecutionStrategy::Auto,
        );
        (f64::into_data(ext), sizes)
    };

    let out = Image::from_data(sizes, src.tensor_elements(), data, src.data_type())?;
    Ok(out.with_pixel_size(src.pixel_size().clone())?)
}

/// Read one sample at an arbitrary integer coordinate.
///
/// Coordinates outside the image are resolved with the boundary condition of their
/// dimension. Asymmetric conditions flip the sign once per dimension that is out of bounds.
///
/// # Errors
///
/// The extrapolating boundary conditions need a whole line and give
/// [`FilterError::UnsupportedBoundaryCondition`] here.
pub fn read_with_boundary(
    src: &Image,
    coords: &[isize],
    tensor_element: usize,
    boundary: &[BoundaryCondition],
) -> Result<Complex64, FilterError> {
    let ndims = src.dimensionality();
    if coords.len() != ndims {
        return Err(ImageError::InvalidCoordinate(coords.len(), ndims).into());
    }
    let boundary = broadcast_boundary(boundary, ndims)?;

    let mut mapped = Vec::with_capacity(ndims);
    let mut negate = false;
    for ((&c, &size), &bc) in coords.iter().zip(src.sizes()).zip(&boundary) {
        if c >= 0 && (c as usize) < size {
            mapped.push(c as usize);
            continue;
        }
        let index = match bc {
            BoundaryCondition::SymmetricMirror => reflect(c, size),
            BoundaryCondition::AsymmetricMirror => {
                negate = !negate;
                reflect(c, size)
            }
            BoundaryCondition::Periodic => wrap(c, size),
            BoundaryCondition::AsymmetricPeriodic => {
                negate = !negate;
                wrap(c, size)
            }
            BoundaryCondition::AddZeros => return Ok(Complex64::new(0.0, 0.0)),
            BoundaryCondition::AddMaxValue => {
                return Ok(Complex64::new(src.data_type().max_value(), 0.0))
            }
            BoundaryCondition::AddMinValue => {
                return Ok(Complex64::new(src.data_type().min_value(), 0.0))
            }
            BoundaryCondition::ZeroOrderExtrapolate => c.clamp(0, size as isize - 1) as usize,
            _ => return Err(FilterError::UnsupportedBoundaryCondition(bc.to_string())),
        };
        mapped.push(index);
    }

    let value = src.get(&mapped, tensor_element)?;
    Ok(if negate { -value } else { value })
}
