use std::fmt;
use std::str::FromStr;

use dipconv_image::{Complex64, DataType, Image, Sample};

use crate::error::FilterError;

/// Declared structure of a one-dimensional filter.
///
/// For the symmetric variants the weights hold the left half of the filter, center included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Symmetry {
    /// The weights are the full filter.
    #[default]
    General,
    /// `h ++ reverse(h[..m-1])`, odd size `2m-1`.
    Even,
    /// `h ++ -reverse(h[..m-1])`, odd size `2m-1`.
    Odd,
    /// `h ++ reverse(h)`, even size `2m`.
    DEven,
    /// `h ++ -reverse(h)`, even size `2m`.
    DOdd,
}

impl Symmetry {
    /// Size of the full filter for `len` stored weights.
    pub fn expanded_size(&self, len: usize) -> usize {
        match self {
            Symmetry::General => len,
            Symmetry::Even | Symmetry::Odd => (2 * len).saturating_sub(1),
            Symmetry::DEven | Symmetry::DOdd => 2 * len,
        }
    }

    /// The canonical name of the symmetry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Symmetry::General => "general",
            Symmetry::Even => "even",
            Symmetry::Odd => "odd",
            Symmetry::DEven => "d-even",
            Symmetry::DOdd => "d-odd",
        }
    }
}

impl fmt::Display for Symmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symmetry {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "general" => Ok(Symmetry::General),
            "even" => Ok(Symmetry::Even),
            "odd" => Ok(Symmetry::Odd),
            "d-even" => Ok(Symmetry::DEven),
            "d-odd" => Ok(Symmetry::DOdd),
            _ => Err(FilterError::invalid_kernel(format!(
                "unknown filter symmetry '{s}'"
            ))),
        }
    }
}

/// Weights of a one-dimensional filter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterWeights {
    /// Real weights.
    Real(Vec<f64>),
    /// Complex weights.
    Complex(Vec<Complex64>),
}

impl Default for FilterWeights {
    fn default() -> Self {
        FilterWeights::Real(Vec::new())
    }
}

impl FilterWeights {
    /// Number of stored weights.
    pub fn len(&self) -> usize {
        match self {
            FilterWeights::Real(w) => w.len(),
            FilterWeights::Complex(w) => w.len(),
        }
    }

    /// Whether there are no weights.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the weights are complex.
    pub fn is_complex(&self) -> bool {
        matches!(self, FilterWeights::Complex(_))
    }

    fn is_finite(&self) -> bool {
        match self {
            FilterWeights::Real(w) => w.iter().all(|v| v.is_finite()),
            FilterWeights::Complex(w) => w.iter().all(|v| v.is_finite()),
        }
    }

    /// The weights converted to the sample type `T`.
    ///
    /// Complex weights lose their imaginary part when read as `f64`.
    pub fn to_samples<T: Sample>(&self) -> Vec<T> {
        match self {
            FilterWeights::Real(w) => w.iter().map(|&v| T::from_f64(v)).collect(),
            FilterWeights::Complex(w) => w.iter().map(|&v| T::from_complex(v)).collect(),
        }
    }
}

/// Expand compact weights to the full filter.
fn expand<T: Sample>(h: &[T], symmetry: Symmetry) -> Vec<T> {
    let m = h.len();
    let head = h.iter().copied();
    let inner = h[..m.saturating_sub(1)].iter().rev().copied();
    let all = h.iter().rev().copied();
    match symmetry {
        Symmetry::General => h.to_vec(),
        Symmetry::Even => head.chain(inner).collect(),
        Symmetry::Odd => head.chain(inner.map(|v| -v)).collect(),
        Symmetry::DEven => head.chain(all).collect(),
        Symmetry::DOdd => head.chain(all.map(|v| -v)).collect(),
    }
}

/// A one-dimensional filter applied along one image axis.
///
/// An empty filter, or the single weight `1`, leaves the axis untouched.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OneDimensionalFilter {
    /// The stored weights. For symmetric filters, the left half with the center.
    pub weights: FilterWeights,
    /// Index of the full filter aligned with the output sample. Defaults to `size / 2`.
    pub origin: Option<usize>,
    /// Declared structure of the weights.
    pub symmetry: Symmetry,
}

impl OneDimensionalFilter {
    /// Create a general filter from real weights.
    ///
    /// # Examples
    ///
    /// ```
    /// use dipconv_linear::{OneDimensionalFilter, Symmetry};
    ///
    /// let filter = OneDimensionalFilter::new(vec![1.0, 2.0]).with_symmetry(Symmetry::Even);
    /// assert_eq!(filter.size(), 3);
    /// assert_eq!(filter.origin(), 1);
    /// ```
    pub fn new(weights: Vec<f64>) -> Self {
        Self::from_weights(FilterWeights::Real(weights))
    }

    /// Create a general filter from complex weights.
    pub fn complex(weights: Vec<Complex64>) -> Self {
        Self::from_weights(FilterWeights::Complex(weights))
    }

    /// Create a general filter from weights.
    pub fn from_weights(weights: FilterWeights) -> Self {
        Self {
            weights,
            origin: None,
            symmetry: Symmetry::General,
        }
    }

    /// Create a complex filter from interleaved real and imaginary parts.
    ///
    /// # Errors
    ///
    /// The data must have an even number of values.
    pub fn from_interleaved_complex(data: &[f64]) -> Result<Self, FilterError> {
        if data.len() % 2 != 0 {
            return Err(FilterError::invalid_kernel(format!(
                "interleaved complex weights need an even number of values, got {}",
                data.len()
            )));
        }
        let weights = data
            .chunks_exact(2)
            .map(|c| Complex64::new(c[0], c[1]))
            .collect();
        Ok(Self::complex(weights))
    }

    /// The filter that leaves an axis unchanged.
    pub fn identity() -> Self {
        Self::new(vec![1.0])
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: usize) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the symmetry.
    pub fn with_symmetry(mut self, symmetry: Symmetry) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Number of stored weights.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether there are no weights.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Whether the weights are complex.
    pub fn is_complex(&self) -> bool {
        self.weights.is_complex()
    }

    /// Size of the full filter.
    pub fn size(&self) -> usize {
        self.symmetry.expanded_size(self.len())
    }

    /// The origin, or the default `size / 2` when not set.
    pub fn origin(&self) -> usize {
        self.origin.unwrap_or(self.size() / 2)
    }

    /// The full filter as a `General` weight vector.
    pub fn expanded(&self) -> FilterWeights {
        match &self.weights {
            FilterWeights::Real(w) => FilterWeights::Real(expand(w, self.symmetry)),
            FilterWeights::Complex(w) => FilterWeights::Complex(expand(w, self.symmetry)),
        }
    }

    /// Validate the filter and convert it to the sample type `T`.
    pub(crate) fn compile<T: Sample>(&self) -> Result<CompiledFilter<T>, FilterError> {
        if !self.weights.is_finite() {
            return Err(FilterError::invalid_kernel(
                "filter weights must be finite",
            ));
        }
        let size = self.size();
        let origin = self.origin();
        if size > 0 && origin >= size {
            return Err(FilterError::invalid_kernel(format!(
                "origin {origin} outside of a filter of size {size}"
            )));
        }
        Ok(CompiledFilter {
            weights: self.weights.to_samples(),
            size,
            origin,
            symmetry: self.symmetry,
        })
    }
}

/// A validated filter in the sample type of the computation.
#[derive(Debug, Clone)]
pub(crate) struct CompiledFilter<T> {
    weights: Vec<T>,
    size: usize,
    origin: usize,
    symmetry: Symmetry,
}

impl<T: Sample> CompiledFilter<T> {
    /// Whether applying the filter leaves the data unchanged.
    pub fn is_identity(&self) -> bool {
        self.size == 0 || (self.size == 1 && self.weights[0] == T::from_f64(1.0))
    }

    /// Samples needed before and after a line.
    pub fn border(&self) -> (usize, usize) {
        (self.size - 1 - self.origin, self.origin)
    }

    /// Convolve an extended line.
    ///
    /// `ext` holds the line with the border of [`Self::border`] on each side, `out` receives
    /// one value per line sample.
    pub fn apply_line(&self, ext: &[T], out: &mut [T]) {
        let h = &self.weights;
        let m = h.len();
        let last = self.size - 1;
        match self.symmetry {
            Symmetry::General => {
                for (i, o) in out.iter_mut().enumerate() {
                    let p = i + last;
                    *o = h
                        .iter()
                        .enumerate()
                        .fold(T::zero(), |acc, (k, &w)| acc + w * ext[p - k]);
                }
            }
            Symmetry::Even | Symmetry::Odd => {
                let odd = self.symmetry == Symmetry::Odd;
                for (i, o) in out.iter_mut().enumerate() {
                    let p = i + last;
                    let mut acc = h[m - 1] * ext[p - (m - 1)];
                    for (k, &w) in h[..m - 1].iter().enumerate() {
                        let (a, b) = (ext[p - k], ext[p - (2 * m - 2 - k)]);
                        acc = acc + w * if odd { a - b } else { a + b };
                    }
                    *o = acc;
                }
            }
            Symmetry::DEven | Symmetry::DOdd => {
                let odd = self.symmetry == Symmetry::DOdd;
                for (i, o) in out.iter_mut().enumerate() {
                    let p = i + last;
                    let mut acc = T::zero();
                    for (k, &w) in h.iter().enumerate() {
                        let (a, b) = (ext[p - k], ext[p - (2 * m - 1 - k)]);
                        acc = acc + w * if odd { a - b } else { a + b };
                    }
                    *o = acc;
                }
            }
        }
    }
}

/// The kernel argument of [`crate::filter::convolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum KernelSpec {
    /// A dense array of weights with the origin at `size / 2` along each axis.
    Dense(Image),
    /// One filter per image axis.
    PerAxis(Vec<OneDimensionalFilter>),
    /// One filter applied along every image axis.
    Single(OneDimensionalFilter),
}

impl From<Image> for KernelSpec {
    fn from(kernel: Image) -> Self {
        KernelSpec::Dense(kernel)
    }
}

impl From<Vec<OneDimensionalFilter>> for KernelSpec {
    fn from(filters: Vec<OneDimensionalFilter>) -> Self {
        KernelSpec::PerAxis(filters)
    }
}

impl From<OneDimensionalFilter> for KernelSpec {
    fn from(filter: OneDimensionalFilter) -> Self {
        KernelSpec::Single(filter)
    }
}

/// Check a dense kernel against an image of `dimensionality` dimensions.
///
/// Returns the kernel sizes with trailing singleton axes up to `dimensionality`.
pub(crate) fn validate_dense_kernel(
    kernel: &Image,
    dimensionality: usize,
) -> Result<Vec<usize>, FilterError> {
    if !kernel.is_scalar() {
        return Err(FilterError::invalid_kernel(format!(
            "kernel must be scalar, got {} tensor elements",
            kernel.tensor_elements()
        )));
    }
    if kernel.dimensionality() > dimensionality {
        return Err(FilterError::invalid_kernel(format!(
            "kernel has {} dimensions, image has {dimensionality}",
            kernel.dimensionality()
        )));
    }
    if !kernel.data().is_finite() {
        return Err(FilterError::invalid_kernel("kernel weights must be finite"));
    }
    let mut sizes = kernel.sizes().to_vec();
    sizes.resize(dimensionality, 1);
    Ok(sizes)
}

/// Data type of a filter output: the flex type of the input, complex when the computation is.
pub(crate) fn output_data_type(input: DataType, complex: bool) -> DataType {
    let data_type = input.suggest_flex();
    if complex {
        data_type.to_complex()
    } else {
        data_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetry_parse() -> Result<(), FilterError> {
        assert_eq!("d-even".parse::<Symmetry>()?, Symmetry::DEven);
        assert_eq!("".parse::<Symmetry>()?, Symmetry::General);
        assert!(matches!(
            "skew".parse::<Symmetry>(),
            Err(FilterError::InvalidKernel(_))
        ));
        Ok(())
    }

    #[test]
    fn test_expanded() {
        let h = vec![1.0, 2.0, 3.0];
        let expanded = |s: Symmetry| OneDimensionalFilter::new(h.clone()).with_symmetry(s).expanded();
        assert_eq!(
            expanded(Symmetry::Even),
            FilterWeights::Real(vec![1.0, 2.0, 3.0, 2.0, 1.0])
        );
        assert_eq!(
            expanded(Symmetry::Odd),
            FilterWeights::Real(vec![1.0, 2.0, 3.0, -2.0, -1.0])
        );
        assert_eq!(
            expanded(Symmetry::DEven),
            FilterWeights::Real(vec![1.0, 2.0, 3.0, 3.0, 2.0, 1.0])
        );
        assert_eq!(
            expanded(Symmetry::DOdd),
            FilterWeights::Real(vec![1.0, 2.0, 3.0, -3.0, -2.0, -1.0])
        );
    }

    #[test]
    fn test_interleaved_complex() -> Result<(), FilterError> {
        let filter = OneDimensionalFilter::from_interleaved_complex(&[1.0, 2.0, 3.0, -4.0])?;
        assert_eq!(
            filter.weights,
            FilterWeights::Complex(vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, -4.0)])
        );
        assert!(matches!(
            OneDimensionalFilter::from_interleaved_complex(&[1.0]),
            Err(FilterError::InvalidKernel(_))
        ));
        Ok(())
    }

    #[test]
    fn test_compile_validation() {
        let filter = OneDimensionalFilter::new(vec![1.0, 2.0, 3.0]).with_origin(3);
        assert!(matches!(
            filter.compile::<f64>(),
            Err(FilterError::InvalidKernel(_))
        ));
        let filter = OneDimensionalFilter::new(vec![1.0, f64::NAN]);
        assert!(matches!(
            filter.compile::<f64>(),
            Err(FilterError::InvalidKernel(_))
        ));
    }

    #[test]
    fn test_identity_and_border() -> Result<(), FilterError> {
        assert!(OneDimensionalFilter::identity().compile::<f64>()?.is_identity());
        assert!(OneDimensionalFilter::default().compile::<f64>()?.is_identity());
        let deven = OneDimensionalFilter::identity().with_symmetry(Symmetry::DEven);
        assert!(!deven.compile::<f64>()?.is_identity());

        let filter = OneDimensionalFilter::new(vec![1.0; 4]).compile::<f64>()?;
        assert_eq!(filter.border(), (1, 2));
        let filter = OneDimensionalFilter::new(vec![1.0; 4])
            .with_origin(0)
            .compile::<f64>()?;
        assert_eq!(filter.border(), (3, 0));
        Ok(())
    }

    #[test]
    fn test_apply_line_symmetric_matches_general() -> Result<(), FilterError> {
        let ext: Vec<f64> = (0..12).map(|x| ((x * 7) % 5) as f64 - 1.5).collect();
        let h = vec![0.25, -1.0, 2.0];
        for symmetry in [Symmetry::Even, Symmetry::Odd, Symmetry::DEven, Symmetry::DOdd] {
            let compact = OneDimensionalFilter::new(h.clone()).with_symmetry(symmetry);
            let FilterWeights::Real(full) = compact.expanded() else {
                unreachable!()
            };
            let general = OneDimensionalFilter::new(full).compile::<f64>()?;
            let compact = compact.compile::<f64>()?;

            let n = ext.len() + 1 - compact.size;
            let (mut a, mut b) = (vec![0.0; n], vec![0.0; n]);
            compact.apply_line(&ext, &mut a);
            general.apply_line(&ext, &mut b);
            for (x, y) in a.iter().zip(&b) {
                approx::assert_relative_eq!(*x, *y, epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_apply_line_general() -> Result<(), FilterError> {
        // out[i] = sum_k f[k] in[i + origin - k]
        let filter = OneDimensionalFilter::new(vec![1.0, 2.0, 3.0]).compile::<f64>()?;
        let ext = [0.0, 1.0, 0.0, 0.0, 0.0];
        let mut out = [0.0; 3];
        filter.apply_line(&ext, &mut out);
        assert_eq!(out, [2.0, 3.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_validate_dense_kernel() -> Result<(), FilterError> {
        let kernel = Image::new(vec![3], vec![1.0, 2.0, 1.0])?;
        assert_eq!(validate_dense_kernel(&kernel, 3)?, vec![3, 1, 1]);
        let kernel = Image::new(vec![3, 3, 1], vec![1.0; 9])?;
        assert!(matches!(
            validate_dense_kernel(&kernel, 2),
            Err(FilterError::InvalidKernel(_))
        ));
        Ok(())
    }
}
