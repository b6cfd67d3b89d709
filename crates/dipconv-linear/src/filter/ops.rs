use std::borrow::Cow;

use dipconv_image::{image::increment_coords, Complex64, Image, ImageData};

use super::{
    convolve_ft, general_convolution, kernels, separable_convolution, separate_filter,
    validate_dense_kernel, KernelSpec, OneDimensionalFilter, SEPARABILITY_TOLERANCE,
};
use crate::{
    boundary::{broadcast_boundary, parse_boundary_conditions, BoundaryCondition},
    error::FilterError,
    fourier::FourierOptions,
    parallel::ExecutionStrategy,
};

/// Largest number of kernel weights for which a non-separable kernel is applied by direct
/// summation instead of through the Fourier transform.
pub const GENERAL_CONVOLUTION_MAX_SAMPLES: usize = 7 * 7;

/// The executor that applies a convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConvolutionStrategy {
    /// One pass per axis with a one-dimensional filter.
    Separable,
    /// Direct summation over the kernel support.
    General,
    /// Product in the frequency domain.
    Fourier,
}

/// Parameters of [`convolve_with_config`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvolutionConfig {
    /// Boundary conditions, empty for the default, one for all axes, or one per axis.
    pub boundary: Vec<BoundaryCondition>,
    /// Non-separable kernels with at most this many weights use direct summation.
    pub general_max_samples: usize,
    /// Relative tolerance of the separability test.
    pub separability_tolerance: f64,
    /// Use this executor for dense kernels instead of choosing one.
    pub force_strategy: Option<ConvolutionStrategy>,
    /// Options of the frequency-domain executor.
    pub fourier: FourierOptions,
    /// How the work of each executor is distributed over threads.
    pub execution: ExecutionStrategy,
}

impl Default for ConvolutionConfig {
    fn default() -> Self {
        Self {
            boundary: Vec::new(),
            general_max_samples: GENERAL_CONVOLUTION_MAX_SAMPLES,
            separability_tolerance: SEPARABILITY_TOLERANCE,
            force_strategy: None,
            fourier: FourierOptions::default(),
            execution: ExecutionStrategy::default(),
        }
    }
}

impl ConvolutionConfig {
    /// Set the boundary conditions.
    pub fn with_boundary(mut self, boundary: Vec<BoundaryCondition>) -> Self {
        self.boundary = boundary;
        self
    }

    /// Pin the executor used for dense kernels.
    pub fn with_strategy(mut self, strategy: ConvolutionStrategy) -> Self {
        self.force_strategy = Some(strategy);
        self
    }

    /// Set the execution strategy.
    pub fn with_execution(mut self, execution: ExecutionStrategy) -> Self {
        self.execution = execution;
        self
    }
}

/// Pick the executor for a dense kernel.
///
/// Separable kernels are applied per axis. Other kernels use direct summation up to
/// `config.general_max_samples` weights and the Fourier transform above. A forced strategy
/// in the configuration always wins.
pub fn select_strategy(
    kernel_samples: usize,
    separable: bool,
    config: &ConvolutionConfig,
) -> ConvolutionStrategy {
    if let Some(strategy) = config.force_strategy {
        return strategy;
    }
    if separable {
        ConvolutionStrategy::Separable
    } else if kernel_samples <= config.general_max_samples {
        ConvolutionStrategy::General
    } else {
        ConvolutionStrategy::Fourier
    }
}

/// Repeat a one-dimensional kernel as an outer product along `ndims` axes.
fn broadcast_kernel(kernel: &Image, ndims: usize) -> Result<Image, FilterError> {
    let len = kernel.num_samples();
    let sizes = vec![len; ndims];
    let weights = kernel.samples::<Complex64>()?;
    let mut coords = vec![0; ndims];
    let mut data = Vec::with_capacity(len.pow(ndims as u32));
    for _ in 0..len.pow(ndims as u32) {
        data.push(
            coords
                .iter()
                .fold(Complex64::new(1.0, 0.0), |acc, &c| acc * weights[c]),
        );
        increment_coords(&mut coords, &sizes);
    }
    let data = if kernel.is_complex() {
        ImageData::Complex(data)
    } else {
        ImageData::Real(data.iter().map(|v| v.re).collect())
    };
    Ok(Image::from_data(sizes, 1, data, kernel.data_type())?)
}

fn dense_kernel(
    kernel: &Image,
    broadcast: bool,
    ndims: usize,
) -> Result<Cow<'_, Image>, FilterError> {
    Ok(if broadcast {
        Cow::Owned(broadcast_kernel(kernel, ndims)?)
    } else {
        Cow::Borrowed(kernel)
    })
}

fn convolve_dense(
    src: &Image,
    kernel: &Image,
    boundary: &[BoundaryCondition],
    config: &ConvolutionConfig,
) -> Result<Image, FilterError> {
    let ndims = src.dimensionality();
    validate_dense_kernel(kernel, ndims)?;

    // a one-dimensional kernel applies along every axis
    let broadcast = kernel.dimensionality() == 1 && ndims > 1;
    let separated = separate_filter(kernel, config.separability_tolerance)?.map(|mut filters| {
        if !broadcast {
            filters.resize(ndims, OneDimensionalFilter::default());
        }
        filters
    });

    let strategy = select_strategy(kernel.num_samples(), separated.is_some(), config);
    log::debug!(
        "convolve: kernel {:?} on image {:?}, separable: {}, strategy: {:?}",
        kernel.sizes(),
        src.sizes(),
        separated.is_some(),
        strategy
    );

    match (strategy, separated) {
        (ConvolutionStrategy::Separable, Some(filters)) => {
            separable_convolution(src, &filters, boundary, None, config.execution)
        }
        (ConvolutionStrategy::Separable, None) => Err(FilterError::invalid_kernel(
            "separable strategy requested for a kernel that is not separable",
        )),
        (ConvolutionStrategy::General, _) => {
            let kernel = dense_kernel(kernel, broadcast, ndims)?;
            general_convolution(src, &kernel, boundary, config.execution)
        }
        (ConvolutionStrategy::Fourier, _) => {
            let kernel = dense_kernel(kernel, broadcast, ndims)?;
            convolve_ft(src, &kernel, boundary, &config.fourier, config.execution)
        }
    }
}

/// Convolve an image with a kernel, choosing the executor.
///
/// Per-axis and single filters always run through [`separable_convolution`]. A dense kernel is
/// first tested for separability. If it is separable it runs per axis as well, otherwise
/// through [`general_convolution`] for small kernels or [`convolve_ft()`] for large ones. All
/// executors give the same result up to rounding.
///
/// A dense kernel with one dimension is applied along every axis of the image. A dense kernel
/// with fewer dimensions than the image, but more than one, leaves the remaining axes
/// untouched.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `kernel` - The kernel specification.
/// * `config` - Boundary conditions, strategy thresholds and execution options.
///
/// # Errors
///
/// The kernel and the boundary conditions are validated before any pass runs.
pub fn convolve_with_config(
    src: &Image,
    kernel: &KernelSpec,
    config: &ConvolutionConfig,
) -> Result<Image, FilterError> {
    let ndims = src.dimensionality();
    let boundary = broadcast_boundary(&config.boundary, ndims)?;

    match kernel {
        KernelSpec::Dense(kernel) => convolve_dense(src, kernel, &boundary, config),
        KernelSpec::PerAxis(filters) => {
            if filters.len() != 1 && filters.len() != ndims {
                return Err(FilterError::dimensionality_mismatch(ndims, filters.len()));
            }
            log::debug!("convolve: {} per-axis filters", filters.len());
            separable_convolution(src, filters, &boundary, None, config.execution)
        }
        KernelSpec::Single(filter) => {
            log::debug!("convolve: one filter along all {ndims} axes");
            separable_convolution(
                src,
                std::slice::from_ref(filter),
                &boundary,
                None,
                config.execution,
            )
        }
    }
}

/// Convolve an image with a kernel using boundary condition names.
///
/// The names follow [`BoundaryCondition`]'s parser, e.g. `"mirror"`, `"periodic"` or
/// `"add zeros"`. An empty list uses the default symmetric mirror.
///
/// # Examples
///
/// ```
/// use dipconv_image::Image;
/// use dipconv_linear::{convolve, OneDimensionalFilter};
///
/// let image = Image::new(vec![4], vec![0.0, 1.0, 0.0, 0.0]).unwrap();
/// let kernel = OneDimensionalFilter::new(vec![1.0, 1.0, 1.0]);
/// let out = convolve(&image, kernel, &["add zeros"]).unwrap();
/// assert_eq!(out.as_real_slice(), Some(&[1.0, 1.0, 1.0, 0.0][..]));
/// ```
pub fn convolve(
    src: &Image,
    kernel: impl Into<KernelSpec>,
    boundary: &[&str],
) -> Result<Image, FilterError> {
    let config = ConvolutionConfig::default().with_boundary(parse_boundary_conditions(boundary)?);
    convolve_with_config(src, &kernel.into(), &config)
}

/// Blur an image with a box filter of `size` samples along every axis.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `size` - The size of the box along each axis.
/// * `boundary` - Boundary conditions.
pub fn box_blur(
    src: &Image,
    size: usize,
    boundary: &[BoundaryCondition],
) -> Result<Image, FilterError> {
    let filter = OneDimensionalFilter::new(kernels::box_kernel_1d(size));
    separable_convolution(src, &[filter], boundary, None, ExecutionStrategy::Auto)
}

/// Blur an image with a gaussian filter, truncated at three sigma.
///
/// A `sigma` that is not positive leaves the image unchanged.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `sigma` - The sigma of the gaussian along each axis.
/// * `boundary` - Boundary conditions.
pub fn gaussian_blur(
    src: &Image,
    sigma: f64,
    boundary: &[BoundaryCondition],
) -> Result<Image, FilterError> {
    let filter = kernels::gaussian_filter_1d(sigma, 3.0);
    separable_convolution(src, &[filter], boundary, None, ExecutionStrategy::Auto)
}
