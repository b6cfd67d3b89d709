use dipconv_image::{Complex64, Image, Sample};

use super::one_dimensional::{output_data_type, CompiledFilter, OneDimensionalFilter};
use crate::{
    boundary::{broadcast_boundary, fill_border, BoundaryCondition, BoundaryFill},
    error::FilterError,
    lines::LineLayout,
    parallel::{for_each_chunk_mut, ExecutionStrategy},
};

/// Filter every line along `axis` with a one-dimensional filter.
#[allow(clippy::too_many_arguments)]
fn filter_axis<T: Sample>(
    data: &[T],
    sizes: &[usize],
    tensor_elements: usize,
    axis: usize,
    filter: &CompiledFilter<T>,
    bc: BoundaryCondition,
    fill: BoundaryFill,
    strategy: ExecutionStrategy,
) -> Vec<T> {
    let layout = LineLayout::new(sizes, tensor_elements, axis);
    let len = layout.length;
    let (left, right) = filter.border();

    // filtered lines, one after the other
    let mut lines = vec![T::zero(); layout.count * len];
    for_each_chunk_mut(strategy, &mut lines, len, |line, out| {
        let mut buffer = vec![T::zero(); left + len + right];
        layout.gather(data, line, &mut buffer[left..left + len]);
        fill_border(&mut buffer, left, len, bc, fill);
        filter.apply_line(&buffer, out);
    });

    let mut result = vec![T::zero(); data.len()];
    layout.scatter_all(&lines, &mut result);
    result
}

fn filter_axes<T: Sample>(
    src: &Image,
    filters: &[OneDimensionalFilter],
    boundary: &[BoundaryCondition],
    process: &[bool],
    strategy: ExecutionStrategy,
) -> Result<Vec<T>, FilterError> {
    let compiled = filters
        .iter()
        .map(|f| f.compile::<T>())
        .collect::<Result<Vec<_>, _>>()?;
    let fill = BoundaryFill::for_data_type(src.data_type().suggest_flex());
    let mut data = src.samples::<T>()?.into_owned();

    for axis in 0..src.dimensionality() {
        let filter = &compiled[if compiled.len() == 1 { 0 } else { axis }];
        // singleton axes are filtered too, their border still enters the sum
        if !process[axis] || filter.is_identity() {
            log::trace!("separable convolution: axis {axis} skipped");
            continue;
        }
        log::trace!(
            "separable convolution: axis {axis}, border {:?}, {}",
            filter.border(),
            boundary[axis]
        );
        data = filter_axis(
            &data,
            src.sizes(),
            src.tensor_elements(),
            axis,
            filter,
            boundary[axis],
            fill,
            strategy,
        );
    }

    Ok(data)
}

/// Convolve an image with one filter per axis.
///
/// The axes are filtered in ascending order, each pass reading the output of the previous
/// one. An axis is left untouched when its filter is empty or the single weight `1`, or when
/// `process` excludes it. An axis of size 1 is still filtered, its border comes from the
/// boundary condition like any other line. Tensor images are filtered per tensor element.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `filters` - One filter per image axis, or a single filter for all axes.
/// * `boundary` - Boundary conditions, empty for the default, one for all axes, or one per axis.
/// * `process` - Optional mask of the axes to filter.
/// * `strategy` - How the lines of each pass are distributed over threads.
///
/// # Errors
///
/// Every argument is checked before the first pass. A filter or boundary list of the wrong
/// length gives [`FilterError::DimensionalityMismatch`], a malformed filter gives
/// [`FilterError::InvalidKernel`].
///
/// # Examples
///
/// ```
/// use dipconv_image::Image;
/// use dipconv_linear::{filter::separable_convolution, ExecutionStrategy, OneDimensionalFilter};
///
/// let image = Image::new(vec![5], vec![0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
/// let filter = OneDimensionalFilter::new(vec![1.0, 2.0, 3.0]);
/// let out = separable_convolution(&image, &[filter], &[], None, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(out.as_real_slice(), Some(&[0.0, 1.0, 2.0, 3.0, 0.0][..]));
/// ```
pub fn separable_convolution(
    src: &Image,
    filters: &[OneDimensionalFilter],
    boundary: &[BoundaryCondition],
    process: Option<&[bool]>,
    strategy: ExecutionStrategy,
) -> Result<Image, FilterError> {
    let ndims = src.dimensionality();
    if filters.len() != 1 && filters.len() != ndims {
        return Err(FilterError::dimensionality_mismatch(ndims, filters.len()));
    }
    let boundary = broadcast_boundary(boundary, ndims)?;
    let process = match process {
        None => vec![true; ndims],
        Some(p) if p.len() == ndims => p.to_vec(),
        Some(p) => return Err(FilterError::dimensionality_mismatch(ndims, p.len())),
    };

    let complex = src.is_complex() || filters.iter().any(|f| f.is_complex());
    let data = if complex {
        let out = strategy
            .run(|| filter_axes::<Complex64>(src, filters, &boundary, &process, strategy))??;
        Complex64::into_data(out)
    } else {
        let out =
            strategy.run(|| filter_axes::<f64>(src, filters, &boundary, &process, strategy))??;
        f64::into_data(out)
    };

    Ok(src.with_samples(data, output_data_type(src.data_type(), complex))?)
}
