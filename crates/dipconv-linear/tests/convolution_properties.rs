use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};

use dipconv_image::{Complex64, Image};
use dipconv_linear::{
    convolve_with_config,
    filter::{
        convolve_ft, general_convolution, kernels, separable_convolution, separate_filter,
        FilterWeights, SEPARABILITY_TOLERANCE,
    },
    fourier_transform, BoundaryCondition, ConvolutionConfig, ConvolutionStrategy,
    ExecutionStrategy, FilterError, FourierNormalization, FourierOptions, KernelSpec,
    OneDimensionalFilter, Symmetry,
};

fn random_image(rng: &mut StdRng, sizes: Vec<usize>) -> Result<Image, FilterError> {
    let n = sizes.iter().product();
    let data = (0..n).map(|_| rng.random_range(-1.0..1.0)).collect();
    Ok(Image::new(sizes, data)?)
}

fn random_vector(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.random_range(0.5..2.0)).collect()
}

fn assert_images_close(a: &Image, b: &Image, tolerance: f64) {
    assert_eq!(a.sizes(), b.sizes());
    assert_eq!(a.is_complex(), b.is_complex());
    for i in 0..a.num_samples() {
        let x = a.data().get(i).unwrap_or_default();
        let y = b.data().get(i).unwrap_or_default();
        assert_relative_eq!(x.re, y.re, epsilon = 1e-9, max_relative = tolerance);
        assert_relative_eq!(x.im, y.im, epsilon = 1e-9, max_relative = tolerance);
    }
}

fn real_weights(filter: &OneDimensionalFilter) -> Vec<f64> {
    match filter.expanded() {
        FilterWeights::Real(w) => w,
        FilterWeights::Complex(w) => w.iter().map(|v| v.re).collect(),
    }
}

#[test]
fn separability_round_trip() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(1);
    let (a, b, c) = (
        random_vector(&mut rng, 3),
        random_vector(&mut rng, 5),
        random_vector(&mut rng, 4),
    );
    let kernel = kernels::outer_product(&[&a, &b, &c])?;

    let filters = separate_filter(&kernel, SEPARABILITY_TOLERANCE)?
        .ok_or_else(|| FilterError::invalid_kernel("outer product not separable"))?;
    assert_eq!(filters.len(), 3);
    let weights: Vec<Vec<f64>> = filters.iter().map(real_weights).collect();
    let sizes: Vec<usize> = weights.iter().map(|w| w.len()).collect();
    assert_eq!(sizes, vec![3, 5, 4]);

    let refs: Vec<&[f64]> = weights.iter().map(|w| w.as_slice()).collect();
    let recomposed = kernels::outer_product(&refs)?;
    assert_images_close(&recomposed, &kernel, 1e-9);

    let generic = random_image(&mut rng, vec![3, 3])?;
    assert!(separate_filter(&generic, SEPARABILITY_TOLERANCE)?.is_none());
    Ok(())
}

#[test]
fn general_and_fourier_agree() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(2);
    let image = random_image(&mut rng, vec![21, 17])?;
    let kernel = random_image(&mut rng, vec![4, 3])?;
    assert!(separate_filter(&kernel, SEPARABILITY_TOLERANCE)?.is_none());

    for bc in [
        BoundaryCondition::SymmetricMirror,
        BoundaryCondition::AsymmetricPeriodic,
        BoundaryCondition::ZeroOrderExtrapolate,
        BoundaryCondition::AddZeros,
    ] {
        let config = ConvolutionConfig::default().with_boundary(vec![bc]);
        let general = convolve_with_config(
            &image,
            &KernelSpec::Dense(kernel.clone()),
            &config.clone().with_strategy(ConvolutionStrategy::General),
        )?;
        let fourier = convolve_with_config(
            &image,
            &KernelSpec::Dense(kernel.clone()),
            &config.with_strategy(ConvolutionStrategy::Fourier),
        )?;
        assert_images_close(&general, &fourier, 1e-6);
    }
    Ok(())
}

#[test]
fn identity_kernel_returns_input() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(3);
    let image = random_image(&mut rng, vec![6, 7, 2])?;

    let per_axis = KernelSpec::PerAxis(vec![OneDimensionalFilter::new(vec![1.0]); 3]);
    let out = convolve_with_config(&image, &per_axis, &ConvolutionConfig::default())?;
    assert_eq!(out.as_real_slice(), image.as_real_slice());

    let dense = KernelSpec::Dense(Image::new(vec![1, 1, 1], vec![1.0])?);
    for strategy in [
        ConvolutionStrategy::Separable,
        ConvolutionStrategy::General,
        ConvolutionStrategy::Fourier,
    ] {
        let config = ConvolutionConfig::default().with_strategy(strategy);
        let out = convolve_with_config(&image, &dense, &config)?;
        assert_images_close(&out, &image, 1e-9);
    }
    Ok(())
}

#[test]
fn boundary_conditions_only_affect_the_border() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(4);
    let (rows, cols) = (12, 15);
    let image = random_image(&mut rng, vec![rows, cols])?;
    let g = kernels::gaussian_kernel_1d(5, 1.0);
    let kernel = KernelSpec::Dense(kernels::outer_product(&[&g, &g])?);

    let mirror = convolve_with_config(
        &image,
        &kernel,
        &ConvolutionConfig::default().with_boundary(vec![BoundaryCondition::SymmetricMirror]),
    )?;
    let zeros = convolve_with_config(
        &image,
        &kernel,
        &ConvolutionConfig::default().with_boundary(vec![BoundaryCondition::AddZeros]),
    )?;

    let half = 2;
    let mut border_differs = false;
    for i in 0..rows {
        for j in 0..cols {
            let (a, b) = (mirror.get(&[i, j], 0)?.re, zeros.get(&[i, j], 0)?.re);
            let interior = (half..rows - half).contains(&i) && (half..cols - half).contains(&j);
            if interior {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            } else if (a - b).abs() > 1e-9 {
                border_differs = true;
            }
        }
    }
    assert!(border_differs);
    Ok(())
}

#[test]
fn separable_matches_general_on_gaussian() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(5);
    let image = random_image(&mut rng, vec![64, 64])?;
    let g = kernels::gaussian_kernel_1d(5, 1.2);
    let kernel = KernelSpec::Dense(kernels::outer_product(&[&g, &g])?);

    let separable = convolve_with_config(&image, &kernel, &ConvolutionConfig::default())?;
    let general = convolve_with_config(
        &image,
        &kernel,
        &ConvolutionConfig::default().with_strategy(ConvolutionStrategy::General),
    )?;
    assert_images_close(&separable, &general, 1e-9);
    Ok(())
}

#[test]
fn single_filter_broadcasts_over_dimensions() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(6);
    let image = random_image(&mut rng, vec![5, 6, 7])?;
    let filter = OneDimensionalFilter::new(vec![1.0, -2.0, 0.5, 3.0]);
    let config = ConvolutionConfig::default().with_boundary(vec![BoundaryCondition::Periodic]);

    let single = convolve_with_config(&image, &KernelSpec::Single(filter.clone()), &config)?;
    let listed = convolve_with_config(&image, &KernelSpec::PerAxis(vec![filter; 3]), &config)?;
    assert_eq!(single, listed);
    Ok(())
}

#[test]
fn filter_count_must_match_dimensionality() -> Result<(), FilterError> {
    let image = Image::from_size_val(vec![4, 4, 4], 1.0)?;
    let filters = vec![OneDimensionalFilter::new(vec![1.0, 1.0]); 2];
    let result = convolve_with_config(
        &image,
        &KernelSpec::PerAxis(filters),
        &ConvolutionConfig::default(),
    );
    assert!(matches!(
        result,
        Err(FilterError::DimensionalityMismatch { .. })
    ));
    Ok(())
}

#[test]
fn skipped_axes_are_not_mixed() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(8);
    let sizes = [3, 9, 4];
    let image = random_image(&mut rng, sizes.to_vec())?;
    let filter = OneDimensionalFilter::new(vec![0.25, 0.5, 0.25]);
    let filters = vec![filter.clone(); 3];
    let bcs = [BoundaryCondition::AsymmetricMirror];

    let out = separable_convolution(
        &image,
        &filters,
        &bcs,
        Some(&[false, true, false][..]),
        ExecutionStrategy::Serial,
    )?;

    // every line along axis 1 is filtered on its own
    for a in 0..sizes[0] {
        for c in 0..sizes[2] {
            let line: Vec<f64> = (0..sizes[1])
                .map(|b| image.get(&[a, b, c], 0).map(|v| v.re))
                .collect::<Result<_, _>>()?;
            let expected = separable_convolution(
                &Image::new(vec![sizes[1]], line)?,
                &[filter.clone()],
                &bcs,
                None,
                ExecutionStrategy::Serial,
            )?;
            for b in 0..sizes[1] {
                assert_relative_eq!(
                    out.get(&[a, b, c], 0)?.re,
                    expected.get(&[b], 0)?.re,
                    epsilon = 1e-12
                );
            }
        }
    }
    Ok(())
}

#[test]
fn symmetric_filters_match_expanded_form() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(9);
    let image = random_image(&mut rng, vec![11, 8])?;
    let half = vec![0.5, -1.0, 2.0];

    for symmetry in [
        Symmetry::Even,
        Symmetry::Odd,
        Symmetry::DEven,
        Symmetry::DOdd,
    ] {
        let compact = OneDimensionalFilter::new(half.clone()).with_symmetry(symmetry);
        let full = OneDimensionalFilter::from_weights(compact.expanded());
        assert_eq!(full.size(), compact.size());

        for bc in [
            BoundaryCondition::SymmetricMirror,
            BoundaryCondition::SecondOrderExtrapolate,
        ] {
            let a = separable_convolution(
                &image,
                &[compact.clone()],
                &[bc],
                None,
                ExecutionStrategy::Serial,
            )?;
            let b = separable_convolution(
                &image,
                &[full.clone()],
                &[bc],
                None,
                ExecutionStrategy::Serial,
            )?;
            assert_images_close(&a, &b, 1e-12);
        }
    }
    Ok(())
}

#[test]
fn fourier_round_trip() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(10);
    let data: Vec<Complex64> = (0..6 * 10)
        .map(|_| Complex64::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)))
        .collect();
    let image = Image::new_complex(vec![6, 10], data)?;

    for normalization in [
        FourierNormalization::Inverse,
        FourierNormalization::Symmetric,
        FourierNormalization::Forward,
    ] {
        let options = FourierOptions {
            normalization,
            ..Default::default()
        };
        let forward = fourier_transform(&image, false, &options, ExecutionStrategy::Serial)?;
        let back = fourier_transform(&forward, true, &options, ExecutionStrategy::Parallel)?;
        assert_images_close(&back, &image, 1e-9);
    }
    Ok(())
}

#[test]
fn fourier_convolution_ignores_normalization() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(11);
    let image = random_image(&mut rng, vec![13, 9])?;
    let kernel = random_image(&mut rng, vec![5, 5])?;
    let bcs = [BoundaryCondition::Periodic];

    let reference = convolve_ft(
        &image,
        &kernel,
        &bcs,
        &FourierOptions::default(),
        ExecutionStrategy::Serial,
    )?;
    for normalization in [FourierNormalization::Symmetric, FourierNormalization::Forward] {
        for fast_sizes in [false, true] {
            let options = FourierOptions {
                normalization,
                fast_sizes,
            };
            let out = convolve_ft(&image, &kernel, &bcs, &options, ExecutionStrategy::Serial)?;
            assert_images_close(&out, &reference, 1e-9);
        }
    }

    let direct = general_convolution(&image, &kernel, &bcs, ExecutionStrategy::Serial)?;
    assert_images_close(&reference, &direct, 1e-6);
    Ok(())
}

#[test]
fn kernel_larger_than_image_along_an_axis() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(12);
    let (rows, cols) = (6, 20);
    let image = random_image(&mut rng, vec![rows, cols])?;
    let (a, b) = (random_vector(&mut rng, 9), random_vector(&mut rng, 3));
    let kernel = KernelSpec::Dense(kernels::outer_product(&[&a, &b])?);

    for bc in [
        BoundaryCondition::SymmetricMirror,
        BoundaryCondition::Periodic,
        BoundaryCondition::AsymmetricMirror,
        BoundaryCondition::ZeroOrderExtrapolate,
        BoundaryCondition::AddZeros,
    ] {
        let config = ConvolutionConfig::default().with_boundary(vec![bc]);
        let outputs = [
            ConvolutionStrategy::Separable,
            ConvolutionStrategy::General,
            ConvolutionStrategy::Fourier,
        ]
        .map(|strategy| {
            convolve_with_config(&image, &kernel, &config.clone().with_strategy(strategy))
        });
        let [separable, general, fourier] = outputs;
        let (separable, general, fourier) = (separable?, general?, fourier?);
        assert!(general
            .as_real_slice()
            .unwrap_or_default()
            .iter()
            .all(|v| v.is_finite()));
        assert_images_close(&separable, &general, 1e-9);
        assert_images_close(&fourier, &general, 1e-6);
    }

    // every row touches the border along axis 0, so only axis 1 may vary
    let mirror = convolve_with_config(
        &image,
        &kernel,
        &ConvolutionConfig::default().with_boundary(vec![BoundaryCondition::SymmetricMirror]),
    )?;
    let zeros_along_columns = convolve_with_config(
        &image,
        &kernel,
        &ConvolutionConfig::default().with_boundary(vec![
            BoundaryCondition::SymmetricMirror,
            BoundaryCondition::AddZeros,
        ]),
    )?;
    let mut border_differs = false;
    for i in 0..rows {
        for j in 0..cols {
            let x = mirror.get(&[i, j], 0)?.re;
            let y = zeros_along_columns.get(&[i, j], 0)?.re;
            if (1..cols - 1).contains(&j) {
                assert_relative_eq!(x, y, epsilon = 1e-9);
            } else if (x - y).abs() > 1e-9 {
                border_differs = true;
            }
        }
    }
    assert!(border_differs);
    Ok(())
}

#[test]
fn singleton_axis_matches_general() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(13);
    let image = random_image(&mut rng, vec![1, 9])?;
    let (a, b) = (random_vector(&mut rng, 3), random_vector(&mut rng, 3));
    let kernel = KernelSpec::Dense(kernels::outer_product(&[&a, &b])?);

    for bc in [
        BoundaryCondition::SymmetricMirror,
        BoundaryCondition::AddZeros,
        BoundaryCondition::Periodic,
        BoundaryCondition::FirstOrderExtrapolate,
    ] {
        let config = ConvolutionConfig::default().with_boundary(vec![bc]);
        let separable = convolve_with_config(
            &image,
            &kernel,
            &config.clone().with_strategy(ConvolutionStrategy::Separable),
        )?;
        let general = convolve_with_config(
            &image,
            &kernel,
            &config.with_strategy(ConvolutionStrategy::General),
        )?;
        assert_images_close(&separable, &general, 1e-9);
    }

    let ramp = Image::new(vec![1, 5], vec![1.0, 2.0, 3.0, 4.0, 5.0])?;
    let scale = KernelSpec::Dense(Image::new(vec![1, 1], vec![2.0])?);
    let out = convolve_with_config(&ramp, &scale, &ConvolutionConfig::default())?;
    assert_images_close(
        &out,
        &Image::new(vec![1, 5], vec![2.0, 4.0, 6.0, 8.0, 10.0])?,
        1e-9,
    );

    let pixel = Image::new(vec![1, 1], vec![7.0])?;
    let zero = KernelSpec::Dense(Image::new(vec![1, 1], vec![0.0])?);
    let out = convolve_with_config(&pixel, &zero, &ConvolutionConfig::default())?;
    assert_eq!(out.as_real_slice(), Some(&[0.0][..]));
    Ok(())
}

#[test]
fn extreme_fill_leaves_interior_unchanged() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(14);
    let image = random_image(&mut rng, vec![20, 20])?;
    let kernel = random_image(&mut rng, vec![8, 8])?;
    assert!(separate_filter(&kernel, SEPARABILITY_TOLERANCE)?.is_none());
    let spec = KernelSpec::Dense(kernel.clone());

    let mirror = convolve_with_config(&image, &spec, &ConvolutionConfig::default())?;
    for bc in [BoundaryCondition::AddMaxValue, BoundaryCondition::AddMinValue] {
        let config = ConvolutionConfig::default().with_boundary(vec![bc]);
        let auto = convolve_with_config(&image, &spec, &config)?;
        let fourier = convolve_ft(
            &image,
            &kernel,
            &[bc],
            &FourierOptions::default(),
            ExecutionStrategy::Serial,
        )?;
        let general = general_convolution(&image, &kernel, &[bc], ExecutionStrategy::Serial)?;

        // the 8x8 footprint reaches 3 samples back and 4 forward
        for i in 3..=15 {
            for j in 3..=15 {
                let expected = mirror.get(&[i, j], 0)?.re;
                for out in [&auto, &fourier, &general] {
                    let v = out.get(&[i, j], 0)?.re;
                    assert!(v.is_finite());
                    assert_relative_eq!(v, expected, epsilon = 1e-9, max_relative = 1e-6);
                }
            }
        }
    }
    Ok(())
}
