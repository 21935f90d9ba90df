mod common;

use ndarray::Array2;
use superres_core::image_data::{vectorize, ImageData, ImageSize};
use superres_core::model::{
    convert_kernel_to_operator_matrix, AdditiveNoiseModule, BlurModule, DegradationOperator,
    DownsamplingModule, MotionModule,
};
use superres_core::motion::{MotionShift, MotionShiftSequence};

use common::*;

fn motion_module(shifts: &[(i32, i32)]) -> MotionModule {
    MotionModule::new(MotionShiftSequence::new(
        shifts.iter().map(|&(dx, dy)| MotionShift::new(dx, dy)).collect(),
    ))
}

/// Checks `<A x, y> == <x, A' y>` for one operator and frame.
fn assert_adjoint(op: &dyn DegradationOperator, x: &ImageData, y: &ImageData, index: usize) {
    let mut ax = x.clone();
    op.apply_to_image(&mut ax, index).unwrap();
    let mut aty = y.clone();
    op.apply_transpose_to_image(&mut aty, index).unwrap();

    let dot = |a: &ImageData, b: &ImageData| -> f64 {
        let (a, b) = (a.channel(0).unwrap(), b.channel(0).unwrap());
        a.iter().zip(b).map(|(p, q)| p * q).sum()
    };
    let lhs = dot(&ax, y);
    let rhs = dot(x, &aty);
    assert!((lhs - rhs).abs() < 1e-9, "adjoint mismatch: {lhs} vs {rhs}");
}

// ---------------------------------------------------------------------------
// Kernel to matrix
// ---------------------------------------------------------------------------

#[test]
fn test_kernel_to_operator_matrix() {
    let kernel = array_from_rows(&[&[-1.0, 0.0, 1.0], &[-2.0, 0.0, 2.0], &[-1.0, 0.0, 1.0]]);
    let matrix = convert_kernel_to_operator_matrix(&kernel, ImageSize::new(3, 2)).unwrap();

    let expected = array_from_rows(&[
        &[0.0, 2.0, 0.0, 0.0, 1.0, 0.0],
        &[-2.0, 0.0, 2.0, -1.0, 0.0, 1.0],
        &[0.0, -2.0, 0.0, 0.0, -1.0, 0.0],
        &[0.0, 1.0, 0.0, 0.0, 2.0, 0.0],
        &[-1.0, 0.0, 1.0, -2.0, 0.0, 2.0],
        &[0.0, -1.0, 0.0, 0.0, -2.0, 0.0],
    ]);
    assert_matrix_eq(&matrix, &expected, 0.0);

    let image = array_from_rows(&[&[1.0, 3.0, 5.0], &[9.0, 5.0, 2.0]]);
    let product = matrix.dot(&vectorize(&image));
    assert_vec_eq(
        product.as_slice().unwrap(),
        &[11.0, 1.0, -11.0, 13.0, -10.0, -13.0],
        1e-12,
    );
}

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

#[test]
fn test_motion_zero_shift_is_identity() {
    let module = motion_module(&[(0, 0)]);
    let matrix = module.operator_matrix(ImageSize::new(3, 3), 0).unwrap();
    assert_matrix_eq(&matrix, &Array2::eye(9), 0.0);
}

#[test]
fn test_motion_diagonal_shift_matrix() {
    let module = motion_module(&[(0, 0), (1, 1)]);
    let matrix = module.operator_matrix(ImageSize::new(3, 3), 1).unwrap();

    let mut expected = Array2::<f64>::zeros((9, 9));
    for &(dst, src) in &[(4, 0), (5, 1), (7, 3), (8, 4)] {
        expected[[dst, src]] = 1.0;
    }
    assert_matrix_eq(&matrix, &expected, 0.0);
}

#[test]
fn test_motion_left_shift_matrix() {
    let module = motion_module(&[(-1, 0)]);
    let matrix = module.operator_matrix(ImageSize::new(3, 3), 0).unwrap();

    let mut expected = Array2::<f64>::zeros((9, 9));
    for &(dst, src) in &[(0, 1), (1, 2), (3, 4), (4, 5), (6, 7), (7, 8)] {
        expected[[dst, src]] = 1.0;
    }
    assert_matrix_eq(&matrix, &expected, 0.0);
}

#[test]
fn test_motion_apply_matches_matrix() {
    let module = motion_module(&[(1, 1), (-1, 0)]);
    for index in 0..2 {
        let mut image = counting_image_3x3();
        let matrix = module.operator_matrix(image.size(), index).unwrap();
        let expected = matrix_times_image(&matrix, &image);
        module.apply_to_image(&mut image, index).unwrap();
        assert_vec_eq(
            image.channel_vector(0).unwrap().as_slice().unwrap(),
            expected.as_slice().unwrap(),
            0.0,
        );
    }
}

#[test]
fn test_motion_transpose_matches_matrix_transpose() {
    let module = motion_module(&[(1, 1)]);
    let mut image = counting_image_3x3();
    let matrix = module.operator_matrix(image.size(), 0).unwrap();
    let expected = matrix.t().dot(&image.channel_vector(0).unwrap());
    module.apply_transpose_to_image(&mut image, 0).unwrap();
    assert_vec_eq(
        image.channel_vector(0).unwrap().as_slice().unwrap(),
        expected.as_slice().unwrap(),
        0.0,
    );
}

#[test]
fn test_motion_index_out_of_range() {
    let module = motion_module(&[(0, 0)]);
    let mut image = counting_image_3x3();
    assert!(module.apply_to_image(&mut image, 1).is_err());
    assert!(module.operator_matrix(ImageSize::new(3, 3), 5).is_err());
}

// ---------------------------------------------------------------------------
// Blur
// ---------------------------------------------------------------------------

#[test]
fn test_blur_small_image() {
    let module = BlurModule::new(3, 0.849321).unwrap();
    let mut image = small_test_image();
    module.apply_to_image(&mut image, 0).unwrap();

    let expected = array_from_rows(&[
        &[1.875, 3.0, 3.125, 2.625, 2.75, 2.4375],
        &[4.5625, 6.25, 5.3125, 3.1875, 2.3125, 1.9375],
        &[5.0, 6.5, 5.75, 3.875, 1.9375, 0.9375],
        &[2.5625, 3.75, 4.3125, 3.6875, 1.6875, 0.5],
    ]);
    assert_matrix_eq(image.channel(0).unwrap(), &expected, 1e-3);
}

#[test]
fn test_blur_transpose_equals_forward() {
    let module = BlurModule::new(3, 1.3).unwrap();
    let mut forward = small_test_image();
    let mut transpose = small_test_image();
    module.apply_to_image(&mut forward, 0).unwrap();
    module.apply_transpose_to_image(&mut transpose, 0).unwrap();
    assert_eq!(forward, transpose);
}

#[test]
fn test_blur_matrix_matches_apply_and_is_symmetric() {
    let module = BlurModule::new(5, 1.0).unwrap();
    let image = small_test_image();
    let matrix = module.operator_matrix(image.size(), 0).unwrap();
    assert_matrix_eq(&matrix, &matrix.t().to_owned(), 1e-15);

    let expected = matrix_times_image(&matrix, &image);
    let mut blurred = image.clone();
    module.apply_to_image(&mut blurred, 0).unwrap();
    assert_vec_eq(
        blurred.channel_vector(0).unwrap().as_slice().unwrap(),
        expected.as_slice().unwrap(),
        1e-12,
    );
}

#[test]
fn test_asymmetric_kernel_adjoint() {
    let kernel = array_from_rows(&[&[0.0, 1.0, 2.0], &[0.5, 0.0, 0.0], &[0.0, 0.0, 3.0]]);
    let module = BlurModule::from_kernel(kernel).unwrap();
    let x = small_test_image();
    let y = ImageData::from_gray(Array2::from_shape_fn((4, 6), |(r, c)| {
        (r as f64) - 0.5 * c as f64
    }));
    assert_adjoint(&module, &x, &y, 0);
}

#[test]
fn test_blur_rejects_bad_parameters() {
    assert!(BlurModule::new(4, 1.0).is_err());
    assert!(BlurModule::new(0, 1.0).is_err());
    assert!(BlurModule::new(3, 0.0).is_err());
    assert!(BlurModule::new(3, f64::NAN).is_err());
}

// ---------------------------------------------------------------------------
// Downsampling
// ---------------------------------------------------------------------------

#[test]
fn test_downsampling_matrix() {
    let module = DownsamplingModule::new(2).unwrap();
    let matrix = module.operator_matrix(ImageSize::new(6, 4), 0).unwrap();
    assert_eq!(matrix.dim(), (6, 24));

    let mut expected = Array2::<f64>::zeros((6, 24));
    for (row, &col) in [0, 2, 4, 12, 14, 16].iter().enumerate() {
        expected[[row, col]] = 1.0;
    }
    assert_matrix_eq(&matrix, &expected, 0.0);
}

#[test]
fn test_downsampling_apply() {
    let module = DownsamplingModule::new(2).unwrap();
    let mut image = small_test_image();
    module.apply_to_image(&mut image, 0).unwrap();
    assert_eq!(image.size(), ImageSize::new(3, 2));
    assert_vec_eq(
        image.channel_vector(0).unwrap().as_slice().unwrap(),
        &[1.0, 3.0, 5.0, 9.0, 5.0, 2.0],
        0.0,
    );
}

#[test]
fn test_downsampling_transpose_upsamples() {
    let module = DownsamplingModule::new(2).unwrap();
    let mut image = small_test_image();
    let original = image.channel(0).unwrap().clone();
    module.apply_transpose_to_image(&mut image, 0).unwrap();
    assert_eq!(image.size(), ImageSize::new(12, 8));

    let up = image.channel(0).unwrap();
    for ((r, c), &v) in up.indexed_iter() {
        if r % 2 == 0 && c % 2 == 0 {
            assert_eq!(v, original[[r / 2, c / 2]]);
        } else {
            assert_eq!(v, 0.0, "odd position ({r}, {c}) should be zero");
        }
    }
}

#[test]
fn test_downsampling_adjoint() {
    let module = DownsamplingModule::new(2).unwrap();
    let x = small_test_image();
    let y = ImageData::from_gray(array_from_rows(&[&[1.0, -2.0, 0.5], &[3.0, 0.0, 4.0]]));
    assert_adjoint(&module, &x, &y, 0);
}

#[test]
fn test_downsampling_indivisible_size() {
    let module = DownsamplingModule::new(4).unwrap();
    let mut image = small_test_image();
    assert!(module.apply_to_image(&mut image, 0).is_err());
    assert!(module.output_size(ImageSize::new(6, 4)).is_err());
    assert!(DownsamplingModule::new(0).is_err());
}

// ---------------------------------------------------------------------------
// Additive noise
// ---------------------------------------------------------------------------

#[test]
fn test_noise_matrix_is_identity() {
    let module = AdditiveNoiseModule::new(0.1).unwrap();
    let matrix = module.operator_matrix(ImageSize::new(3, 2), 0).unwrap();
    assert_matrix_eq(&matrix, &Array2::eye(6), 0.0);
}

#[test]
fn test_noise_transpose_is_noop() {
    let module = AdditiveNoiseModule::new(0.5).unwrap();
    let mut image = small_test_image();
    module.apply_transpose_to_image(&mut image, 3).unwrap();
    assert_eq!(image, small_test_image());
}

#[test]
fn test_zero_sigma_noise_is_noop() {
    let module = AdditiveNoiseModule::new(0.0).unwrap();
    let mut image = small_test_image();
    module.apply_to_image(&mut image, 0).unwrap();
    assert_eq!(image, small_test_image());
}

#[test]
fn test_seeded_noise_is_reproducible_per_frame() {
    let module = AdditiveNoiseModule::with_seed(0.1, Some(42)).unwrap();
    let mut a = small_test_image();
    let mut b = small_test_image();
    let mut c = small_test_image();
    module.apply_to_image(&mut a, 0).unwrap();
    module.apply_to_image(&mut b, 0).unwrap();
    module.apply_to_image(&mut c, 1).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, small_test_image());
}

#[test]
fn test_noise_statistics() {
    let module = AdditiveNoiseModule::with_seed(0.2, Some(7)).unwrap();
    let mut image = ImageData::zeros(ImageSize::new(100, 100), 1);
    module.apply_to_image(&mut image, 0).unwrap();
    let values = image.channel(0).unwrap();
    let n = values.len() as f64;
    let mean = values.sum() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    assert!(mean.abs() < 0.01, "mean {mean}");
    assert!((var.sqrt() - 0.2).abs() < 0.01, "std {}", var.sqrt());
}

#[test]
fn test_negative_noise_sigma_rejected() {
    assert!(AdditiveNoiseModule::new(-0.1).is_err());
}
