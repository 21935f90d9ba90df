#![allow(dead_code)]

use ndarray::{Array1, Array2};
use superres_core::image_data::{ImageData, ImageSize};

/// 4 rows by 6 columns, used across the operator tests.
pub fn small_test_image() -> ImageData {
    ImageData::from_gray(
        Array2::from_shape_vec(
            (4, 6),
            vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, //
                7.0, 8.0, 9.0, 0.0, 1.0, 2.0, //
                9.0, 7.0, 5.0, 4.0, 2.0, 1.0, //
                2.0, 4.0, 6.0, 8.0, 0.0, 1.0,
            ],
        )
        .unwrap(),
    )
}

/// 3x3 image with values 0..9 in row-major order.
pub fn counting_image_3x3() -> ImageData {
    ImageData::from_gray(Array2::from_shape_fn((3, 3), |(r, c)| (r * 3 + c) as f64))
}

pub fn array_from_rows(rows: &[&[f64]]) -> Array2<f64> {
    let ncols = rows[0].len();
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), ncols), flat).unwrap()
}

/// Smooth-ish deterministic image of the given size with values in [0, 1].
pub fn gradient_image(size: ImageSize) -> ImageData {
    let (h, w) = size.shape();
    ImageData::from_gray(Array2::from_shape_fn((h, w), |(r, c)| {
        let x = c as f64 / w.max(1) as f64;
        let y = r as f64 / h.max(1) as f64;
        0.2 + 0.5 * x * y + 0.2 * (3.0 * x).sin().abs()
    }))
}

pub fn assert_matrix_eq(actual: &Array2<f64>, expected: &Array2<f64>, tol: f64) {
    assert_eq!(actual.dim(), expected.dim(), "matrix shapes differ");
    for ((idx, a), e) in actual.indexed_iter().zip(expected.iter()) {
        assert!(
            (a - e).abs() <= tol,
            "mismatch at {:?}: got {}, expected {}",
            idx,
            a,
            e
        );
    }
}

pub fn assert_vec_eq(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len(), "lengths differ");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tol,
            "mismatch at {}: got {}, expected {}",
            i,
            a,
            e
        );
    }
}

/// `matrix . vec(image)` for a single-channel image.
pub fn matrix_times_image(matrix: &Array2<f64>, image: &ImageData) -> Array1<f64> {
    matrix.dot(&image.channel_vector(0).unwrap())
}
