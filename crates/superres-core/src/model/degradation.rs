use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, SuperResError};
use crate::image_data::{ImageData, ImageSize};

/// Dense `(output_pixels, input_pixels)` matrix acting on a row-major
/// vectorized image.
pub type LinearOperatorMatrix = Array2<f64>;

/// One linear stage of the image formation model.
///
/// Operators hold configuration only. The frame `index` selects per-frame
/// parameters such as the motion shift. For every operator,
/// `operator_matrix(size, i) . vec(x) == vec(apply_to_image(x, i))` and the
/// matrix transpose matches `apply_transpose_to_image`.
pub trait DegradationOperator: Send + Sync {
    /// Short human-readable name used in logs.
    fn name(&self) -> &'static str;

    /// Degrade `image` in place for frame `index`. May change the image size.
    fn apply_to_image(&self, image: &mut ImageData, index: usize) -> Result<()>;

    /// Apply the adjoint of [`apply_to_image`](Self::apply_to_image) in place.
    fn apply_transpose_to_image(&self, image: &mut ImageData, index: usize) -> Result<()>;

    /// Materialize the operator for an input image of `image_size`.
    fn operator_matrix(&self, image_size: ImageSize, index: usize)
        -> Result<LinearOperatorMatrix>;

    /// Size of the forward output for an input of `input` size.
    fn output_size(&self, input: ImageSize) -> Result<ImageSize> {
        Ok(input)
    }
}

/// Build the dense matrix of a zero-padded 2D correlation with `kernel` over
/// an image of `image_size`.
///
/// Row `r*w + c` holds the kernel weights placed around pixel `(r, c)`;
/// weights that fall outside the image are dropped.
pub fn convert_kernel_to_operator_matrix(
    kernel: &Array2<f64>,
    image_size: ImageSize,
) -> Result<LinearOperatorMatrix> {
    check_kernel(kernel)?;
    let (h, w) = image_size.shape();
    let (kh, kw) = kernel.dim();
    let (ry, rx) = ((kh / 2) as isize, (kw / 2) as isize);

    let n = image_size.num_pixels();
    let mut matrix = Array2::<f64>::zeros((n, n));
    for row in 0..h {
        for col in 0..w {
            let out_index = row * w + col;
            for ((ki, kj), &kv) in kernel.indexed_iter() {
                let src_row = row as isize + ki as isize - ry;
                let src_col = col as isize + kj as isize - rx;
                if src_row < 0 || src_col < 0 || src_row >= h as isize || src_col >= w as isize {
                    continue;
                }
                let in_index = src_row as usize * w + src_col as usize;
                matrix[[out_index, in_index]] = kv;
            }
        }
    }
    Ok(matrix)
}

/// Zero-padded 2D correlation, the algorithmic counterpart of
/// [`convert_kernel_to_operator_matrix`].
pub fn correlate_zero_padded(data: &Array2<f64>, kernel: &Array2<f64>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut result = Array2::<f64>::zeros((h, w));

    let fill_row = |row: usize, out_row: &mut [f64]| {
        let (kh, kw) = kernel.dim();
        let (ry, rx) = ((kh / 2) as isize, (kw / 2) as isize);
        for (col, out) in out_row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for ki in 0..kh {
                let src_row = row as isize + ki as isize - ry;
                if src_row < 0 || src_row >= h as isize {
                    continue;
                }
                for kj in 0..kw {
                    let src_col = col as isize + kj as isize - rx;
                    if src_col < 0 || src_col >= w as isize {
                        continue;
                    }
                    sum += kernel[[ki, kj]] * data[[src_row as usize, src_col as usize]];
                }
            }
            *out = sum;
        }
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut out_row)| {
                if let Some(slice) = out_row.as_slice_mut() {
                    fill_row(row, slice);
                }
            });
    } else {
        for (row, mut out_row) in result.axis_iter_mut(Axis(0)).enumerate() {
            if let Some(slice) = out_row.as_slice_mut() {
                fill_row(row, slice);
            }
        }
    }

    result
}

/// Kernel rotated by 180 degrees; correlating with it is the transpose of
/// correlating with `kernel`.
pub fn flip_kernel(kernel: &Array2<f64>) -> Array2<f64> {
    let (kh, kw) = kernel.dim();
    Array2::from_shape_fn((kh, kw), |(i, j)| kernel[[kh - 1 - i, kw - 1 - j]])
}

pub(crate) fn check_kernel(kernel: &Array2<f64>) -> Result<()> {
    let (kh, kw) = kernel.dim();
    if kh == 0 || kw == 0 || kh % 2 == 0 || kw % 2 == 0 {
        return Err(SuperResError::Configuration(format!(
            "kernel dimensions must be odd and non-zero, got {kh}x{kw}"
        )));
    }
    Ok(())
}
