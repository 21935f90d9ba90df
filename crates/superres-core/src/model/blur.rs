use ndarray::Array2;

use crate::error::{Result, SuperResError};
use crate::image_data::{ImageData, ImageSize};

use super::degradation::{
    check_kernel, convert_kernel_to_operator_matrix, correlate_zero_padded, flip_kernel,
    DegradationOperator, LinearOperatorMatrix,
};

/// Gaussian blur with a fixed odd-sized kernel and zero padding at borders.
///
/// The Gaussian kernel is symmetric, so the operator matrix is symmetric and
/// the transpose produces exactly the same output as the forward pass.
#[derive(Clone, Debug)]
pub struct BlurModule {
    kernel: Array2<f64>,
    flipped_kernel: Array2<f64>,
}

impl BlurModule {
    pub fn new(kernel_size: usize, sigma: f64) -> Result<Self> {
        if kernel_size == 0 || kernel_size % 2 == 0 {
            return Err(SuperResError::Configuration(format!(
                "blur kernel size must be odd and positive, got {kernel_size}"
            )));
        }
        if sigma <= 0.0 || !sigma.is_finite() {
            return Err(SuperResError::Configuration(format!(
                "blur sigma must be positive, got {sigma}"
            )));
        }
        let kernel = make_gaussian_kernel_2d(kernel_size, sigma);
        Self::from_kernel(kernel)
    }

    /// Blur with an arbitrary odd-sized kernel. The transpose correlates with
    /// the 180-degree rotated kernel.
    pub fn from_kernel(kernel: Array2<f64>) -> Result<Self> {
        check_kernel(&kernel)?;
        let flipped_kernel = flip_kernel(&kernel);
        Ok(Self {
            kernel,
            flipped_kernel,
        })
    }

    pub fn kernel(&self) -> &Array2<f64> {
        &self.kernel
    }
}

/// Normalized 1D Gaussian of `size` taps.
fn make_gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let radius = (size / 2) as f64;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - radius;
            (-x * x / s2).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Separable 2D Gaussian as the outer product of two 1D kernels.
pub fn make_gaussian_kernel_2d(size: usize, sigma: f64) -> Array2<f64> {
    let k = make_gaussian_kernel(size, sigma);
    Array2::from_shape_fn((size, size), |(i, j)| k[i] * k[j])
}

impl DegradationOperator for BlurModule {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn apply_to_image(&self, image: &mut ImageData, _index: usize) -> Result<()> {
        image.map_channels(|channel| Ok(correlate_zero_padded(channel, &self.kernel)))
    }

    fn apply_transpose_to_image(&self, image: &mut ImageData, _index: usize) -> Result<()> {
        image.map_channels(|channel| Ok(correlate_zero_padded(channel, &self.flipped_kernel)))
    }

    fn operator_matrix(
        &self,
        image_size: ImageSize,
        _index: usize,
    ) -> Result<LinearOperatorMatrix> {
        convert_kernel_to_operator_matrix(&self.kernel, image_size)
    }
}
