pub mod dual;
pub mod total_variation;

use crate::error::Result;
use crate::image_data::ImageSize;

pub use dual::{Dual, TvScalar};
pub use total_variation::TotalVariationRegularizer;

/// Prior term of the MAP objective, evaluated per HR pixel on one
/// row-major vectorized channel.
pub trait Regularizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Size of the HR images this regularizer was built for.
    fn image_size(&self) -> ImageSize;

    /// Penalty residual at every pixel.
    fn apply_to_image(&self, image: &[f64]) -> Result<Vec<f64>>;

    /// Gradient of `sum_j upstream[j] * residual_j(image)` with respect to
    /// every pixel. `upstream` must hold exactly one scalar per pixel; use 1
    /// for the plain derivative or 0 to drop a term.
    fn derivatives(&self, image: &[f64], upstream: &[f64]) -> Result<Vec<f64>>;

    /// Residuals and the same gradient as [`derivatives`](Self::derivatives),
    /// computed together by forward-mode automatic differentiation.
    fn apply_to_image_with_differentiation(
        &self,
        image: &[f64],
        upstream: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>)>;
}
