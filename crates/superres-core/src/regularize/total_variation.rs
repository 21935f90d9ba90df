use crate::consts::MIN_TOTAL_VARIATION;
use crate::error::{Result, SuperResError};
use crate::image_data::ImageSize;

use super::dual::{Dual, TvScalar};
use super::Regularizer;

/// Isotropic total variation with forward differences.
///
/// The residual at `(r, c)` is `sqrt(dx^2 + dy^2)` where `dx` is the
/// difference to the pixel on the right and `dy` to the pixel below. A
/// missing neighbour at the border contributes zero for that direction.
#[derive(Clone, Debug)]
pub struct TotalVariationRegularizer {
    image_size: ImageSize,
}

impl TotalVariationRegularizer {
    pub fn new(image_size: ImageSize) -> Self {
        Self { image_size }
    }

    fn check_len(&self, len: usize) -> Result<()> {
        let expected = self.image_size.num_pixels();
        if len != expected {
            return Err(SuperResError::SizeMismatch {
                expected,
                actual: len,
            });
        }
        Ok(())
    }
}

/// `x[r, c+1] - x[r, c]`, or zero when `(r, c)` has no right neighbour or
/// lies outside the image.
fn x_gradient<T: TvScalar>(data: &[T], size: ImageSize, row: isize, col: isize) -> T {
    if row >= 0 && col >= 0 && (row as usize) < size.height && (col as usize) + 1 < size.width {
        let index = row as usize * size.width + col as usize;
        data[index + 1].clone() - data[index].clone()
    } else {
        T::zero()
    }
}

/// `x[r+1, c] - x[r, c]`, or zero when `(r, c)` has no lower neighbour or
/// lies outside the image.
fn y_gradient<T: TvScalar>(data: &[T], size: ImageSize, row: isize, col: isize) -> T {
    if row >= 0 && col >= 0 && (row as usize) + 1 < size.height && (col as usize) < size.width {
        let index = row as usize * size.width + col as usize;
        data[index + size.width].clone() - data[index].clone()
    } else {
        T::zero()
    }
}

fn total_variation_at<T: TvScalar>(data: &[T], size: ImageSize, row: usize, col: usize) -> T {
    let (r, c) = (row as isize, col as isize);
    let dy = y_gradient(data, size, r, c);
    let dx = x_gradient(data, size, r, c);
    T::gradient_magnitude(dx, dy, MIN_TOTAL_VARIATION)
}

impl Regularizer for TotalVariationRegularizer {
    fn name(&self) -> &'static str {
        "total-variation"
    }

    fn image_size(&self) -> ImageSize {
        self.image_size
    }

    fn apply_to_image(&self, image: &[f64]) -> Result<Vec<f64>> {
        self.check_len(image.len())?;
        let size = self.image_size;
        let mut residuals = Vec::with_capacity(size.num_pixels());
        for row in 0..size.height {
            for col in 0..size.width {
                residuals.push(total_variation_at(image, size, row, col));
            }
        }
        Ok(residuals)
    }

    fn derivatives(&self, image: &[f64], upstream: &[f64]) -> Result<Vec<f64>> {
        self.check_len(image.len())?;
        self.check_len(upstream.len())?;
        let size = self.image_size;
        let w = size.width;

        let tv_floored: Vec<f64> = self
            .apply_to_image(image)?
            .into_iter()
            .map(|tv| tv.max(MIN_TOTAL_VARIATION))
            .collect();

        let mut derivatives = vec![0.0; size.num_pixels()];
        for row in 0..size.height {
            for col in 0..w {
                let (r, c) = (row as isize, col as isize);
                let index = row * w + col;

                // Own term: d/dx_{r,c} sqrt(dx^2 + dy^2) = -(dx + dy) / tv
                let own = -(x_gradient(image, size, r, c) + y_gradient(image, size, r, c))
                    / tv_floored[index];
                let mut derivative = upstream[index] * own;

                // Left neighbour's term, where this pixel is the right sample.
                if col > 0 {
                    let left = index - 1;
                    derivative +=
                        upstream[left] * x_gradient(image, size, r, c - 1) / tv_floored[left];
                }

                // Upper neighbour's term, where this pixel is the lower sample.
                if row > 0 {
                    let above = index - w;
                    derivative +=
                        upstream[above] * y_gradient(image, size, r - 1, c) / tv_floored[above];
                }

                derivatives[index] = derivative;
            }
        }
        Ok(derivatives)
    }

    fn apply_to_image_with_differentiation(
        &self,
        image: &[f64],
        upstream: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        self.check_len(image.len())?;
        self.check_len(upstream.len())?;
        let size = self.image_size;
        let parameters: Vec<Dual> = image
            .iter()
            .enumerate()
            .map(|(i, &v)| Dual::variable(v, i))
            .collect();

        let mut residuals = Vec::with_capacity(size.num_pixels());
        let mut derivatives = vec![0.0; size.num_pixels()];
        for row in 0..size.height {
            for col in 0..size.width {
                let index = row * size.width + col;
                let residual = total_variation_at(&parameters, size, row, col);
                for &(pixel, partial) in residual.partials() {
                    if !partial.is_finite() {
                        return Err(SuperResError::NonFinite {
                            context: "total variation partial derivative",
                            index: pixel,
                        });
                    }
                    derivatives[pixel] += upstream[index] * partial;
                }
                residuals.push(residual.value());
            }
        }
        Ok((residuals, derivatives))
    }
}
