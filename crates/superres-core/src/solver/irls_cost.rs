use rayon::prelude::*;
use tracing::{debug, info};

use crate::consts::{MIN_TOTAL_VARIATION, PARALLEL_FRAME_THRESHOLD};
use crate::error::{Result, SuperResError};
use crate::image_data::{vector_to_array, ImageData, ImageSize};
use crate::model::downsampling::{downsample_array, upsample_array};
use crate::model::ImageModel;
use crate::regularize::Regularizer;

/// MAP objective under the iteratively reweighted least squares scheme.
///
/// For one channel of the HR estimate `x` the objective is
///
/// ```text
/// f(x) = sum_k |U A_k x - U y_k|^2 + lambda * sum_i w_i * g_i(x)^2
/// ```
///
/// where `A_k` is the image model for frame `k`, `U` places LR samples on the
/// HR grid, `g` is the regularizer residual and `w` the IRLS weights. The
/// weights are replaced wholesale by [`update_irls_weights`](Self::update_irls_weights)
/// between outer iterations, which makes the weighted L2 prior approximate an
/// L1 penalty on `g`.
pub struct IrlsCostProcessor<'m> {
    /// LR observations with each channel spread onto the HR grid.
    observations: Vec<ImageData>,
    image_model: &'m ImageModel,
    image_size: ImageSize,
    upsampling_scale: usize,
    regularizer: Box<dyn Regularizer>,
    regularization_parameter: f64,
    /// Raw IRLS weights per channel, not scaled by lambda or square-rooted.
    irls_weights: Vec<Vec<f64>>,
}

impl<'m> IrlsCostProcessor<'m> {
    /// Copies the LR images and spreads them onto the HR grid of
    /// `image_size`. All weights start at 1.
    pub fn new(
        low_res_images: &[ImageData],
        image_model: &'m ImageModel,
        image_size: ImageSize,
        regularizer: Box<dyn Regularizer>,
        regularization_parameter: f64,
    ) -> Result<Self> {
        let first = low_res_images.first().ok_or(SuperResError::EmptySequence)?;
        if regularization_parameter < 0.0 || !regularization_parameter.is_finite() {
            return Err(SuperResError::Configuration(format!(
                "regularization parameter must be non-negative, got {regularization_parameter}"
            )));
        }
        if regularizer.image_size() != image_size {
            return Err(SuperResError::Configuration(format!(
                "regularizer built for {} but HR image is {}",
                regularizer.image_size(),
                image_size
            )));
        }

        let low_res_size = image_model.output_size(image_size)?;
        let num_channels = first.num_channels();
        for image in low_res_images {
            if image.size() != low_res_size {
                return Err(SuperResError::Configuration(format!(
                    "LR image is {} but the model produces {}",
                    image.size(),
                    low_res_size
                )));
            }
            if image.num_channels() != num_channels {
                return Err(SuperResError::Configuration(
                    "LR images have differing channel counts".into(),
                ));
            }
        }

        let upsampling_scale = grid_scale(image_size, low_res_size)?;
        let observations = low_res_images
            .iter()
            .map(|image| {
                let mut upsampled = image.clone();
                upsampled.map_channels(|c| Ok(upsample_array(c, upsampling_scale)))?;
                Ok(upsampled)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            frames = observations.len(),
            channels = num_channels,
            hr_size = %image_size,
            lr_size = %low_res_size,
            lambda = regularization_parameter,
            regularizer = regularizer.name(),
            "IRLS cost processor ready"
        );

        Ok(Self {
            observations,
            image_model,
            image_size,
            upsampling_scale,
            regularizer,
            regularization_parameter,
            irls_weights: vec![vec![1.0; image_size.num_pixels()]; num_channels],
        })
    }

    /// Pixel count of one HR channel.
    pub fn num_pixels(&self) -> usize {
        self.image_size.num_pixels()
    }

    pub fn num_channels(&self) -> usize {
        self.irls_weights.len()
    }

    pub fn num_images(&self) -> usize {
        self.observations.len()
    }

    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    pub fn regularization_parameter(&self) -> f64 {
        self.regularization_parameter
    }

    /// Current IRLS weights of `channel_index`.
    pub fn irls_weights(&self, channel_index: usize) -> Result<&[f64]> {
        self.weights_for(channel_index)
    }

    fn weights_for(&self, channel_index: usize) -> Result<&[f64]> {
        let total = self.irls_weights.len();
        self.irls_weights
            .get(channel_index)
            .map(Vec::as_slice)
            .ok_or(SuperResError::ChannelIndexOutOfRange {
                index: channel_index,
                total,
            })
    }

    fn check_estimate(&self, estimate: &[f64]) -> Result<()> {
        if estimate.len() != self.num_pixels() {
            return Err(SuperResError::SizeMismatch {
                expected: self.num_pixels(),
                actual: estimate.len(),
            });
        }
        Ok(())
    }

    /// Residual `U A x - U y` at every HR pixel for one LR frame and channel.
    pub fn compute_data_term_residuals(
        &self,
        image_index: usize,
        channel_index: usize,
        estimate: &[f64],
    ) -> Result<Vec<f64>> {
        self.check_estimate(estimate)?;
        let observation = self.observations.get(image_index).ok_or(
            SuperResError::FrameIndexOutOfRange {
                index: image_index,
                total: self.observations.len(),
            },
        )?;
        let observed = observation.channel(channel_index)?;

        let hr = ImageData::from_gray(vector_to_array(self.image_size, estimate)?);
        let degraded = self.image_model.apply_to_image(&hr, image_index)?;
        let upsampled = upsample_array(degraded.channel(0)?, self.upsampling_scale);
        if upsampled.dim() != observed.dim() {
            return Err(SuperResError::SizeMismatch {
                expected: observed.len(),
                actual: upsampled.len(),
            });
        }

        Ok(upsampled
            .iter()
            .zip(observed.iter())
            .map(|(&simulated, &actual)| simulated - actual)
            .collect())
    }

    /// Gradient of the squared data residuals, `2 A' U' r`.
    pub fn compute_data_term_derivatives(
        &self,
        image_index: usize,
        residuals: &[f64],
    ) -> Result<Vec<f64>> {
        let residual_image = vector_to_array(self.image_size, residuals)?;
        let low_res =
            ImageData::from_gray(downsample_array(&residual_image, self.upsampling_scale)?);
        let back_projected = self
            .image_model
            .apply_transpose_to_image(&low_res, image_index)?;
        if back_projected.size() != self.image_size {
            return Err(SuperResError::Configuration(format!(
                "model transpose produced {} instead of {}",
                back_projected.size(),
                self.image_size
            )));
        }
        Ok(back_projected.channel(0)?.iter().map(|&v| 2.0 * v).collect())
    }

    /// Regularization residuals `sqrt(lambda * w_i) * g_i(x)`, so that their
    /// squares sum to the weighted prior.
    pub fn compute_regularization_residuals(
        &self,
        channel_index: usize,
        estimate: &[f64],
    ) -> Result<Vec<f64>> {
        self.check_estimate(estimate)?;
        let weights = self.weights_for(channel_index)?;
        let residuals = self.regularizer.apply_to_image(estimate)?;
        Ok(residuals
            .iter()
            .zip(weights)
            .map(|(&g, &w)| (self.regularization_parameter * w).sqrt() * g)
            .collect())
    }

    /// Gradient of `lambda * sum_i w_i * g_i(x)^2`.
    pub fn compute_regularization_derivatives(
        &self,
        channel_index: usize,
        estimate: &[f64],
    ) -> Result<Vec<f64>> {
        self.check_estimate(estimate)?;
        let weights = self.weights_for(channel_index)?;
        let residuals = self.regularizer.apply_to_image(estimate)?;
        let upstream: Vec<f64> = residuals
            .iter()
            .zip(weights)
            .map(|(&g, &w)| 2.0 * self.regularization_parameter * w * g)
            .collect();
        self.regularizer.derivatives(estimate, &upstream)
    }

    /// Recompute the weights of `channel_index` as `1 / max(g_i(x), floor)`.
    ///
    /// The new vector replaces the old one in a single assignment; `&mut self`
    /// guarantees no objective evaluation is reading it at the same time.
    pub fn update_irls_weights(&mut self, channel_index: usize, estimate: &[f64]) -> Result<()> {
        self.check_estimate(estimate)?;
        self.weights_for(channel_index)?;
        let residuals = self.regularizer.apply_to_image(estimate)?;

        let mut weights = Vec::with_capacity(residuals.len());
        for (index, &g) in residuals.iter().enumerate() {
            // Only a NaN estimate can produce a NaN residual; +inf clamps below.
            if g.is_nan() {
                return Err(SuperResError::NonFinite {
                    context: "IRLS weight",
                    index,
                });
            }
            weights.push((1.0 / g.max(MIN_TOTAL_VARIATION)).max(f64::MIN_POSITIVE));
        }

        debug!(
            channel = channel_index,
            max_weight = weights.iter().cloned().fold(0.0, f64::max),
            "Updated IRLS weights"
        );
        self.irls_weights[channel_index] = weights;
        Ok(())
    }

    /// Value of the objective for one channel of the HR estimate.
    ///
    /// When `gradient` is given it is overwritten with the analytic gradient.
    /// Without it only the value is computed, for callers that differentiate
    /// numerically.
    pub fn compute_objective_function(
        &self,
        channel_index: usize,
        estimate: &[f64],
        gradient: Option<&mut [f64]>,
    ) -> Result<f64> {
        self.check_estimate(estimate)?;
        self.weights_for(channel_index)?;
        let want_gradient = gradient.is_some();

        let frame_term = |image_index: usize| -> Result<(f64, Option<Vec<f64>>)> {
            let residuals = self.compute_data_term_residuals(image_index, channel_index, estimate)?;
            let cost: f64 = residuals.iter().map(|r| r * r).sum();
            let derivatives = if want_gradient {
                Some(self.compute_data_term_derivatives(image_index, &residuals)?)
            } else {
                None
            };
            Ok((cost, derivatives))
        };

        // Collected in frame order and summed sequentially so the result does
        // not depend on the thread count.
        let frame_terms: Vec<(f64, Option<Vec<f64>>)> =
            if self.num_images() >= PARALLEL_FRAME_THRESHOLD {
                (0..self.num_images())
                    .into_par_iter()
                    .map(frame_term)
                    .collect::<Result<Vec<_>>>()?
            } else {
                (0..self.num_images())
                    .map(frame_term)
                    .collect::<Result<Vec<_>>>()?
            };

        let mut total_gradient = vec![0.0; self.num_pixels()];
        let mut objective = 0.0;
        for (cost, derivatives) in &frame_terms {
            objective += cost;
            if let Some(derivatives) = derivatives {
                for (acc, d) in total_gradient.iter_mut().zip(derivatives) {
                    *acc += d;
                }
            }
        }

        if self.regularization_parameter > 0.0 {
            let residuals = self.compute_regularization_residuals(channel_index, estimate)?;
            objective += residuals.iter().map(|r| r * r).sum::<f64>();
            if want_gradient {
                let derivatives = self.compute_regularization_derivatives(channel_index, estimate)?;
                for (acc, d) in total_gradient.iter_mut().zip(&derivatives) {
                    *acc += d;
                }
            }
        }

        if !objective.is_finite() {
            return Err(SuperResError::NonFinite {
                context: "objective value",
                index: channel_index,
            });
        }

        if let Some(gradient) = gradient {
            if gradient.len() != total_gradient.len() {
                return Err(SuperResError::SizeMismatch {
                    expected: total_gradient.len(),
                    actual: gradient.len(),
                });
            }
            if let Some(index) = total_gradient.iter().position(|g| !g.is_finite()) {
                return Err(SuperResError::NonFinite {
                    context: "objective gradient",
                    index,
                });
            }
            gradient.copy_from_slice(&total_gradient);
        }

        Ok(objective)
    }
}

/// Integer factor between the HR grid and the LR grid. Both axes must share
/// the same factor.
fn grid_scale(high_res: ImageSize, low_res: ImageSize) -> Result<usize> {
    if low_res.width == 0
        || low_res.height == 0
        || high_res.width % low_res.width != 0
        || high_res.height % low_res.height != 0
    {
        return Err(SuperResError::InvalidDimensions {
            width: low_res.width,
            height: low_res.height,
        });
    }
    let sx = high_res.width / low_res.width;
    let sy = high_res.height / low_res.height;
    if sx != sy {
        return Err(SuperResError::Configuration(format!(
            "HR {high_res} and LR {low_res} do not share one scale factor"
        )));
    }
    Ok(sx)
}
