use ndarray::Array2;
use tracing::info;

use crate::error::{Result, SuperResError};
use crate::fusion::shift_add_fusion;
use crate::image_data::ImageData;
use crate::model::ImageModel;
use crate::motion::MotionShiftSequence;
use crate::regularize::TotalVariationRegularizer;

use super::config::{InitialEstimate, SolverConfig};
use super::irls_cost::IrlsCostProcessor;
use super::map_cost::MapCostFunction;
use super::minimizer::{ConjugateGradient, Minimizer};

/// Progress of a running reconstruction, reported after every outer IRLS
/// iteration.
#[derive(Clone, Debug)]
pub struct SolverProgress {
    pub channel: usize,
    pub num_channels: usize,
    pub irls_iteration: usize,
    pub irls_iterations: usize,
    pub cost: f64,
}

impl SolverProgress {
    /// Overall completion in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        let total = (self.num_channels * self.irls_iterations).max(1);
        let done = self.channel * self.irls_iterations + self.irls_iteration + 1;
        done as f64 / total as f64
    }
}

/// Maximum a posteriori super-resolution with a total variation prior,
/// solved by IRLS around a conjugate gradient minimizer.
pub struct MapSolver<'m> {
    image_model: &'m ImageModel,
    low_res_images: Vec<ImageData>,
    config: SolverConfig,
}

impl<'m> MapSolver<'m> {
    pub fn new(
        image_model: &'m ImageModel,
        low_res_images: Vec<ImageData>,
        config: SolverConfig,
    ) -> Result<Self> {
        if low_res_images.is_empty() {
            return Err(SuperResError::EmptySequence);
        }
        if config.irls_iterations == 0 {
            return Err(SuperResError::Configuration(
                "at least one IRLS iteration is required".into(),
            ));
        }
        Ok(Self {
            image_model,
            low_res_images,
            config,
        })
    }

    pub fn solve(&self, initial_estimate: &ImageData) -> Result<ImageData> {
        self.solve_with_progress(initial_estimate, |_| {})
    }

    /// Refine every channel of `initial_estimate` independently.
    pub fn solve_with_progress<F>(
        &self,
        initial_estimate: &ImageData,
        mut on_progress: F,
    ) -> Result<ImageData>
    where
        F: FnMut(&SolverProgress),
    {
        let image_size = initial_estimate.size();
        let mut processor = IrlsCostProcessor::new(
            &self.low_res_images,
            self.image_model,
            image_size,
            Box::new(TotalVariationRegularizer::new(image_size)),
            self.config.regularization_parameter,
        )?;
        let num_channels = processor.num_channels();
        if initial_estimate.num_channels() != num_channels {
            return Err(SuperResError::Configuration(format!(
                "initial estimate has {} channels, observations have {}",
                initial_estimate.num_channels(),
                num_channels
            )));
        }

        let minimizer = ConjugateGradient::new(self.config.minimizer.clone());
        let mut result = initial_estimate.clone();

        for channel in 0..num_channels {
            let mut estimate = initial_estimate.channel_vector(channel)?.to_vec();
            for irls_iteration in 0..self.config.irls_iterations {
                processor.update_irls_weights(channel, &estimate)?;
                let report = {
                    let cost_function = MapCostFunction::new(&processor, channel);
                    minimizer.minimize(&cost_function, &estimate)?
                };
                info!(
                    channel,
                    irls_iteration,
                    initial_cost = report.initial_cost,
                    final_cost = report.final_cost,
                    iterations = report.iterations,
                    converged = report.converged,
                    "IRLS iteration complete"
                );
                estimate = report.parameters;
                on_progress(&SolverProgress {
                    channel,
                    num_channels,
                    irls_iteration,
                    irls_iterations: self.config.irls_iterations,
                    cost: report.final_cost,
                });
            }
            result.set_channel_from_vector(channel, &estimate)?;
        }

        Ok(result)
    }
}

/// Seed the HR estimate from the LR observations.
pub fn build_initial_estimate(
    low_res_images: &[ImageData],
    motion: &MotionShiftSequence,
    scale: usize,
    strategy: InitialEstimate,
) -> Result<ImageData> {
    let first = low_res_images.first().ok_or(SuperResError::EmptySequence)?;
    if scale == 0 {
        return Err(SuperResError::Configuration(
            "scale must be at least 1".into(),
        ));
    }
    match strategy {
        InitialEstimate::Upsampled => {
            let channels = first
                .channels()
                .iter()
                .map(|lr| {
                    let (h, w) = lr.dim();
                    Array2::from_shape_fn((h * scale, w * scale), |(r, c)| {
                        lr[[r / scale, c / scale]]
                    })
                })
                .collect();
            ImageData::new(channels)
        }
        InitialEstimate::ShiftAdd => shift_add_fusion(low_res_images, motion, scale),
    }
}
