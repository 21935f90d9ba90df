use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SuperResError};
use crate::motion::MotionShiftSequence;

use super::blur::BlurModule;
use super::downsampling::DownsamplingModule;
use super::image_model::ImageModel;
use super::motion::MotionModule;
use super::noise::AdditiveNoiseModule;

/// Parameters of the image formation model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DegradationConfig {
    /// Integer downsampling factor between the HR and LR grids.
    pub scale: usize,
    /// Odd Gaussian blur kernel size in pixels.
    pub blur_kernel_size: usize,
    /// Gaussian blur sigma in HR pixels. 0.0 = no blur stage.
    pub blur_sigma: f64,
    /// Standard deviation of additive noise. 0.0 = no noise stage.
    #[serde(default)]
    pub noise_sigma: f64,
    /// Seed for reproducible noise. `None` draws from the thread RNG.
    #[serde(default)]
    pub noise_seed: Option<u64>,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            blur_kernel_size: 3,
            blur_sigma: 1.0,
            noise_sigma: 0.0,
            noise_seed: None,
        }
    }
}

impl DegradationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 {
            return Err(SuperResError::Configuration(
                "scale must be at least 1".into(),
            ));
        }
        if self.blur_sigma > 0.0 && (self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0) {
            return Err(SuperResError::Configuration(format!(
                "blur kernel size must be odd and positive, got {}",
                self.blur_kernel_size
            )));
        }
        if self.blur_sigma < 0.0 || self.noise_sigma < 0.0 {
            return Err(SuperResError::Configuration(
                "sigma values must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Build the model Motion -> Blur -> Downsampling -> AdditiveNoise.
    /// Blur and noise stages are left out when their sigma is zero.
    pub fn build_model(&self, motion: MotionShiftSequence) -> Result<ImageModel> {
        self.validate()?;
        let mut model = ImageModel::new();
        model.add_degradation_operator(Box::new(MotionModule::new(motion)))?;
        if self.blur_sigma > 0.0 {
            model.add_degradation_operator(Box::new(BlurModule::new(
                self.blur_kernel_size,
                self.blur_sigma,
            )?))?;
        }
        model.add_degradation_operator(Box::new(DownsamplingModule::new(self.scale)?))?;
        if self.noise_sigma > 0.0 {
            model.add_degradation_operator(Box::new(AdditiveNoiseModule::with_seed(
                self.noise_sigma,
                self.noise_seed,
            )?))?;
        }
        info!(operators = ?model.operator_names(), "Built image model");
        Ok(model)
    }

    /// Same chain as [`build_model`](Self::build_model) without the noise
    /// stage. The solver differentiates through the model, so it must be
    /// deterministic and linear.
    pub fn build_reconstruction_model(&self, motion: MotionShiftSequence) -> Result<ImageModel> {
        Self {
            noise_sigma: 0.0,
            ..self.clone()
        }
        .build_model(motion)
    }
}
