use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_IRLS_ITERATIONS, DEFAULT_REGULARIZATION_PARAMETER};

use super::minimizer::MinimizerConfig;

/// How the HR estimate is seeded before the first IRLS iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialEstimate {
    /// Pixel-replicated upscale of the first LR frame.
    #[default]
    Upsampled,
    /// Shift-and-add fusion of all LR frames with hole inpainting.
    ShiftAdd,
}

impl std::fmt::Display for InitialEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitialEstimate::Upsampled => write!(f, "Upsampled"),
            InitialEstimate::ShiftAdd => write!(f, "Shift-Add"),
        }
    }
}

/// Parameters of the MAP-IRLS reconstruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Weight of the regularization term (lambda). 0.0 disables it.
    pub regularization_parameter: f64,
    /// Number of outer IRLS reweighting iterations.
    pub irls_iterations: usize,
    #[serde(default)]
    pub initial_estimate: InitialEstimate,
    #[serde(default)]
    pub minimizer: MinimizerConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            regularization_parameter: DEFAULT_REGULARIZATION_PARAMETER,
            irls_iterations: DEFAULT_IRLS_ITERATIONS,
            initial_estimate: InitialEstimate::default(),
            minimizer: MinimizerConfig::default(),
        }
    }
}
