pub mod config;
pub mod fuse;
pub mod simulate;
pub mod solve;

use clap::Args;
use superres_core::model::DegradationConfig;

/// Image formation flags shared by `simulate` and `solve`. Unset flags keep
/// the value of the config they are applied to.
#[derive(Args, Clone, Debug)]
pub struct DegradationArgs {
    /// Integer downsampling factor [default: 2]
    #[arg(long)]
    pub scale: Option<usize>,

    /// Odd Gaussian blur kernel size [default: 3]
    #[arg(long)]
    pub blur_size: Option<usize>,

    /// Gaussian blur sigma in HR pixels, 0 disables blur [default: 1.0]
    #[arg(long)]
    pub blur_sigma: Option<f64>,
}

impl DegradationArgs {
    pub fn to_config(&self) -> DegradationConfig {
        let mut config = DegradationConfig::default();
        self.apply_to(&mut config);
        config
    }

    pub fn apply_to(&self, config: &mut DegradationConfig) {
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some(size) = self.blur_size {
            config.blur_kernel_size = size;
        }
        if let Some(sigma) = self.blur_sigma {
            config.blur_sigma = sigma;
        }
    }
}
