use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

use crate::error::{Result, SuperResError};
use crate::image_data::{ImageData, ImageSize};

use super::degradation::{DegradationOperator, LinearOperatorMatrix};

/// Zero-mean additive Gaussian noise.
///
/// The forward pass is the only non-deterministic stage of the model unless a
/// seed is given, in which case each frame index draws from its own seeded
/// stream. The transpose and the operator matrix are the identity.
#[derive(Clone, Debug)]
pub struct AdditiveNoiseModule {
    sigma: f64,
    seed: Option<u64>,
}

impl AdditiveNoiseModule {
    pub fn new(sigma: f64) -> Result<Self> {
        Self::with_seed(sigma, None)
    }

    pub fn with_seed(sigma: f64, seed: Option<u64>) -> Result<Self> {
        if sigma < 0.0 || !sigma.is_finite() {
            return Err(SuperResError::Configuration(format!(
                "noise sigma must be non-negative, got {sigma}"
            )));
        }
        Ok(Self { sigma, seed })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

fn add_noise<R: Rng>(data: &mut Array2<f64>, normal: Normal<f64>, rng: &mut R) {
    for v in data.iter_mut() {
        *v += rng.sample(normal);
    }
}

impl DegradationOperator for AdditiveNoiseModule {
    fn name(&self) -> &'static str {
        "additive-noise"
    }

    fn apply_to_image(&self, image: &mut ImageData, index: usize) -> Result<()> {
        if self.sigma == 0.0 {
            return Ok(());
        }
        let normal = Normal::new(0.0, self.sigma)
            .map_err(|e| SuperResError::Configuration(format!("noise distribution: {e}")))?;

        match self.seed {
            Some(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(index as u64));
                for c in 0..image.num_channels() {
                    add_noise(image.channel_mut(c)?, normal, &mut rng);
                }
            }
            None => {
                let mut rng = rand::rng();
                for c in 0..image.num_channels() {
                    add_noise(image.channel_mut(c)?, normal, &mut rng);
                }
            }
        }
        Ok(())
    }

    fn apply_transpose_to_image(&self, _image: &mut ImageData, _index: usize) -> Result<()> {
        Ok(())
    }

    fn operator_matrix(
        &self,
        image_size: ImageSize,
        _index: usize,
    ) -> Result<LinearOperatorMatrix> {
        Ok(Array2::eye(image_size.num_pixels()))
    }
}
