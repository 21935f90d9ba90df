use crate::error::Result;

use super::irls_cost::IrlsCostProcessor;
use super::minimizer::ObjectiveFunction;

/// The MAP-IRLS objective of one channel, exposed to a minimizer as a
/// function of the flattened HR pixel values.
pub struct MapCostFunction<'p, 'm> {
    processor: &'p IrlsCostProcessor<'m>,
    channel_index: usize,
}

impl<'p, 'm> MapCostFunction<'p, 'm> {
    pub fn new(processor: &'p IrlsCostProcessor<'m>, channel_index: usize) -> Self {
        Self {
            processor,
            channel_index,
        }
    }

    pub fn channel_index(&self) -> usize {
        self.channel_index
    }
}

impl ObjectiveFunction for MapCostFunction<'_, '_> {
    fn num_parameters(&self) -> usize {
        self.processor.num_pixels()
    }

    fn evaluate(&self, parameters: &[f64], gradient: Option<&mut [f64]>) -> Result<f64> {
        self.processor
            .compute_objective_function(self.channel_index, parameters, gradient)
    }
}
