use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::Array2;
use tracing::debug;

use crate::error::{Result, SuperResError};
use crate::image_data::{ImageData, ImageSize};

use super::degradation::{DegradationOperator, LinearOperatorMatrix};

/// Ordered pipeline of degradation operators.
///
/// Operator 0 is applied first. The model for frame `i` is the matrix product
/// `Op_{n-1} * ... * Op_1 * Op_0`. Operators can only be added before the
/// model is first used.
#[derive(Default)]
pub struct ImageModel {
    operators: Vec<Box<dyn DegradationOperator>>,
    in_use: AtomicBool,
}

impl ImageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operator to the end of the pipeline.
    pub fn add_degradation_operator(
        &mut self,
        operator: Box<dyn DegradationOperator>,
    ) -> Result<()> {
        if self.in_use.load(Ordering::Acquire) {
            return Err(SuperResError::Configuration(format!(
                "cannot add '{}' operator: image model is already in use",
                operator.name()
            )));
        }
        debug!(
            operator = operator.name(),
            position = self.operators.len(),
            "Adding degradation operator"
        );
        self.operators.push(operator);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn operator_names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|op| op.name()).collect()
    }

    fn mark_in_use(&self) {
        self.in_use.store(true, Ordering::Release);
    }

    /// Degrade a copy of `image` through every operator in insertion order.
    pub fn apply_to_image(&self, image: &ImageData, index: usize) -> Result<ImageData> {
        self.mark_in_use();
        let mut degraded = image.clone();
        for op in &self.operators {
            op.apply_to_image(&mut degraded, index)?;
        }
        Ok(degraded)
    }

    /// Apply the adjoint of the whole pipeline: every operator's transpose in
    /// reverse insertion order.
    pub fn apply_transpose_to_image(&self, image: &ImageData, index: usize) -> Result<ImageData> {
        self.mark_in_use();
        let mut result = image.clone();
        for op in self.operators.iter().rev() {
            op.apply_transpose_to_image(&mut result, index)?;
        }
        Ok(result)
    }

    /// Size of the degraded output for an input of `input` size.
    pub fn output_size(&self, input: ImageSize) -> Result<ImageSize> {
        self.operators
            .iter()
            .try_fold(input, |size, op| op.output_size(size))
    }

    /// Dense matrix of the whole pipeline for frame `index`.
    pub fn model_matrix(
        &self,
        image_size: ImageSize,
        index: usize,
    ) -> Result<LinearOperatorMatrix> {
        self.mark_in_use();
        let mut size = image_size;
        let mut model: Option<Array2<f64>> = None;
        for op in &self.operators {
            let op_matrix = op.operator_matrix(size, index)?;
            model = Some(match model {
                None => op_matrix,
                Some(acc) => {
                    if op_matrix.ncols() != acc.nrows() {
                        return Err(SuperResError::SizeMismatch {
                            expected: acc.nrows(),
                            actual: op_matrix.ncols(),
                        });
                    }
                    op_matrix.dot(&acc)
                }
            });
            size = op.output_size(size)?;
        }
        Ok(model.unwrap_or_else(|| Array2::eye(image_size.num_pixels())))
    }
}

impl std::fmt::Debug for ImageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageModel")
            .field("operators", &self.operator_names())
            .finish()
    }
}
