use ndarray::Array2;

use crate::error::Result;
use crate::image_data::{ImageData, ImageSize};
use crate::motion::{MotionShift, MotionShiftSequence};

use super::degradation::{DegradationOperator, LinearOperatorMatrix};

/// Integer translation of each frame by its entry in a motion sequence.
///
/// Pixels shifted past the border are dropped and uncovered pixels are zero,
/// so the operator matrix has all-zero rows at the exposed border.
#[derive(Clone, Debug)]
pub struct MotionModule {
    motion_shift_sequence: MotionShiftSequence,
}

impl MotionModule {
    pub fn new(motion_shift_sequence: MotionShiftSequence) -> Self {
        Self {
            motion_shift_sequence,
        }
    }

    pub fn motion_shift_sequence(&self) -> &MotionShiftSequence {
        &self.motion_shift_sequence
    }
}

/// Move every pixel by `(dx, dy)`; destinations outside the image are dropped.
pub fn shift_array(data: &Array2<f64>, dx: i32, dy: i32) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut result = Array2::<f64>::zeros((h, w));
    for ((row, col), &value) in data.indexed_iter() {
        let dst_row = row as i64 + dy as i64;
        let dst_col = col as i64 + dx as i64;
        if dst_row < 0 || dst_col < 0 || dst_row >= h as i64 || dst_col >= w as i64 {
            continue;
        }
        result[[dst_row as usize, dst_col as usize]] = value;
    }
    result
}

impl DegradationOperator for MotionModule {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn apply_to_image(&self, image: &mut ImageData, index: usize) -> Result<()> {
        let MotionShift { dx, dy } = self.motion_shift_sequence.get(index)?;
        image.map_channels(|channel| Ok(shift_array(channel, dx, dy)))
    }

    fn apply_transpose_to_image(&self, image: &mut ImageData, index: usize) -> Result<()> {
        let MotionShift { dx, dy } = self.motion_shift_sequence.get(index)?;
        image.map_channels(|channel| Ok(shift_array(channel, -dx, -dy)))
    }

    fn operator_matrix(
        &self,
        image_size: ImageSize,
        index: usize,
    ) -> Result<LinearOperatorMatrix> {
        let MotionShift { dx, dy } = self.motion_shift_sequence.get(index)?;
        let (h, w) = image_size.shape();
        let n = image_size.num_pixels();
        let mut matrix = Array2::<f64>::zeros((n, n));
        for row in 0..h {
            for col in 0..w {
                let dst_row = row as i64 + dy as i64;
                let dst_col = col as i64 + dx as i64;
                if dst_row < 0 || dst_col < 0 || dst_row >= h as i64 || dst_col >= w as i64 {
                    continue;
                }
                let dst = dst_row as usize * w + dst_col as usize;
                matrix[[dst, row * w + col]] = 1.0;
            }
        }
        Ok(matrix)
    }
}
