use rayon::prelude::*;
use tracing::info;

use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::error::{Result, SuperResError};
use crate::image_data::ImageData;
use crate::model::ImageModel;

/// Synthesize `count` LR observations by running `high_res` through the
/// model once per frame index.
pub fn simulate_low_res_frames(
    high_res: &ImageData,
    model: &ImageModel,
    count: usize,
) -> Result<Vec<ImageData>> {
    if count == 0 {
        return Err(SuperResError::EmptySequence);
    }

    let frames = if count >= PARALLEL_FRAME_THRESHOLD {
        (0..count)
            .into_par_iter()
            .map(|index| model.apply_to_image(high_res, index))
            .collect::<Result<Vec<_>>>()?
    } else {
        (0..count)
            .map(|index| model.apply_to_image(high_res, index))
            .collect::<Result<Vec<_>>>()?
    };

    info!(
        count,
        hr_size = %high_res.size(),
        lr_size = %frames[0].size(),
        "Simulated low-resolution frames"
    );
    Ok(frames)
}
