use ndarray::Array2;
use tracing::{debug, warn};

use crate::consts::MAX_INPAINT_PASSES;
use crate::error::{Result, SuperResError};
use crate::image_data::ImageData;
use crate::motion::MotionShiftSequence;

/// Baseline shift-and-add reconstruction.
///
/// Every LR pixel `(y, x)` of frame `i` is written to HR position
/// `(scale*y - dy_i, scale*x - dx_i)`; later frames overwrite earlier ones.
/// HR pixels no frame reached are then filled from their filled neighbours.
pub fn shift_add_fusion(
    frames: &[ImageData],
    motion: &MotionShiftSequence,
    scale: usize,
) -> Result<ImageData> {
    let first = frames.first().ok_or(SuperResError::EmptySequence)?;
    if scale == 0 {
        return Err(SuperResError::Configuration(
            "scale must be at least 1".into(),
        ));
    }
    if motion.len() < frames.len() {
        return Err(SuperResError::FrameIndexOutOfRange {
            index: frames.len() - 1,
            total: motion.len(),
        });
    }
    let low_res_size = first.size();
    let num_channels = first.num_channels();
    for frame in frames {
        if frame.size() != low_res_size || frame.num_channels() != num_channels {
            return Err(SuperResError::Configuration(
                "fusion frames differ in size or channel count".into(),
            ));
        }
    }

    let (lr_h, lr_w) = low_res_size.shape();
    let (hr_h, hr_w) = (lr_h * scale, lr_w * scale);
    let mut filled = Array2::from_elem((hr_h, hr_w), false);
    let mut channels = vec![Array2::<f64>::zeros((hr_h, hr_w)); num_channels];

    for (index, frame) in frames.iter().enumerate() {
        let shift = motion.get(index)?;
        for y in 0..lr_h {
            for x in 0..lr_w {
                let row = (scale * y) as i64 - shift.dy as i64;
                let col = (scale * x) as i64 - shift.dx as i64;
                if row < 0 || col < 0 || row >= hr_h as i64 || col >= hr_w as i64 {
                    continue;
                }
                let (row, col) = (row as usize, col as usize);
                for (hr, lr) in channels.iter_mut().zip(frame.channels()) {
                    hr[[row, col]] = lr[[y, x]];
                }
                filled[[row, col]] = true;
            }
        }
    }

    let placed = filled.iter().filter(|&&f| f).count();
    debug!(frames = frames.len(), placed, total = hr_h * hr_w, "Shift-add placement done");

    inpaint(&mut channels, &mut filled);
    ImageData::new(channels)
}

/// Fill unset pixels with the mean of their set 4-neighbours, one ring per
/// pass. Pixels filled in a pass only feed the next pass.
fn inpaint(channels: &mut [Array2<f64>], filled: &mut Array2<bool>) {
    let (h, w) = filled.dim();
    for pass in 0..MAX_INPAINT_PASSES {
        let mut updates = Vec::new();
        for row in 0..h {
            for col in 0..w {
                if filled[[row, col]] {
                    continue;
                }
                let neighbours: Vec<(usize, usize)> = [
                    (row.wrapping_sub(1), col),
                    (row + 1, col),
                    (row, col.wrapping_sub(1)),
                    (row, col + 1),
                ]
                .into_iter()
                .filter(|&(r, c)| r < h && c < w && filled[[r, c]])
                .collect();
                if neighbours.is_empty() {
                    continue;
                }
                let values: Vec<f64> = channels
                    .iter()
                    .map(|channel| {
                        neighbours.iter().map(|&(r, c)| channel[[r, c]]).sum::<f64>()
                            / neighbours.len() as f64
                    })
                    .collect();
                updates.push((row, col, values));
            }
        }

        if updates.is_empty() {
            let missing = filled.iter().filter(|&&f| !f).count();
            if missing > 0 {
                warn!(missing, "Inpainting stalled, pixels have no filled neighbours");
            }
            return;
        }
        for (row, col, values) in updates {
            for (channel, value) in channels.iter_mut().zip(values) {
                channel[[row, col]] = value;
            }
            filled[[row, col]] = true;
        }
        debug!(pass, "Inpainting pass");
    }

    let missing = filled.iter().filter(|&&f| !f).count();
    if missing > 0 {
        warn!(missing, passes = MAX_INPAINT_PASSES, "Inpainting left pixels unfilled");
    }
}
