use ndarray::Array2;

use crate::error::{Result, SuperResError};
use crate::image_data::{ImageData, ImageSize};

use super::degradation::{DegradationOperator, LinearOperatorMatrix};

/// Point-sampling decimation by an integer scale.
///
/// Keeps the top-left pixel of every `scale`x`scale` block and drops the
/// rest; no averaging. The transpose places each value back at the top-left
/// of its block and zero-fills the remainder.
#[derive(Clone, Debug)]
pub struct DownsamplingModule {
    scale: usize,
}

impl DownsamplingModule {
    pub fn new(scale: usize) -> Result<Self> {
        if scale == 0 {
            return Err(SuperResError::Configuration(
                "downsampling scale must be at least 1".into(),
            ));
        }
        Ok(Self { scale })
    }

    pub fn scale(&self) -> usize {
        self.scale
    }
}

/// Top-left point sample of each `scale`x`scale` block.
pub fn downsample_array(data: &Array2<f64>, scale: usize) -> Result<Array2<f64>> {
    let (h, w) = data.dim();
    if h % scale != 0 || w % scale != 0 {
        return Err(SuperResError::InvalidDimensions {
            width: w,
            height: h,
        });
    }
    Ok(Array2::from_shape_fn((h / scale, w / scale), |(r, c)| {
        data[[r * scale, c * scale]]
    }))
}

/// Adjoint of [`downsample_array`]: zero-interleaved upscale.
pub fn upsample_array(data: &Array2<f64>, scale: usize) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut result = Array2::<f64>::zeros((h * scale, w * scale));
    for ((r, c), &value) in data.indexed_iter() {
        result[[r * scale, c * scale]] = value;
    }
    result
}

impl DegradationOperator for DownsamplingModule {
    fn name(&self) -> &'static str {
        "downsampling"
    }

    fn apply_to_image(&self, image: &mut ImageData, _index: usize) -> Result<()> {
        image.map_channels(|channel| downsample_array(channel, self.scale))
    }

    fn apply_transpose_to_image(&self, image: &mut ImageData, _index: usize) -> Result<()> {
        image.map_channels(|channel| Ok(upsample_array(channel, self.scale)))
    }

    fn operator_matrix(
        &self,
        image_size: ImageSize,
        _index: usize,
    ) -> Result<LinearOperatorMatrix> {
        let out = self.output_size(image_size)?;
        let mut matrix = Array2::<f64>::zeros((out.num_pixels(), image_size.num_pixels()));
        for row in 0..out.height {
            for col in 0..out.width {
                let src = (row * self.scale) * image_size.width + col * self.scale;
                matrix[[row * out.width + col, src]] = 1.0;
            }
        }
        Ok(matrix)
    }

    fn output_size(&self, input: ImageSize) -> Result<ImageSize> {
        if input.width % self.scale != 0 || input.height % self.scale != 0 {
            return Err(SuperResError::InvalidDimensions {
                width: input.width,
                height: input.height,
            });
        }
        Ok(ImageSize::new(
            input.width / self.scale,
            input.height / self.scale,
        ))
    }
}
