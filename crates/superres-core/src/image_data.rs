use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SuperResError};

/// Width and height of an image in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl ImageSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    /// Array shape in ndarray order, `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Multi-channel image with f64 pixel values.
///
/// Every channel is a row-major `(height, width)` array and all channels share
/// the same dimensions. Values are usually normalized to `[0.0, 1.0]` but the
/// degradation model and solver work on any range.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    channels: Vec<Array2<f64>>,
}

impl ImageData {
    /// Build an image from channel arrays, which must all have the same shape.
    pub fn new(channels: Vec<Array2<f64>>) -> Result<Self> {
        let first = channels.first().ok_or(SuperResError::EmptySequence)?;
        let dim = first.dim();
        if let Some(bad) = channels.iter().find(|c| c.dim() != dim) {
            return Err(SuperResError::Configuration(format!(
                "channel shape {:?} differs from {:?}",
                bad.dim(),
                dim
            )));
        }
        Ok(Self { channels })
    }

    /// Single-channel image.
    pub fn from_gray(data: Array2<f64>) -> Self {
        Self {
            channels: vec![data],
        }
    }

    /// Image of the given size with every pixel set to zero.
    pub fn zeros(size: ImageSize, num_channels: usize) -> Self {
        Self {
            channels: (0..num_channels.max(1))
                .map(|_| Array2::zeros(size.shape()))
                .collect(),
        }
    }

    /// Rebuild an image from row-major vectorized channels.
    pub fn from_channel_vectors(size: ImageSize, vectors: &[Vec<f64>]) -> Result<Self> {
        let channels = vectors
            .iter()
            .map(|v| vector_to_array(size, v))
            .collect::<Result<Vec<_>>>()?;
        Self::new(channels)
    }

    pub fn width(&self) -> usize {
        self.channels[0].ncols()
    }

    pub fn height(&self) -> usize {
        self.channels[0].nrows()
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width(), self.height())
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Pixel count of one channel.
    pub fn num_pixels(&self) -> usize {
        self.width() * self.height()
    }

    pub fn channel(&self, index: usize) -> Result<&Array2<f64>> {
        let total = self.channels.len();
        self.channels
            .get(index)
            .ok_or(SuperResError::ChannelIndexOutOfRange { index, total })
    }

    pub fn channel_mut(&mut self, index: usize) -> Result<&mut Array2<f64>> {
        let total = self.channels.len();
        self.channels
            .get_mut(index)
            .ok_or(SuperResError::ChannelIndexOutOfRange { index, total })
    }

    pub fn channels(&self) -> &[Array2<f64>] {
        &self.channels
    }

    /// Apply `f` to every channel, replacing each channel with the result.
    ///
    /// The resulting channels may have a different size than the input, but
    /// must all agree with each other.
    pub fn map_channels<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&Array2<f64>) -> Result<Array2<f64>>,
    {
        let mapped = self
            .channels
            .iter()
            .map(&mut f)
            .collect::<Result<Vec<_>>>()?;
        *self = Self::new(mapped)?;
        Ok(())
    }

    /// Row-major vectorization of one channel.
    pub fn channel_vector(&self, index: usize) -> Result<Array1<f64>> {
        Ok(vectorize(self.channel(index)?))
    }

    /// Overwrite a channel from a row-major vector of matching length.
    pub fn set_channel_from_vector(&mut self, index: usize, values: &[f64]) -> Result<()> {
        let size = self.size();
        let array = vector_to_array(size, values)?;
        *self.channel_mut(index)? = array;
        Ok(())
    }
}

/// Row-major vectorization of a 2D array.
pub fn vectorize(data: &Array2<f64>) -> Array1<f64> {
    data.iter().copied().collect()
}

/// Reshape a row-major vector into a `(height, width)` array.
pub fn vector_to_array(size: ImageSize, values: &[f64]) -> Result<Array2<f64>> {
    if values.len() != size.num_pixels() {
        return Err(SuperResError::SizeMismatch {
            expected: size.num_pixels(),
            actual: values.len(),
        });
    }
    Array2::from_shape_vec(size.shape(), values.to_vec()).map_err(|_| {
        SuperResError::InvalidDimensions {
            width: size.width,
            height: size.height,
        }
    })
}
