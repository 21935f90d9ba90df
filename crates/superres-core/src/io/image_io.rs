use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use ndarray::Array2;
use tracing::{debug, info};

use crate::error::{Result, SuperResError};
use crate::image_data::ImageData;

const IMAGE_EXTENSIONS: &[&str] = &["png", "tif", "tiff", "jpg", "jpeg", "bmp", "pgm", "ppm"];

fn quantize(value: f64, max: f64) -> f64 {
    (value.clamp(0.0, 1.0) * max).round()
}

/// Interleaved samples of every pixel, one entry per channel.
fn interleave(image: &ImageData, max: f64) -> Vec<f64> {
    let channels = image.channels();
    let mut samples = Vec::with_capacity(image.num_pixels() * channels.len());
    for row in 0..image.height() {
        for col in 0..image.width() {
            samples.extend(channels.iter().map(|c| quantize(c[[row, col]], max)));
        }
    }
    samples
}

fn to_dynamic_image(image: &ImageData, sixteen_bit: bool) -> Result<DynamicImage> {
    let (w, h) = (image.width() as u32, image.height() as u32);
    let bad_buffer = || SuperResError::InvalidDimensions {
        width: image.width(),
        height: image.height(),
    };

    let dynamic = match (image.num_channels(), sixteen_bit) {
        (1, true) => {
            let pixels = interleave(image, 65535.0).into_iter().map(|v| v as u16).collect();
            DynamicImage::ImageLuma16(
                ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w, h, pixels).ok_or_else(bad_buffer)?,
            )
        }
        (1, false) => {
            let pixels = interleave(image, 255.0).into_iter().map(|v| v as u8).collect();
            DynamicImage::ImageLuma8(
                ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(w, h, pixels).ok_or_else(bad_buffer)?,
            )
        }
        (3, true) => {
            let pixels = interleave(image, 65535.0).into_iter().map(|v| v as u16).collect();
            DynamicImage::ImageRgb16(
                ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w, h, pixels).ok_or_else(bad_buffer)?,
            )
        }
        (3, false) => {
            let pixels = interleave(image, 255.0).into_iter().map(|v| v as u8).collect();
            DynamicImage::ImageRgb8(
                ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(w, h, pixels).ok_or_else(bad_buffer)?,
            )
        }
        (n, _) => {
            return Err(SuperResError::Configuration(format!(
                "cannot save an image with {n} channels, expected 1 or 3"
            )));
        }
    };
    Ok(dynamic)
}

/// Save as 16-bit TIFF, grayscale or RGB by channel count.
pub fn save_tiff(image: &ImageData, path: &Path) -> Result<()> {
    to_dynamic_image(image, true)?.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save as 8-bit PNG, grayscale or RGB by channel count.
pub fn save_png(image: &ImageData, path: &Path) -> Result<()> {
    to_dynamic_image(image, false)?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save image, choosing format from file extension.
pub fn save_image(image: &ImageData, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tiff" | "tif") => save_tiff(image, path),
        Some("png") => save_png(image, path),
        _ => save_tiff(image, path),
    }
}

/// Write `frame_000.<ext>`, `frame_001.<ext>`, ... into `dir`, creating it
/// if needed. Returns the written paths in frame order.
pub fn save_images_to_directory(
    images: &[ImageData],
    dir: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let path = dir.join(format!("frame_{index:03}.{extension}"));
        save_image(image, &path)?;
        paths.push(path);
    }
    info!(count = images.len(), dir = %dir.display(), "Saved frames");
    Ok(paths)
}

/// Load an image file as one gray channel or three RGB channels, normalized
/// to `[0, 1]`. Alpha is discarded.
pub fn load_image(path: &Path) -> Result<ImageData> {
    let img = image::open(path)?;
    let (w, h) = (img.width() as usize, img.height() as usize);

    let image = if img.color().has_color() {
        let rgb = img.to_rgb16();
        let mut channels = vec![Array2::<f64>::zeros((h, w)); 3];
        for (col, row, pixel) in rgb.enumerate_pixels() {
            for (channel, &sample) in channels.iter_mut().zip(pixel.0.iter()) {
                channel[[row as usize, col as usize]] = sample as f64 / 65535.0;
            }
        }
        ImageData::new(channels)?
    } else {
        let gray = img.to_luma16();
        let mut data = Array2::<f64>::zeros((h, w));
        for (col, row, pixel) in gray.enumerate_pixels() {
            data[[row as usize, col as usize]] = pixel.0[0] as f64 / 65535.0;
        }
        ImageData::from_gray(data)
    };

    debug!(
        path = %path.display(),
        size = %image.size(),
        channels = image.num_channels(),
        "Loaded image"
    );
    Ok(image)
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

/// Load every image file in `dir`, sorted by file name.
pub fn load_images_from_directory(dir: &Path) -> Result<Vec<ImageData>> {
    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.retain(|p| is_image_file(p));
    paths.sort();

    if paths.is_empty() {
        return Err(SuperResError::EmptySequence);
    }
    let images = paths
        .iter()
        .map(|p| load_image(p))
        .collect::<Result<Vec<_>>>()?;
    info!(count = images.len(), dir = %dir.display(), "Loaded image sequence");
    Ok(images)
}
