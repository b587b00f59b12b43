use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
use ndarray::Array2;

use crate::error::{Result, VerdantError};
use crate::index::IndexRaster;

/// Load a single-channel band raster, keeping raw pixel values (digital numbers).
pub fn load_band(path: &Path) -> Result<Array2<f32>> {
    let img = image::open(path)?;
    let (w, h) = (img.width() as usize, img.height() as usize);

    let values: Vec<f32> = match img {
        DynamicImage::ImageLuma16(buf) => buf.into_raw().into_iter().map(f32::from).collect(),
        DynamicImage::ImageLuma8(buf) => buf.into_raw().into_iter().map(f32::from).collect(),
        other => {
            return Err(VerdantError::InvalidBand(format!(
                "{} has color type {:?}, expected a single-channel band",
                path.display(),
                other.color()
            )))
        }
    };

    Array2::from_shape_vec((h, w), values)
        .map_err(|e| VerdantError::InvalidBand(format!("{}: {e}", path.display())))
}

/// Save raw band values as a 16-bit grayscale TIFF. Values are rounded and
/// clamped to `0..=65535`; non-finite values become 0.
pub fn save_band(data: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();
    let pixels: Vec<u16> = data
        .iter()
        .map(|&v| {
            if v.is_finite() {
                v.round().clamp(0.0, u16::MAX as f32) as u16
            } else {
                0
            }
        })
        .collect();
    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| VerdantError::InvalidBand(format!("{w}x{h} buffer size mismatch")))?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Map a value in `range` onto `1..=max`. Zero is kept for invalid pixels.
fn quantize(value: Option<f32>, range: (f32, f32), max: f32) -> f32 {
    let Some(v) = value else {
        return 0.0;
    };
    let (lo, hi) = range;
    let t = if hi > lo {
        ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    1.0 + t * (max - 1.0)
}

/// Save an index raster as 16-bit grayscale TIFF.
pub fn save_composite_tiff(raster: &IndexRaster, range: (f32, f32), path: &Path) -> Result<()> {
    let (h, w) = raster.dim();
    let max = u16::MAX as f32;
    let pixels: Vec<u16> = raster
        .iter()
        .map(|&v| quantize(v, range, max).round() as u16)
        .collect();

    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| VerdantError::InvalidBand(format!("{w}x{h} buffer size mismatch")))?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save an index raster as 8-bit grayscale PNG.
pub fn save_composite_png(raster: &IndexRaster, range: (f32, f32), path: &Path) -> Result<()> {
    let (h, w) = raster.dim();
    let max = u8::MAX as f32;
    let pixels: Vec<u8> = raster
        .iter()
        .map(|&v| quantize(v, range, max).round() as u8)
        .collect();

    let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| VerdantError::InvalidBand(format!("{w}x{h} buffer size mismatch")))?;
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save an index raster, choosing format from file extension.
///
/// Valid pixels are scaled linearly from `range` onto `1..=max`; invalid
/// pixels are written as 0.
pub fn save_composite(raster: &IndexRaster, range: (f32, f32), path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_composite_png(raster, range, path),
        _ => save_composite_tiff(raster, range, path),
    }
}
