//! Resize heuristic and JPEG re-encoding
//!
//! Decides whether a raster should be downsampled before upload and produces
//! the JPEG bytes the upload endpoint receives. Never upscales.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, imageops::FilterType};
use tracing::debug;

use crate::FormatError;

/// Neither dimension may fall below this after resizing
pub const MIN_DIMENSION: u32 = 200;

/// Soft cap on the larger dimension (the min-dimension bias can exceed it)
pub const MAX_DIMENSION: u32 = 800;

/// Compute the post-resize dimensions, or `None` to keep the original size.
///
/// `ratio_max` caps the larger dimension at `max_dim`; `ratio_min` keeps the
/// smaller dimension from falling below `min_dim`. Taking the max of the two
/// biases toward not shrinking below `min_dim`, even when that leaves the
/// long edge above `max_dim`. A ratio >= 1 would upscale, so the original is
/// kept.
pub fn target_size(
    width: u32,
    height: u32,
    min_dim: u32,
    max_dim: u32,
) -> Result<Option<(u32, u32)>, FormatError> {
    if width == 0 || height == 0 {
        return Err(FormatError::ZeroDimension);
    }

    let (w, h) = (width as f64, height as f64);
    let ratio_max = (max_dim as f64 / w).min(max_dim as f64 / h);
    let ratio_min = (min_dim as f64 / w).max(min_dim as f64 / h);
    let ratio = ratio_max.max(ratio_min);

    if ratio >= 1.0 {
        return Ok(None);
    }
    Ok(Some(((w * ratio) as u32, (h * ratio) as u32)))
}

/// Encode a raster as JPEG, flattening to RGB (JPEG has no alpha).
pub fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, FormatError> {
    let rgb = img.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageFormat::Jpeg)?;
    Ok(buf.into_inner())
}

/// Downsample within the given bounds if needed, then encode as JPEG.
pub fn bounded_jpeg(
    img: &DynamicImage,
    min_dim: u32,
    max_dim: u32,
) -> Result<Vec<u8>, FormatError> {
    match target_size(img.width(), img.height(), min_dim, max_dim)? {
        Some((w, h)) => {
            debug!(w, h, "downsampling before upload");
            encode_jpeg(&img.resize_exact(w, h, FilterType::Triangle))
        }
        None => encode_jpeg(img),
    }
}
