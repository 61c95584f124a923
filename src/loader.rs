//! Image loading and format dispatch
//!
//! Maps a file to one of three decode paths (icon container, pass-through,
//! generic raster) and produces the byte stream handed to the upload encoder.

use std::path::Path;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::ico::{IconDir, SizeSelect};
use crate::resize::{self, MAX_DIMENSION, MIN_DIMENSION};
use crate::{FormatError, UploadError};

/// Decode path for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Multi-resolution icon container; the largest entry is extracted
    IconContainer,
    /// Uploaded verbatim, never decoded or resized. GIF re-encoding would
    /// collapse animation, and the service accepts it as-is.
    PassThrough,
    /// Everything else: decode to a raster, re-encode as JPEG
    Raster,
}

impl SourceFormat {
    /// Select the decode path from the file extension.
    pub fn from_path(path: &Path) -> SourceFormat {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "ico" => SourceFormat::IconContainer,
            "gif" => SourceFormat::PassThrough,
            "jpg" | "jpe" | "jpeg" | "jfif" | "png" | "bmp" | "webp" | "wmf" | "tif" | "tiff" => {
                SourceFormat::Raster
            }
            other => {
                debug!(extension = other, "unrecognized extension, trying raster decode");
                SourceFormat::Raster
            }
        }
    }

    /// Decode the file bytes along this path.
    pub fn decode(self, data: &[u8]) -> Result<Decoded, FormatError> {
        match self {
            SourceFormat::IconContainer => {
                let dir = IconDir::parse(data)?;
                let index = dir
                    .find_extreme(SizeSelect::Largest)
                    .ok_or(FormatError::EmptyContainer)?;
                let single = dir.build_single_icon(index);
                Ok(Decoded::Raster(image::load_from_memory(&single)?))
            }
            SourceFormat::PassThrough => Ok(Decoded::Bytes(data.to_vec())),
            SourceFormat::Raster => Ok(Decoded::Raster(image::load_from_memory(data)?)),
        }
    }
}

/// Output of a decode path
#[derive(Debug)]
pub enum Decoded {
    Raster(DynamicImage),
    Bytes(Vec<u8>),
}

/// Load a file and produce the bytes to upload.
///
/// Rasters are always re-encoded as JPEG (the service sniffs content, not
/// filenames); with `resize` set they are first downsampled within the fixed
/// bounds. Pass-through files come back verbatim.
///
/// With `resize` set, any decode/resize/re-encode failure falls back to the
/// raw on-disk bytes instead of surfacing. This is the one swallowed error
/// path in the crate; with `resize` off, errors propagate typed.
pub async fn load_image_data(path: &Path, resize: bool) -> Result<Vec<u8>, UploadError> {
    let data = tokio::fs::read(path).await?;
    let format = SourceFormat::from_path(path);
    debug!(?format, path = %path.display(), "dispatching decode");

    match encode_for_upload(format, &data, resize) {
        Ok(bytes) => Ok(bytes),
        Err(e) if resize => {
            warn!(error = %e, "decode or resize failed, uploading raw file bytes");
            Ok(data)
        }
        Err(e) => Err(UploadError::Format(e)),
    }
}

fn encode_for_upload(
    format: SourceFormat,
    data: &[u8],
    resize: bool,
) -> Result<Vec<u8>, FormatError> {
    match format.decode(data)? {
        Decoded::Bytes(raw) => Ok(raw),
        Decoded::Raster(img) if resize => resize::bounded_jpeg(&img, MIN_DIMENSION, MAX_DIMENSION),
        Decoded::Raster(img) => resize::encode_jpeg(&img),
    }
}
