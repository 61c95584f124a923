//! imgseek
//!
//! Uploads a local image to a reverse image search service and returns the
//! URL of the results page. Handles multi-resolution icon containers,
//! downsampling of large images, and the service's non-standard
//! multipart/form-data dialect.

pub mod ico;
pub mod loader;
pub mod multipart;
pub mod resize;

mod client;

pub use client::{SearchClient, SearchClientBuilder, UploadOptions};
pub use url::Url;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upload an image with a default client and default options.
pub async fn search(path: impl AsRef<std::path::Path>) -> Result<String, UploadError> {
    SearchClient::builder()
        .build()?
        .upload(path, UploadOptions::default())
        .await
}

/// Malformed or undecodable image input
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Truncated icon container: needed {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    #[error("Icon entry {index} extends past the end of the buffer")]
    EntryOutOfBounds { index: usize },

    #[error("Icon container has no entries")]
    EmptyContainer,

    #[error("Image has a zero width or height")]
    ZeroDimension,

    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),
}

/// Upload failure
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Format(#[from] FormatError),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Expected redirect to results page, got {0}")]
    UnexpectedStatus(u16),

    #[error("Upload canceled")]
    Canceled,

    #[error("Upload timed out")]
    Timeout,
}
