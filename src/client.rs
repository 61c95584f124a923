//! Search upload client
//!
//! Owns the whole pipeline: load (and optionally resize) the image, build
//! the multipart body, POST it once with auto-redirects disabled, and read
//! the results URL out of the redirect's Location header.

use std::future::Future;
use std::path::Path;
use std::pin::pin;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect;
use tracing::{debug, info};
use url::Url;

use crate::loader;
use crate::multipart::Form;
use crate::UploadError;

const DEFAULT_ENDPOINT: &str = "https://www.google.com/searchbyimage/upload";

/// Client signature the service expects in the `sbisrc` field. Not part of
/// the protocol proper; updated over time to track a current browser build.
const DEFAULT_SOURCE_TAG: &str = "Google Chrome 107.0.5304.107 (Official) Windows";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Per-upload options
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    /// Send the image file name alongside the image
    pub include_file_name: bool,
    /// Downsample large images before uploading
    pub resize: bool,
}

/// Search client builder
pub struct SearchClientBuilder {
    endpoint: Url,
    source_tag: String,
    timeout: Duration,
}

impl SearchClientBuilder {
    pub fn new() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn source_tag(mut self, tag: &str) -> Self {
        self.source_tag = tag.to_string();
        self
    }

    /// Overall deadline for one upload call (load, encode, and POST).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SearchClient, UploadError> {
        // Success is recognized by the redirect itself, so reqwest must not
        // follow it
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(SearchClient {
            endpoint: self.endpoint,
            source_tag: self.source_tag,
            timeout: self.timeout,
            http,
        })
    }
}

impl Default for SearchClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Uploads images to the search service. Holds no per-call state; a single
/// client may serve concurrent uploads.
pub struct SearchClient {
    endpoint: Url,
    source_tag: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl SearchClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self, UploadError> {
        Self::builder().build()
    }

    /// Create a client builder
    pub fn builder() -> SearchClientBuilder {
        SearchClientBuilder::new()
    }

    /// Upload an image and return the results-page URL.
    ///
    /// Makes exactly one POST attempt; the configured timeout covers the
    /// whole call. Success is only a 3xx response carrying a Location
    /// header, returned verbatim; any other response is
    /// [`UploadError::UnexpectedStatus`].
    pub async fn upload(
        &self,
        path: impl AsRef<Path>,
        options: UploadOptions,
    ) -> Result<String, UploadError> {
        match tokio::time::timeout(self.timeout, self.run(path.as_ref(), options)).await {
            Ok(result) => result,
            Err(_) => Err(UploadError::Timeout),
        }
    }

    /// Like [`upload`], racing an external cancel future. The cancel future
    /// is polled first, so a cancellation that has already fired wins before
    /// any file or network activity; completing mid-flight drops the request
    /// and aborts the connection.
    ///
    /// [`upload`]: SearchClient::upload
    pub async fn upload_with_cancel(
        &self,
        path: impl AsRef<Path>,
        options: UploadOptions,
        cancel: impl Future<Output = ()>,
    ) -> Result<String, UploadError> {
        let mut upload = pin!(self.upload(path, options));
        let mut cancel = pin!(cancel);
        tokio::select! {
            biased;
            _ = &mut cancel => Err(UploadError::Canceled),
            result = &mut upload => result,
        }
    }

    async fn run(&self, path: &Path, options: UploadOptions) -> Result<String, UploadError> {
        info!(path = %path.display(), "uploading image");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let image_data = loader::load_image_data(path, options.resize).await?;
        debug!(bytes = image_data.len(), "image data ready");

        let mut form = Form::new();
        form.add_bytes("encoded_image", &file_name, image_data);
        if options.include_file_name {
            form.add_text("filename", &file_name);
        }
        form.add_text("sbisrc", &self.source_tag);

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, form.content_type())
            .body(form.encode())
            .send()
            .await?;

        let status = response.status();
        if status.is_redirection() {
            if let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            {
                info!(url = location, "search results ready");
                return Ok(location.to_string());
            }
        }
        Err(UploadError::UnexpectedStatus(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = SearchClient::builder().build().unwrap();
        assert_eq!(client.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(client.source_tag, DEFAULT_SOURCE_TAG);
        assert_eq!(client.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_builder_overrides() {
        let client = SearchClient::builder()
            .endpoint(Url::parse("http://127.0.0.1:1/upload").unwrap())
            .source_tag("TestAgent/1.0")
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(client.endpoint.host_str(), Some("127.0.0.1"));
        assert_eq!(client.source_tag, "TestAgent/1.0");
        assert_eq!(client.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_options_default_to_off() {
        let options = UploadOptions::default();
        assert!(!options.include_file_name);
        assert!(!options.resize);
    }
}
