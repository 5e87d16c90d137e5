// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image acquisition from uploads and remote URLs
//!
//! Both sources produce a [`RawImage`] or fail with [`AcquisitionError`].
//! URL fetches are a single GET with no retries and no caching.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use image::ImageFormat;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::vision::image_utils::detect_format;

/// Default upper bound on an acquired image (10MB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Uploaded image is empty")]
    EmptyPayload,

    #[error("No file field in multipart upload")]
    MissingFile,

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Failed to read upload: {0}")]
    Upload(String),

    #[error("Invalid image URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP {status} fetching {url}")]
    FetchStatus { status: u16, url: String },
}

/// Raw image bytes plus the format sniffed from them
///
/// `format` is `None` when the magic bytes are not recognized. The bytes are
/// still handed on and the downstream decoder decides.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub bytes: Bytes,
    pub format: Option<ImageFormat>,
}

impl RawImage {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let format = detect_format(&bytes).ok();
        Self { bytes, format }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Obtains [`RawImage`]s and enforces the size and emptiness rules
#[derive(Debug, Clone)]
pub struct ImageAcquirer {
    client: Client,
    max_bytes: usize,
}

impl ImageAcquirer {
    /// Create an acquirer with the given per-image size limit and fetch timeout
    pub fn new(max_bytes: usize, fetch_timeout: Duration) -> Result<Self, AcquisitionError> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| AcquisitionError::Fetch {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, max_bytes })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Wrap a fully-read upload body
    ///
    /// Empty uploads are rejected here rather than left for the detector.
    pub fn from_upload(&self, bytes: impl Into<Bytes>) -> Result<RawImage, AcquisitionError> {
        let bytes = bytes.into();
        self.check_size(bytes.len())?;
        let image = RawImage::new(bytes);
        debug!(
            "Acquired upload: {} bytes, format {:?}",
            image.len(),
            image.format
        );
        Ok(image)
    }

    /// Fetch an image with a single GET
    pub async fn from_url(&self, url: &str) -> Result<RawImage, AcquisitionError> {
        let parsed = Self::parse_url(url)?;

        debug!("Fetching image from: {}", parsed);

        let mut response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| AcquisitionError::Fetch {
                url: url.to_string(),
                message: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::FetchStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(AcquisitionError::TooLarge(length as usize, self.max_bytes));
            }
        }

        // Bodies without a trustworthy length are capped while streaming
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| AcquisitionError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })? {
            let received = body.len() + chunk.len();
            if received > self.max_bytes {
                return Err(AcquisitionError::TooLarge(received, self.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        let bytes = body.freeze();
        self.check_size(bytes.len())?;

        let image = RawImage::new(bytes);
        info!("Fetched {} bytes from: {}", image.len(), url);
        Ok(image)
    }

    fn check_size(&self, len: usize) -> Result<(), AcquisitionError> {
        if len == 0 {
            return Err(AcquisitionError::EmptyPayload);
        }
        if len > self.max_bytes {
            return Err(AcquisitionError::TooLarge(len, self.max_bytes));
        }
        Ok(())
    }

    fn parse_url(url: &str) -> Result<Url, AcquisitionError> {
        let parsed = Url::parse(url).map_err(|e| AcquisitionError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(AcquisitionError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}
