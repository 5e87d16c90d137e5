// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request pipeline
//!
//! Detection: acquire → stage → detect → release → normalize.
//! Cropping: acquire → decode → crop → encode.
//!
//! CPU-bound work runs on Tokio's blocking pool. The staged file is created,
//! used and released inside one blocking task, so release never runs before
//! the detector has returned.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, info};

use crate::acquisition::{ImageAcquirer, RawImage};
use crate::error::PipelineError;
use crate::staging::StagingStore;
use crate::vision::crop::{crop, validate_tags, CroppedImage, Tag};
use crate::vision::detector::{DetectionModel, RawDetections};
use crate::vision::image_utils::decode_image_bytes;
use crate::vision::invoker::{DetectionFailure, DetectionInvoker};
use crate::vision::normalizer::{normalize, DetectionResult};

#[derive(Debug, Clone)]
pub struct Pipeline {
    acquirer: ImageAcquirer,
    staging: StagingStore,
    invoker: DetectionInvoker,
}

impl Pipeline {
    pub fn new(acquirer: ImageAcquirer, staging: StagingStore, invoker: DetectionInvoker) -> Self {
        Self {
            acquirer,
            staging,
            invoker,
        }
    }

    pub fn acquirer(&self) -> &ImageAcquirer {
        &self.acquirer
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    pub fn model(&self) -> &Arc<dyn DetectionModel> {
        self.invoker.model()
    }

    /// Detect form fields in an uploaded image
    pub async fn predict_upload(&self, bytes: Bytes) -> Result<DetectionResult, PipelineError> {
        let image = self.acquirer.from_upload(bytes)?;
        self.predict(image).await
    }

    /// Detect form fields in an image fetched from `url`
    pub async fn predict_url(&self, url: &str) -> Result<DetectionResult, PipelineError> {
        let image = self.acquirer.from_url(url).await?;
        self.predict(image).await
    }

    /// Stage, detect, release, then resolve class names
    pub async fn predict(&self, image: RawImage) -> Result<DetectionResult, PipelineError> {
        let start = Instant::now();
        let staging = self.staging.clone();
        let invoker = self.invoker.clone();

        let raw = tokio::task::spawn_blocking(move || -> Result<RawDetections, PipelineError> {
            let staged = staging.stage(image)?;
            let detected = invoker.detect(staged.path());
            let released = staged.release();

            // A detector error outranks a cleanup error
            let raw = detected?;
            released?;
            Ok(raw)
        })
        .await
        .map_err(|e| DetectionFailure::new(format!("detector task aborted: {}", e)))??;

        debug!("Raw detections: {:?}", raw);

        let result = normalize(raw, self.model().class_table())?;

        info!(
            "Detected {} form fields in {}ms",
            result.len(),
            start.elapsed().as_millis()
        );

        Ok(result)
    }

    /// Fetch `url` and crop every tag out of it
    ///
    /// Tags are validated before the fetch so a malformed request costs no
    /// network round trip.
    pub async fn crop_url(&self, url: &str, tags: Vec<Tag>) -> Result<Vec<CroppedImage>, PipelineError> {
        validate_tags(&tags)?;
        let image = self.acquirer.from_url(url).await?;
        self.crop(image, tags).await
    }

    pub async fn crop(&self, image: RawImage, tags: Vec<Tag>) -> Result<Vec<CroppedImage>, PipelineError> {
        let start = Instant::now();

        let crops = tokio::task::spawn_blocking(move || -> Result<Vec<CroppedImage>, PipelineError> {
            let (source, info) = decode_image_bytes(&image.bytes)
                .map_err(|e| PipelineError::ImageDecode(e.to_string()))?;
            debug!(
                "Cropping {} tags from {}x{} {:?} image",
                tags.len(),
                info.width,
                info.height,
                info.format
            );
            crop(&source, &tags)
        })
        .await
        .map_err(|e| PipelineError::ImageEncode(format!("crop task aborted: {}", e)))??;

        info!(
            "Cropped {} regions in {}ms",
            crops.len(),
            start.elapsed().as_millis()
        );

        Ok(crops)
    }
}
