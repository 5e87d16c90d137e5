// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection invoker
//!
//! Applies the process-wide [`DetectionConfig`] to the loaded model and
//! converts its failures into [`DetectionFailure`]. No retries.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use super::detector::{DetectionConfig, DetectionModel, RawDetections};

#[derive(Debug, Error)]
#[error("Detection failed: {0}")]
pub struct DetectionFailure(pub String);

impl DetectionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Shared handle to a model plus the settings every request runs with
#[derive(Clone)]
pub struct DetectionInvoker {
    model: Arc<dyn DetectionModel>,
    config: DetectionConfig,
}

impl std::fmt::Debug for DetectionInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionInvoker")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

impl DetectionInvoker {
    pub fn new(model: Arc<dyn DetectionModel>, config: DetectionConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &Arc<dyn DetectionModel> {
        &self.model
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run the model on a staged file
    ///
    /// Blocking; callers on the async runtime go through `spawn_blocking`.
    pub fn detect(&self, path: &Path) -> Result<RawDetections, DetectionFailure> {
        let start = Instant::now();

        let raw = self
            .model
            .predict(path, &self.config)
            .map_err(|e| {
                warn!("Model '{}' failed on {}: {:#}", self.model.name(), path.display(), e);
                DetectionFailure::new(format!("{:#}", e))
            })?;

        debug!(
            "Model '{}' returned {} detections in {}ms",
            self.model.name(),
            raw.len(),
            start.elapsed().as_millis()
        );

        Ok(raw)
    }
}
