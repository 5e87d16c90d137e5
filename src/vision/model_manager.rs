// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for loading the form-field detector

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::vision::detector::DetectionModel;
use crate::vision::yolo::{YoloDetectionModel, YoloModelConfig};

/// Information about the loaded detection model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisionModelInfo {
    /// Model name
    pub name: String,
    /// Model type
    pub model_type: String,
    /// Number of classes the model can emit
    pub classes: usize,
}

/// Owns the detector shared by every request
///
/// Unlike optional vision features, the service cannot run without its
/// detector, so a load failure is an error rather than a missing model.
#[derive(Clone)]
pub struct VisionModelManager {
    model: Arc<dyn DetectionModel>,
}

impl VisionModelManager {
    /// Load the ONNX detector described by `config`
    pub async fn new(config: &YoloModelConfig) -> anyhow::Result<Self> {
        let model = YoloDetectionModel::load(config).await.with_context(|| {
            format!(
                "Failed to load detection model from {}",
                config.model_path.display()
            )
        })?;

        tracing::info!("✅ Form field detector ready ({} classes)", model.class_table().len());

        Ok(Self::from_model(Arc::new(model)))
    }

    /// Wrap an already-constructed model
    pub fn from_model(model: Arc<dyn DetectionModel>) -> Self {
        Self { model }
    }

    /// Get the detection model
    pub fn get_model(&self) -> Arc<dyn DetectionModel> {
        self.model.clone()
    }

    /// Describe the loaded model
    pub fn info(&self) -> VisionModelInfo {
        VisionModelInfo {
            name: self.model.name(),
            model_type: "detection".to_string(),
            classes: self.model.class_table().len(),
        }
    }
}

impl std::fmt::Debug for VisionModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionModelManager")
            .field("model", &self.model.name())
            .finish()
    }
}
