// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime form-field detector
//!
//! Runs a YOLO-family ONNX export (e.g. the web form UI field detection
//! model) on CPU. Output boxes are mapped back to the pixel space of the
//! original image.

use anyhow::{Context, Result};
use ndarray::{Array2, Array4};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

use super::detector::{ClassTable, DetectionConfig, DetectionModel, RawDetections};
use super::postprocess::{decode_candidates, non_max_suppression, output_to_rows};
use super::preprocessing::{preprocess_for_detection, DEFAULT_INPUT_SIZE};

/// Metadata key Ultralytics exports use for the class table
const NAMES_METADATA_KEY: &str = "names";

/// Settings for loading a [`YoloDetectionModel`]
#[derive(Debug, Clone)]
pub struct YoloModelConfig {
    /// Path to the ONNX model file
    pub model_path: PathBuf,
    /// JSON class names; overrides the model's own metadata when set
    pub class_names_path: Option<PathBuf>,
    /// Square model input size
    pub input_size: u32,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for YoloModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/web-form-ui-field-detection.onnx"),
            class_names_path: None,
            input_size: DEFAULT_INPUT_SIZE,
            intra_threads: 4,
        }
    }
}

/// YOLO detector backed by an ONNX Runtime session
///
/// `Session::run` needs exclusive access, so calls are serialized through a
/// mutex and the model can be shared freely between requests.
#[derive(Clone)]
pub struct YoloDetectionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    input_size: u32,
    class_table: ClassTable,
    name: String,
}

impl std::fmt::Debug for YoloDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetectionModel")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("classes", &self.class_table.len())
            .finish_non_exhaustive()
    }
}

impl YoloDetectionModel {
    /// Load the detector
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - No class table can be found in the metadata or the names file
    pub async fn load(config: &YoloModelConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        info!("Loading detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input shape: {:?}", input.input_type);
        }

        let class_table = match config.class_names_path {
            Some(ref path) => ClassTable::from_json_file(path)?,
            None => Self::class_table_from_metadata(&session)?,
        };
        debug!("Detection model classes: {:?}", class_table);

        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "detector".to_string());

        info!(
            "✅ Detection model '{}' loaded ({} classes, input {}x{})",
            name,
            class_table.len(),
            config.input_size,
            config.input_size
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            input_size: config.input_size,
            class_table,
            name,
        })
    }

    fn class_table_from_metadata(session: &Session) -> Result<ClassTable> {
        let metadata = session
            .metadata()
            .context("Failed to read model metadata")?;
        let names = metadata
            .custom(NAMES_METADATA_KEY)
            .ok()
            .flatten()
            .context("Model metadata has no 'names' entry; supply a class names file")?;
        ClassTable::from_ultralytics_metadata(&names)
    }

    /// Number of class scores the detection head is expected to carry
    fn num_classes(&self) -> Option<usize> {
        self.class_table.iter().map(|(i, _)| i + 1).max()
    }

    fn run(&self, input: Array4<f32>) -> Result<Array2<f32>> {
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        output_to_rows(output_tensor.view(), self.num_classes())
    }
}

impl DetectionModel for YoloDetectionModel {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn predict(&self, path: &Path, config: &DetectionConfig) -> Result<RawDetections> {
        let start = Instant::now();

        let image = image::open(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;

        let (tensor, info) = preprocess_for_detection(&image, self.input_size, self.input_size);
        let rows = self.run(tensor)?;

        let candidates = decode_candidates(rows.view(), config.confidence_threshold);
        let candidate_count = candidates.len();
        let kept = non_max_suppression(
            candidates,
            config.iou_threshold,
            config.class_agnostic,
            config.max_detections,
        );

        let mut raw = RawDetections::default();
        for det in kept {
            raw.push(
                info.map_box_to_original(det.bbox),
                det.confidence,
                det.class_index,
            );
        }

        debug!(
            "Detection on {}x{} image: {} candidates, {} kept, {}ms",
            info.original_width,
            info.original_height,
            candidate_count,
            raw.len(),
            start.elapsed().as_millis()
        );

        Ok(raw)
    }

    fn class_table(&self) -> &ClassTable {
        &self.class_table
    }
}
