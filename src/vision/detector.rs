// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection model boundary
//!
//! The request pipeline only talks to a model through [`DetectionModel`].
//! The bundled implementation is the ONNX detector in `vision::yolo`; tests
//! substitute their own.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

fn default_confidence_threshold() -> f32 {
    0.25
}

fn default_iou_threshold() -> f32 {
    0.45
}

fn default_max_detections() -> usize {
    1000
}

/// Process-wide detector settings, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum score to keep a detection
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Overlap threshold for duplicate suppression
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
    /// Suppress overlapping boxes regardless of class
    #[serde(default)]
    pub class_agnostic: bool,
    /// Hard cap on detections per image
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            iou_threshold: default_iou_threshold(),
            class_agnostic: false,
            max_detections: default_max_detections(),
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            anyhow::bail!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            );
        }
        if self.max_detections == 0 {
            anyhow::bail!("max_detections must be at least 1");
        }
        Ok(())
    }
}

/// Native detector output: three index-aligned arrays
///
/// Boxes are `[x1, y1, x2, y2]` in absolute pixels of the input image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDetections {
    pub boxes: Vec<[f32; 4]>,
    pub confidences: Vec<f32>,
    pub class_indices: Vec<usize>,
}

impl RawDetections {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn push(&mut self, bbox: [f32; 4], confidence: f32, class_index: usize) {
        self.boxes.push(bbox);
        self.confidences.push(confidence);
        self.class_indices.push(class_index);
    }
}

/// Class index to human-readable name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTable {
    names: BTreeMap<usize, String>,
}

impl ClassTable {
    pub fn new(names: BTreeMap<usize, String>) -> Self {
        Self { names }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(i, n)| (i, n.into()))
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(|(i, n)| (*i, n.as_str()))
    }

    /// Parse the `names` entry written into Ultralytics ONNX exports
    ///
    /// The value is a Python dict literal, e.g. `{0: 'button', 1: 'text field'}`.
    pub fn from_ultralytics_metadata(raw: &str) -> Result<Self> {
        static ENTRY: OnceLock<Regex> = OnceLock::new();
        let entry = ENTRY.get_or_init(|| {
            Regex::new(r#"(\d+)\s*:\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")"#)
                .expect("class name pattern is valid")
        });

        let mut names = BTreeMap::new();
        for caps in entry.captures_iter(raw) {
            let index: usize = caps[1]
                .parse()
                .with_context(|| format!("Invalid class index '{}'", &caps[1]))?;
            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().replace("\\'", "'").replace("\\\"", "\""))
                .unwrap_or_default();
            names.insert(index, name);
        }

        if names.is_empty() {
            anyhow::bail!("No class names found in model metadata");
        }

        Ok(Self { names })
    }

    /// Parse a JSON class list (`["a", "b"]`) or map (`{"0": "a"}`)
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(raw).context("Class names file is not valid JSON")?;

        match value {
            serde_json::Value::Array(items) => {
                let names = items
                    .into_iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => Ok(s),
                        other => anyhow::bail!("Class name must be a string, got {}", other),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::from_names(names))
            }
            serde_json::Value::Object(map) => {
                let mut names = BTreeMap::new();
                for (key, v) in map {
                    let index: usize = key
                        .parse()
                        .with_context(|| format!("Invalid class index '{}'", key))?;
                    let name = v
                        .as_str()
                        .with_context(|| format!("Class name for {} must be a string", index))?;
                    names.insert(index, name.to_string());
                }
                Ok(Self { names })
            }
            _ => anyhow::bail!("Class names must be a JSON array or object"),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read class names from {}", path.display()))?;
        Self::from_json(&raw)
    }
}

/// A loaded object detector
///
/// Implementations must be safe to call from several blocking tasks at once.
pub trait DetectionModel: Send + Sync {
    /// Short identifier reported by `/health`
    fn name(&self) -> String;

    /// Run detection on the image stored at `path`
    fn predict(&self, path: &Path, config: &DetectionConfig) -> Result<RawDetections>;

    fn class_table(&self) -> &ClassTable;
}
