// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use serde::{Deserialize, Serialize};

use crate::vision::normalizer::DetectionResult;

/// Four index-aligned lists, one entry per detection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// `[x1, y1, x2, y2]` in pixels of the submitted image
    pub boxes: Vec<[f32; 4]>,
    /// Confidence scores (0.0-1.0)
    pub confs: Vec<f32>,
    /// Class indices
    pub cls: Vec<usize>,
    /// Class names
    pub names: Vec<String>,
}

impl PredictResponse {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl From<DetectionResult> for PredictResponse {
    fn from(result: DetectionResult) -> Self {
        let mut response = PredictResponse {
            boxes: Vec::with_capacity(result.len()),
            confs: Vec::with_capacity(result.len()),
            cls: Vec::with_capacity(result.len()),
            names: Vec::with_capacity(result.len()),
        };

        for detection in result.detections {
            response.boxes.push(detection.bbox);
            response.confs.push(detection.confidence);
            response.cls.push(detection.class_index);
            response.names.push(detection.class_name);
        }

        response
    }
}
