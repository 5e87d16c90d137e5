// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Turns native detector output into the service's detection result

use serde::Serialize;
use tracing::debug;

use super::detector::{ClassTable, RawDetections};
use super::invoker::DetectionFailure;
use crate::error::PipelineError;

/// One detected object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in absolute pixels
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_index: usize,
    pub class_name: String,
}

/// Detections in the order the detector emitted them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Resolve class names and zip the parallel arrays into [`Detection`]s
///
/// Coordinates and confidences pass through unchanged. The order is
/// never altered.
pub fn normalize(raw: RawDetections, classes: &ClassTable) -> Result<DetectionResult, PipelineError> {
    let RawDetections {
        boxes,
        confidences,
        class_indices,
    } = raw;

    if boxes.len() != confidences.len() || boxes.len() != class_indices.len() {
        return Err(DetectionFailure::new(format!(
            "misaligned detector output: {} boxes, {} confidences, {} classes",
            boxes.len(),
            confidences.len(),
            class_indices.len()
        ))
        .into());
    }

    let detections = boxes
        .into_iter()
        .zip(confidences)
        .zip(class_indices)
        .map(|((bbox, confidence), class_index)| {
            let class_name = classes
                .get(class_index)
                .ok_or(PipelineError::UnknownClassIndex {
                    index: class_index,
                    table_len: classes.len(),
                })?
                .to_string();
            Ok(Detection {
                bbox,
                confidence,
                class_index,
                class_name,
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    debug!("Normalized {} detections", detections.len());

    Ok(DetectionResult { detections })
}
