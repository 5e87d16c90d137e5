// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection head decoding and non-maximum suppression

use anyhow::Result;
use ndarray::{Array2, ArrayView2, ArrayViewD, Axis, Ix3};
use tracing::warn;

/// Maximum candidates entering NMS to bound CPU time
pub const MAX_NMS_CANDIDATES: usize = 30_000;

/// A scored box in model input space, before NMS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// `[x1, y1, x2, y2]`
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_index: usize,
}

/// Normalize a `[1, 4+nc, N]` or `[1, N, 4+nc]` head to `[N, 4+nc]` rows
///
/// When `num_classes` is unknown the feature axis is taken to be the
/// smaller of the two, which holds for every YOLOv8-style export.
pub fn output_to_rows(output: ArrayViewD<f32>, num_classes: Option<usize>) -> Result<Array2<f32>> {
    let output = output
        .into_dimensionality::<Ix3>()
        .map_err(|_| anyhow::anyhow!("Expected a 3D detection output"))?;
    let (batch, d1, d2) = output.dim();

    if batch != 1 {
        anyhow::bail!("Expected batch size 1, got {}", batch);
    }

    let features_first = match num_classes {
        Some(nc) if d1 == nc + 4 => true,
        Some(nc) if d2 == nc + 4 => false,
        Some(nc) => anyhow::bail!(
            "Output shape [1, {}, {}] does not match {} classes",
            d1,
            d2,
            nc
        ),
        None => d1 <= d2,
    };

    let plane = output.index_axis(Axis(0), 0);
    let rows = if features_first {
        plane.t().to_owned()
    } else {
        plane.to_owned()
    };

    if rows.ncols() < 5 {
        anyhow::bail!("Detection output has only {} features", rows.ncols());
    }

    Ok(rows)
}

/// Turn `[cx, cy, w, h, class scores...]` rows into scored boxes
pub fn decode_candidates(rows: ArrayView2<f32>, confidence_threshold: f32) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for row in rows.rows() {
        let (class_index, confidence) = row
            .iter()
            .skip(4)
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |(best_idx, best), (idx, &score)| {
                if score > best {
                    (idx, score)
                } else {
                    (best_idx, best)
                }
            });

        if !confidence.is_finite() || confidence < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) {
            continue;
        }
        if w < 0.0 || h < 0.0 {
            continue;
        }

        candidates.push(Candidate {
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            confidence: confidence.min(1.0),
            class_index,
        });
    }

    candidates
}

/// Intersection over union of two xyxy boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;

    if union > f32::EPSILON {
        inter / union
    } else {
        0.0
    }
}

/// Greedy NMS, highest confidence first
///
/// Boxes of different classes never suppress each other unless
/// `class_agnostic` is set. The result is in descending confidence order
/// and holds at most `max_detections` entries.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    class_agnostic: bool,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    if candidates.len() > MAX_NMS_CANDIDATES {
        warn!(
            "NMS input truncated from {} to {} candidates",
            candidates.len(),
            MAX_NMS_CANDIDATES
        );
        candidates.truncate(MAX_NMS_CANDIDATES);
    }

    let mut suppressed = vec![false; candidates.len()];
    let mut kept = Vec::new();

    for i in 0..candidates.len() {
        if kept.len() >= max_detections {
            break;
        }
        if suppressed[i] {
            continue;
        }

        let current = candidates[i];
        kept.push(current);

        for j in (i + 1)..candidates.len() {
            if suppressed[j] {
                continue;
            }
            let other = &candidates[j];
            if !class_agnostic && other.class_index != current.class_index {
                continue;
            }
            if iou(&current.bbox, &other.bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    kept
}
