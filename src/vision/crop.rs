// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crop engine
//!
//! Cuts one rectangular region per [`Tag`] out of a source image and returns
//! each as base64-encoded PNG, in tag order.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::image_utils::encode_png_base64;
use crate::error::PipelineError;

/// A region to cut, in source pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(rename = "type")]
    pub tag_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Error)]
#[error("Invalid crop region for tag {index} ('{name}'): {reason}")]
pub struct CropBoundsError {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// One encoded region
///
/// `base64` is empty when the clamped region has no pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub base64: String,
}

impl CroppedImage {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Integer pixel rectangle after rounding and clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl Tag {
    fn validate(&self, index: usize) -> Result<(), CropBoundsError> {
        let reject = |reason: String| CropBoundsError {
            index,
            name: self.name.clone(),
            reason,
        };

        for (field, value) in [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ] {
            if !value.is_finite() {
                return Err(reject(format!("{} is not a finite number", field)));
            }
        }
        if self.width < 0.0 {
            return Err(reject(format!("width {} is negative", self.width)));
        }
        if self.height < 0.0 {
            return Err(reject(format!("height {} is negative", self.height)));
        }
        Ok(())
    }

    /// Round edges half-to-even and clamp them to a `width` x `height` image
    pub fn to_rect(&self, width: u32, height: u32) -> CropRect {
        let edge = |v: f64, max: u32| -> u32 { (v.round_ties_even().max(0.0) as u32).min(max) };

        let left = edge(self.x, width);
        let top = edge(self.y, height);
        let right = edge(self.x + self.width, width).max(left);
        let bottom = edge(self.y + self.height, height).max(top);

        CropRect {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Check every tag before any pixel work
pub fn validate_tags(tags: &[Tag]) -> Result<(), CropBoundsError> {
    tags.iter()
        .enumerate()
        .try_for_each(|(index, tag)| tag.validate(index))
}

/// Crop every tag out of `source`
///
/// Partially out-of-bounds regions are clamped. A region with no pixels
/// left yields an empty string so positions still line up with `tags`.
pub fn crop(source: &DynamicImage, tags: &[Tag]) -> Result<Vec<CroppedImage>, PipelineError> {
    validate_tags(tags)?;

    let (img_w, img_h) = (source.width(), source.height());
    let mut crops = Vec::with_capacity(tags.len());

    for (index, tag) in tags.iter().enumerate() {
        let rect = tag.to_rect(img_w, img_h);

        if rect.is_empty() {
            warn!(
                "Tag {} ('{}') has no pixels inside the {}x{} image, returning empty crop",
                index, tag.name, img_w, img_h
            );
            crops.push(CroppedImage {
                name: tag.name.clone(),
                width: 0,
                height: 0,
                base64: String::new(),
            });
            continue;
        }

        let region = source.crop_imm(rect.left, rect.top, rect.width(), rect.height());
        let base64 = encode_png_base64(&region)
            .map_err(|e| PipelineError::ImageEncode(e.to_string()))?;

        debug!(
            "Cropped tag {} ('{}', {}): {}x{} at ({}, {})",
            index,
            tag.name,
            tag.tag_type,
            rect.width(),
            rect.height(),
            rect.left,
            rect.top
        );

        crops.push(CroppedImage {
            name: tag.name.clone(),
            width: rect.width(),
            height: rect.height(),
            base64,
        });
    }

    Ok(crops)
}
