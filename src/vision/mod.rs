// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for form screenshots
//!
//! This module provides:
//! - Form-field detection via a YOLO ONNX export (CPU)
//! - Region cropping to base64 PNG

pub mod crop;
pub mod detector;
pub mod image_utils;
pub mod invoker;
pub mod model_manager;
pub mod normalizer;
pub mod postprocess;
pub mod preprocessing;
pub mod yolo;

pub use crop::{crop, CropBoundsError, CroppedImage, Tag};
pub use detector::{ClassTable, DetectionConfig, DetectionModel, RawDetections};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use invoker::{DetectionFailure, DetectionInvoker};
pub use model_manager::{VisionModelInfo, VisionModelManager};
pub use normalizer::{normalize, Detection, DetectionResult};
pub use yolo::{YoloDetectionModel, YoloModelConfig};
