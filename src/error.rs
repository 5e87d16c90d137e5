// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request pipeline error taxonomy
//!
//! Every failure on the detection or crop path ends up as one of these
//! variants. The HTTP boundary (`api::errors`) is the only place they are
//! turned into status codes.

use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::staging::StagingError;
use crate::vision::crop::CropBoundsError;
use crate::vision::invoker::DetectionFailure;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Detection(#[from] DetectionFailure),

    /// The detector produced a class index the class table does not know.
    #[error("Unknown class index {index} (class table has {table_len} entries)")]
    UnknownClassIndex { index: usize, table_len: usize },

    #[error(transparent)]
    CropBounds(#[from] CropBoundsError),

    #[error("Failed to decode source image: {0}")]
    ImageDecode(String),

    #[error("Failed to encode cropped image: {0}")]
    ImageEncode(String),
}

impl PipelineError {
    /// Short machine-readable tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Acquisition(_) => "acquisition",
            PipelineError::Staging(_) => "staging",
            PipelineError::Detection(_) => "detection",
            PipelineError::UnknownClassIndex { .. } => "unknown_class_index",
            PipelineError::CropBounds(_) => "crop_bounds",
            PipelineError::ImageDecode(_) => "image_decode",
            PipelineError::ImageEncode(_) => "image_encode",
        }
    }
}
