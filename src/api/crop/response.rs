// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crop response types

use serde::{Deserialize, Serialize};

use crate::vision::crop::CroppedImage;

/// One base64 PNG per requested tag, in request order
///
/// A tag whose region has no pixels inside the image gets `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropResponse {
    pub base64s: Vec<String>,
}

impl From<Vec<CroppedImage>> for CropResponse {
    fn from(crops: Vec<CroppedImage>) -> Self {
        Self {
            base64s: crops.into_iter().map(|c| c.base64).collect(),
        }
    }
}
