// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crop request types

use serde::{Deserialize, Serialize};

use crate::vision::crop::Tag;

/// Body of `POST /crop/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRequest {
    /// Source image location
    pub url: String,
    /// Regions to cut, answered in the same order
    pub tags: Vec<Tag>,
}
