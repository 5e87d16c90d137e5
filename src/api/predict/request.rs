// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection request types

use axum_extra::extract::Multipart;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::acquisition::AcquisitionError;

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

/// Query string of `GET /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictQuery {
    /// Image to fetch and run detection on
    pub url: String,
}

/// Read the uploaded image out of a multipart body
///
/// Takes the field named `file`. Without one, the first field that carries
/// a filename is used instead.
pub async fn read_upload(mut multipart: Multipart) -> Result<Bytes, AcquisitionError> {
    let mut fallback: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AcquisitionError::Upload(e.to_string()))?
    {
        let is_file_field = field.name() == Some(UPLOAD_FIELD);
        let has_filename = field.file_name().is_some();

        if !is_file_field && (fallback.is_some() || !has_filename) {
            continue;
        }

        debug!(
            "Reading multipart field {:?} (filename {:?})",
            field.name(),
            field.file_name()
        );

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AcquisitionError::Upload(e.to_string()))?;

        if is_file_field {
            return Ok(bytes);
        }
        fallback = Some(bytes);
    }

    fallback.ok_or(AcquisitionError::MissingFile)
}
