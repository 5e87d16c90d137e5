// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::{Multipart, WithRejection};
use tracing::{debug, info};

use super::request::{read_upload, PredictQuery};
use super::response::PredictResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::error::PipelineError;

/// POST /predict/ - Detect form fields in an uploaded image
///
/// # Request
/// - multipart field `file`: the image bytes
///
/// # Response
/// - `boxes`: `[x1, y1, x2, y2]` per detection, in pixels
/// - `confs`: confidence per detection
/// - `cls`: class index per detection
/// - `names`: class name per detection
///
/// # Errors
/// - 4xx: `{detail}` when the body is not multipart
/// - 500 Internal Server Error: `{detail}` for any acquisition, staging or
///   detection failure
pub async fn predict_upload_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<Json<PredictResponse>, ApiError> {
    debug!("Predict request received (upload)");

    // 1. Read the multipart body
    let bytes = read_upload(multipart).await.map_err(PipelineError::from)?;

    // 2. Acquire, stage, detect, release
    let result = state.pipeline.predict_upload(bytes).await?;

    info!("Predict (upload) complete: {} detections", result.len());

    Ok(Json(PredictResponse::from(result)))
}

/// GET /predict?url= - Detect form fields in a remote image
///
/// Same response and errors as the upload variant. A missing `url` query is
/// a 400 with `{detail}`. The image is fetched with a single GET, no retries.
pub async fn predict_url_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<PredictQuery>, ApiError>,
) -> Result<Json<PredictResponse>, ApiError> {
    debug!("Predict request received for url: {}", query.url);

    let result = state.pipeline.predict_url(&query.url).await?;

    info!(
        "Predict (url) complete: {} detections for {}",
        result.len(),
        query.url
    );

    Ok(Json(PredictResponse::from(result)))
}
