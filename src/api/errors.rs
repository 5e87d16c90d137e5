// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP error boundary
//!
//! Pipeline errors and extractor rejections become `{"detail": "<message>"}`
//! bodies here and nowhere else.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::multipart::MultipartRejection;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// The request reached the pipeline and failed there
    Pipeline(PipelineError),
    /// The request was rejected before reaching a handler body
    InvalidRequest { status: StatusCode, message: String },
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            detail: self.to_string(),
        }
    }

    /// Pipeline failures are server errors; extractor rejections keep their 4xx
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Pipeline(
                PipelineError::Acquisition(_)
                | PipelineError::Staging(_)
                | PipelineError::Detection(_)
                | PipelineError::UnknownClassIndex { .. }
                | PipelineError::CropBounds(_)
                | PipelineError::ImageDecode(_)
                | PipelineError::ImageEncode(_),
            ) => 500,
            ApiError::InvalidRequest { status, .. } => status.as_u16(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Pipeline(err) => err.kind(),
            ApiError::InvalidRequest { .. } => "invalid_request",
        }
    }

    fn rejected<R>(rejection: R) -> Self
    where
        R: IntoResponse + fmt::Display,
    {
        let message = rejection.to_string();
        let status = rejection.into_response().status();
        ApiError::InvalidRequest { status, message }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection)
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::rejected(rejection)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Pipeline(err) => write!(f, "{}", err),
            ApiError::InvalidRequest { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        warn!("Request failed ({}): {}", self.kind(), self);

        (status, Json(self.to_response())).into_response()
    }
}
