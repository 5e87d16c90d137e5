// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod crop;
pub mod errors;
pub mod health;
pub mod http_server;
pub mod predict;

pub use crop::{crop_handler, CropRequest, CropResponse};
pub use errors::{ApiError, ErrorResponse};
pub use health::{health_handler, HealthResponse};
pub use http_server::{create_app, start_server, AppState};
pub use predict::{predict_upload_handler, predict_url_handler, PredictQuery, PredictResponse};
