// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Form-field detection endpoints
//!
//! Provides POST /predict/ for multipart uploads and GET /predict?url= for
//! remote images.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{predict_upload_handler, predict_url_handler};
pub use request::{read_upload, PredictQuery, UPLOAD_FIELD};
pub use response::PredictResponse;
