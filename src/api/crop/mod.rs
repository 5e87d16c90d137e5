// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crop endpoint module
//!
//! Provides POST /crop/ for cutting tagged regions out of a remote image.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::crop_handler;
pub use request::CropRequest;
pub use response::CropResponse;
