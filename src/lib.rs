// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod acquisition;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod staging;
pub mod version;
pub mod vision;

pub use acquisition::{AcquisitionError, ImageAcquirer, RawImage};
pub use config::ServiceConfig;
pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use staging::{StagedImage, StagingError, StagingStore};
