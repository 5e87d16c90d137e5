// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Defaults, then an optional TOML file, then CLI flags and environment
//! variables (see `cli`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::acquisition::DEFAULT_MAX_IMAGE_BYTES;
use crate::staging::StagingStore;
use crate::vision::detector::DetectionConfig;
use crate::vision::preprocessing::DEFAULT_INPUT_SIZE;
use crate::vision::yolo::YoloModelConfig;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL_PATH: &str = "./models/web-form-ui-field-detection.onnx";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INTRA_THREADS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// ONNX detection model
    pub model_path: PathBuf,
    /// Optional JSON class names, overriding the model metadata
    pub class_names_path: Option<PathBuf>,
    /// Where staged detector inputs are written (OS temp dir when unset)
    pub staging_dir: Option<PathBuf>,
    /// Per-image size limit for uploads and fetches
    pub max_image_bytes: usize,
    pub fetch_timeout_secs: u64,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
    /// Square model input size
    pub input_size: u32,
    pub detection: DetectionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            class_names_path: None,
            staging_dir: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            intra_threads: DEFAULT_INTRA_THREADS,
            input_size: DEFAULT_INPUT_SIZE,
            detection: DetectionConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ServiceConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.detection
            .validate()
            .context("Invalid detection settings")?;

        if self.max_image_bytes == 0 {
            anyhow::bail!("max_image_bytes must be greater than 0");
        }
        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be greater than 0");
        }
        if self.intra_threads == 0 {
            anyhow::bail!("intra_threads must be at least 1");
        }
        if self.input_size == 0 || self.input_size % 32 != 0 {
            anyhow::bail!("input_size must be a positive multiple of 32, got {}", self.input_size);
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn model_config(&self) -> YoloModelConfig {
        YoloModelConfig {
            model_path: self.model_path.clone(),
            class_names_path: self.class_names_path.clone(),
            input_size: self.input_size,
            intra_threads: self.intra_threads,
        }
    }

    pub fn staging_store(&self) -> StagingStore {
        match self.staging_dir {
            Some(ref dir) => StagingStore::new(dir),
            None => StagingStore::in_temp_dir(),
        }
    }
}
