// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::ServiceConfig;

/// Form Field Detector
#[derive(Parser, Debug, Default)]
#[command(name = "form-field-detector")]
#[command(version)]
#[command(about = "HTTP service that detects form fields in images and crops tagged regions", long_about = None)]
pub struct Cli {
    /// TOML config file; flags and environment variables override it
    #[arg(long, env = "FFD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<SocketAddr>,

    /// ONNX detection model
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// JSON class names (overrides model metadata)
    #[arg(long, env = "CLASS_NAMES_PATH")]
    pub class_names_path: Option<PathBuf>,

    /// Directory for staged detector inputs
    #[arg(long, env = "STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Maximum image size in bytes
    #[arg(long, env = "MAX_IMAGE_BYTES")]
    pub max_image_bytes: Option<usize>,

    /// Timeout for fetching remote images, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "ORT_INTRA_THREADS")]
    pub intra_threads: Option<usize>,

    /// Square model input size
    #[arg(long, env = "MODEL_INPUT_SIZE")]
    pub input_size: Option<u32>,

    /// Minimum detection confidence
    #[arg(long, env = "CONF_THRESHOLD")]
    pub conf_threshold: Option<f32>,

    /// IoU threshold for duplicate suppression
    #[arg(long, env = "IOU_THRESHOLD")]
    pub iou_threshold: Option<f32>,

    /// Suppress overlapping boxes regardless of class
    #[arg(long, env = "AGNOSTIC_NMS")]
    pub agnostic_nms: Option<bool>,

    /// Maximum detections per image
    #[arg(long, env = "MAX_DET")]
    pub max_det: Option<usize>,
}

impl Cli {
    /// Build the effective configuration
    ///
    /// Starts from the config file (or defaults), applies every flag that
    /// was given and validates the result.
    pub fn into_config(self) -> Result<ServiceConfig> {
        let mut config = match self.config {
            Some(ref path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(path) = self.model_path {
            config.model_path = path;
        }
        if let Some(path) = self.class_names_path {
            config.class_names_path = Some(path);
        }
        if let Some(dir) = self.staging_dir {
            config.staging_dir = Some(dir);
        }
        if let Some(bytes) = self.max_image_bytes {
            config.max_image_bytes = bytes;
        }
        if let Some(secs) = self.fetch_timeout_secs {
            config.fetch_timeout_secs = secs;
        }
        if let Some(threads) = self.intra_threads {
            config.intra_threads = threads;
        }
        if let Some(size) = self.input_size {
            config.input_size = size;
        }
        if let Some(conf) = self.conf_threshold {
            config.detection.confidence_threshold = conf;
        }
        if let Some(iou) = self.iou_threshold {
            config.detection.iou_threshold = iou;
        }
        if let Some(agnostic) = self.agnostic_nms {
            config.detection.class_agnostic = agnostic;
        }
        if let Some(max_det) = self.max_det {
            config.detection.max_detections = max_det;
        }

        config.validate()?;
        Ok(config)
    }
}
