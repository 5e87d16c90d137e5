// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Vision Model Manager tests
//!
//! These tests verify that the VisionModelManager correctly:
//! - Fails loudly when the detector cannot be loaded
//! - Reports model information for /health
//! - Loads a real ONNX export when one is available (ignored by default)

use form_field_detector::vision::{
    ClassTable, DetectionConfig, DetectionModel, VisionModelManager, YoloModelConfig,
};
use std::io::Write;
use std::path::PathBuf;

// Model path (downloaded by download scripts)
const MODEL_PATH: &str = "/workspace/models/web-form-ui-field-detection.onnx";

#[cfg(test)]
mod model_manager_tests {
    use super::*;

    /// Test 1: Default config points at the bundled detector
    #[test]
    fn test_default_config_has_expected_paths() {
        let config = YoloModelConfig::default();

        assert!(config
            .model_path
            .to_string_lossy()
            .contains("web-form-ui-field-detection"));
        assert_eq!(config.input_size, 640);
    }

    /// Test 2: Missing model file is an error, not a silent fallback
    #[tokio::test]
    async fn test_missing_model_is_error() {
        let config = YoloModelConfig {
            model_path: PathBuf::from("/nonexistent/model.onnx"),
            ..Default::default()
        };

        let result = VisionModelManager::new(&config).await;
        assert!(result.is_err());
    }

    /// Test 3: Invalid ONNX bytes fail at session creation
    #[tokio::test]
    async fn test_corrupt_model_is_error() {
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(b"this is not an onnx graph").unwrap();

        let config = YoloModelConfig {
            model_path: file.path().to_path_buf(),
            ..Default::default()
        };

        let result = VisionModelManager::new(&config).await;
        assert!(result.is_err());
    }

    /// Test 4: Class names file parses both supported shapes
    #[test]
    fn test_class_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["button", "checkbox", "radio", "text field"]"#).unwrap();

        let table = ClassTable::from_json_file(file.path()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(3), Some("text field"));
    }

    /// Test 5: Real model loads and reports its classes
    #[tokio::test]
    #[ignore] // Only run if model files are downloaded
    async fn test_load_real_model() {
        let config = YoloModelConfig {
            model_path: PathBuf::from(MODEL_PATH),
            ..Default::default()
        };

        let manager = match VisionModelManager::new(&config).await {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Skipping: {:#}", e);
                return;
            }
        };

        let info = manager.info();
        assert_eq!(info.name, "web-form-ui-field-detection");
        assert!(info.classes > 0);

        // A blank page has no form fields
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blank.png");
        image::RgbImage::from_pixel(320, 240, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let raw = manager
            .get_model()
            .predict(&path, &DetectionConfig::default())
            .unwrap();
        assert!(raw.is_empty());
    }
}
