use crate::config::OnnxConfig;
use crate::models::{GlaucomaClassifier, OpticDiscDetector};
use crate::utils::error::VisionError;
use crate::{Config, Result};
use std::sync::Arc;

/// Process-wide immutable model handles, populated once at startup.
///
/// Each model loads independently; a failure leaves the corresponding handle
/// empty and the endpoint rejects requests with a client error. There is no
/// retry or reload.
pub struct ModelRegistry {
    detector: Option<Arc<OpticDiscDetector>>,
    classifier: Option<Arc<GlaucomaClassifier>>,
    onnx_config: OnnxConfig,
}

impl ModelRegistry {
    pub fn load(config: &Config) -> Self {
        tracing::info!("Loading models from: {}", config.models_dir.display());

        let detector = match OpticDiscDetector::new(config) {
            Ok(detector) => {
                tracing::info!("Optic disc detection model loaded successfully");
                Some(Arc::new(detector))
            }
            Err(e) => {
                tracing::error!("Failed to load optic disc detection model: {}", e);
                None
            }
        };

        let classifier = match GlaucomaClassifier::new(config) {
            Ok(classifier) => {
                tracing::info!("Glaucoma classification model loaded successfully");
                Some(Arc::new(classifier))
            }
            Err(e) => {
                tracing::error!("Failed to load glaucoma classification model: {}", e);
                None
            }
        };

        Self {
            detector,
            classifier,
            onnx_config: config.onnx_config.clone(),
        }
    }

    pub fn detector(&self) -> Result<Arc<OpticDiscDetector>> {
        self.detector
            .clone()
            .ok_or(VisionError::ModelUnavailable("optic disc detection"))
    }

    pub fn classifier(&self) -> Result<Arc<GlaucomaClassifier>> {
        self.classifier
            .clone()
            .ok_or(VisionError::ModelUnavailable("glaucoma classification"))
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            detector_loaded: self.detector.is_some(),
            classifier_loaded: self.classifier.is_some(),
            intra_threads: self.onnx_config.intra_threads,
            optimization_level: self.onnx_config.optimization_level,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub detector_loaded: bool,
    pub classifier_loaded: bool,
    pub intra_threads: usize,
    pub optimization_level: i32,
}
