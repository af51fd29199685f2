use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,

    /// Directory holding the exported ONNX model files
    pub models_dir: PathBuf,

    /// Directory where original and annotated images are persisted
    pub static_dir: PathBuf,

    /// Development mode
    pub dev_mode: bool,

    /// ONNX Runtime tuning
    pub onnx_config: OnnxConfig,

    /// HTTP server tuning
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU threads per session
    pub intra_threads: usize,

    /// Graph optimization level
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: impl Into<PathBuf>,
        static_dir: impl Into<PathBuf>,
        dev_mode: bool,
    ) -> Self {
        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1),
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 50 * 1024 * 1024, // 50MB
        };

        Self {
            bind_addr,
            models_dir: models_dir.into(),
            static_dir: static_dir.into(),
            dev_mode,
            onnx_config,
            server_config,
        }
    }

    /// Optic disc detection model (YOLO export)
    pub fn detector_model_path(&self) -> PathBuf {
        self.models_dir.join("best.onnx")
    }

    /// Glaucoma classification model (ResNet-50 export, two output classes)
    pub fn classifier_model_path(&self) -> PathBuf {
        self.models_dir.join("fold_4_last.onnx")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_paths_live_under_models_dir() {
        let config = Config::new("0.0.0.0:8000".to_string(), "models", "static", false);
        assert_eq!(config.detector_model_path(), PathBuf::from("models/best.onnx"));
        assert_eq!(
            config.classifier_model_path(),
            PathBuf::from("models/fold_4_last.onnx")
        );
    }

    #[test]
    fn dev_mode_extends_timeout() {
        let dev = Config::new("0.0.0.0:8000".to_string(), "models", "static", true);
        let prod = Config::new("0.0.0.0:8000".to_string(), "models", "static", false);
        assert!(dev.server_config.request_timeout > prod.server_config.request_timeout);
    }
}
