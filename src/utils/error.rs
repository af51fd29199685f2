use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("{0} model is not loaded")]
    ModelUnavailable(&'static str),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Request-level failures (missing model, bad upload, inference errors)
    /// are all surfaced as client errors; only infrastructure faults are 5xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            VisionError::ModelUnavailable(_) => StatusCode::BAD_REQUEST,
            VisionError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            VisionError::Inference(_) => StatusCode::BAD_REQUEST,
            VisionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            VisionError::Ort(_) => StatusCode::BAD_REQUEST,
            VisionError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            VisionError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for VisionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "detail": self.to_string() });

        tracing::error!("Request failed: {} ({})", self, status);

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failures_are_client_errors() {
        assert_eq!(
            VisionError::ModelUnavailable("optic disc detection").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            VisionError::Inference("bad tensor".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            VisionError::InvalidInput("no file".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unavailable_model_message_names_the_model() {
        let err = VisionError::ModelUnavailable("glaucoma classification");
        assert!(err.to_string().contains("glaucoma classification"));
    }
}
