use crate::utils::error::VisionError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
};

/// Pulls the `file` field out of a multipart image upload.
///
/// Rejections surface as the usual `{"detail": ...}` client error, matching
/// every other request failure.
pub struct ImageUpload(pub Bytes);

#[async_trait]
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = VisionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| VisionError::InvalidInput(format!("Expected multipart form data: {}", e)))?;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            VisionError::InvalidInput(format!("Failed to read multipart field: {}", e))
        })? {
            if field.name() != Some("file") {
                tracing::debug!("Ignoring unknown field: {:?}", field.name());
                continue;
            }

            if let Some(content_type) = field.content_type() {
                if !content_type.starts_with("image/") {
                    return Err(VisionError::InvalidInput(format!(
                        "Unsupported content type: {}",
                        content_type
                    )));
                }
            }

            let data = field.bytes().await.map_err(|e| {
                VisionError::InvalidInput(format!("Failed to read file data: {}", e))
            })?;

            if data.is_empty() {
                return Err(VisionError::InvalidInput("Empty file".to_string()));
            }

            tracing::debug!("Received file: {} bytes", data.len());
            return Ok(ImageUpload(data));
        }

        Err(VisionError::InvalidInput(
            "No image file provided".to_string(),
        ))
    }
}
