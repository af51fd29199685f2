use crate::image::{annotate, ImageLoader};
use crate::models::Detection;
use crate::storage::StaticStore;
use crate::web::{extractors::ImageUpload, AppState};
use crate::Result;
use axum::{extract::State, response::Json};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub original_image_url: String,
    pub result_image_url: String,
    pub detections: Vec<Detection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResponse {
    pub is_positive: bool,
    /// Softmax probability of the predicted class, in percent (0-100)
    pub confidence: f32,
}

/// `POST /api/detect-optic-disc`
///
/// Decodes the upload, persists the original, runs detection, draws the
/// boxes on a copy and persists that too. Two files are written per
/// successful call.
pub async fn detect_optic_disc(
    State(state): State<AppState>,
    ImageUpload(data): ImageUpload,
) -> Result<Json<DetectResponse>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4();

    tracing::info!(
        "Processing optic disc detection: request_id={}, {} bytes",
        request_id,
        data.len()
    );

    let detector = state.models.detector()?;
    let image = ImageLoader::from_bytes(&data)?;

    let timestamp = StaticStore::timestamp_millis();
    let original = state.store.save_jpeg("original", timestamp, &image)?;

    let detections = detector.detect(&image)?;

    let annotated = annotate::draw_detections(&image, &detections);
    let result = state.store.save_jpeg("result", original.timestamp, &annotated)?;

    tracing::info!(
        "Detection completed: request_id={}, boxes={}, time={:.3}s",
        request_id,
        detections.len(),
        start.elapsed().as_secs_f32()
    );

    Ok(Json(DetectResponse {
        original_image_url: original.url,
        result_image_url: result.url,
        detections,
    }))
}

/// `POST /api/diagnosis-glaucoma`
///
/// Decodes the upload and runs the binary classifier. Nothing is persisted.
pub async fn diagnosis_glaucoma(
    State(state): State<AppState>,
    ImageUpload(data): ImageUpload,
) -> Result<Json<DiagnosisResponse>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4();

    tracing::info!(
        "Processing glaucoma diagnosis: request_id={}, {} bytes",
        request_id,
        data.len()
    );

    let classifier = state.models.classifier()?;
    let image = ImageLoader::from_bytes(&data)?;

    let diagnosis = classifier.predict(&image)?;

    tracing::info!(
        "Diagnosis completed: request_id={}, positive={}, confidence={:.2}%, time={:.3}s",
        request_id,
        diagnosis.is_positive,
        diagnosis.confidence,
        start.elapsed().as_secs_f32()
    );

    Ok(Json(DiagnosisResponse {
        is_positive: diagnosis.is_positive,
        confidence: diagnosis.confidence,
    }))
}
