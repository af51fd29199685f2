//! End-to-end tests against the router, without real model files on disk:
//! both model handles stay empty, which is exactly the degraded mode the
//! service promises to keep running in.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use retina_vision::config::Config;
use retina_vision::models::ModelRegistry;
use retina_vision::storage::StaticStore;
use retina_vision::web::create_app;
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(static_dir: &std::path::Path) -> Router {
    let config = Config::new(
        "127.0.0.1:0".to_string(),
        "no-such-models-dir",
        static_dir,
        false,
    );
    let models = Arc::new(ModelRegistry::load(&config));
    let store = StaticStore::new(&config.static_dir).unwrap();
    create_app(config, models, store)
}

fn multipart_request(uri: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "retina-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"upload.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn detect_without_model_returns_400_naming_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(multipart_request(
            "/api/detect-optic-disc",
            "image/jpeg",
            b"placeholder",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("optic disc detection"), "detail: {detail}");
}

#[tokio::test]
async fn diagnosis_without_model_returns_400_naming_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(multipart_request(
            "/api/diagnosis-glaucoma",
            "image/jpeg",
            b"placeholder",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("glaucoma classification"), "detail: {detail}");
}

#[tokio::test]
async fn non_image_upload_is_rejected_not_crashed() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(multipart_request(
            "/api/diagnosis-glaucoma",
            "application/octet-stream",
            b"\x00\x01\x02 not an image",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn missing_file_field_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let boundary = "retina-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/detect-optic-disc")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("No image file"));
}

#[tokio::test]
async fn non_multipart_request_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let request = Request::builder()
        .method("POST")
        .uri("/api/detect-optic-disc")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_model_availability() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["models"]["detector_loaded"], false);
    assert_eq!(body["models"]["classifier_loaded"], false);
}

#[tokio::test]
async fn info_exposes_model_stats() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let request = Request::builder()
        .uri("/api/info")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["service"], "Retina Vision Service");
    assert_eq!(body["models"]["detector_loaded"], false);
}

#[tokio::test]
async fn stored_images_are_served_from_static() {
    let dir = tempfile::tempdir().unwrap();
    let store = StaticStore::new(dir.path()).unwrap();
    let image = image::RgbImage::new(4, 4);
    let stored = store.save_jpeg("original", 123, &image).unwrap();

    let app = test_app(dir.path());
    let request = Request::builder()
        .uri(stored.url.as_str())
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!bytes.is_empty());
}
