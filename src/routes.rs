//! HTTP surface: the upload endpoint plus liveness routes.
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::classifier::Classifier;
use crate::error::ClassifyError;
use crate::model::{Classification, ImagePayload};

pub struct AppState {
    pub classifier: Classifier,
}

const IMAGE_FIELD: &str = "image";

pub fn router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/predict-waste", post(predict_waste))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(state)
        .route("/", get(root))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn predict_waste(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ClassifyError> {
    let image = read_image(&mut multipart).await?;

    let response = match state.classifier.classify(&image).await? {
        Classification::Live(result) | Classification::Fallback(result) => {
            Json(result).into_response()
        }
        Classification::ParseFailure(failure) => Json(json!({
            "error": "Failed to parse AI response",
            "raw_content": failure.raw,
        }))
        .into_response(),
    };

    Ok(response)
}

async fn read_image(multipart: &mut Multipart) -> Result<ImagePayload, ClassifyError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let content_type = field.content_type().map(String::from);
            let bytes = field.bytes().await.map_err(upload_error)?;
            return ImagePayload::new(bytes, content_type.as_deref());
        }
    }

    Err(ClassifyError::InvalidInput(format!(
        "missing multipart field '{}'",
        IMAGE_FIELD
    )))
}

fn upload_error(e: MultipartError) -> ClassifyError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ClassifyError::PayloadTooLarge(e.body_text())
    } else {
        ClassifyError::InvalidInput(format!("unreadable upload: {}", e))
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Waste Sorter API is running" }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}
