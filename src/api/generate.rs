//! `POST /api/tableau/aiGenerate`: forward a JSON payload to the
//! text-generation endpoint.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::generation::GenerationError;
use crate::http::{ApiError, AppState};

const GENERATION_FAILED: &str = "Failed to generate chart type";

pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };

    match state.generation.forward(&payload).await {
        Ok(reply) => {
            let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
            let content_type = reply
                .content_type
                .unwrap_or_else(|| "application/json".to_string());
            (status, [(header::CONTENT_TYPE, content_type)], Body::from(reply.body)).into_response()
        }
        Err(GenerationError::Upstream { status, details }) => {
            tracing::error!(status, details = %details, "Generation call failed");
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "error": GENERATION_FAILED, "details": details }))).into_response()
        }
        Err(e @ GenerationError::Transport(_)) => {
            tracing::error!(error = %e, "Generation call failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": GENERATION_FAILED, "details": e.to_string() })),
            )
                .into_response()
        }
    }
}
