use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{PreferenceSet, RecommendationResult},
};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Recommend books for the submitted preferences
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<PreferenceSet>, JsonRejection>,
) -> AppResult<Json<RecommendationResult>> {
    let Json(preferences) =
        payload.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;

    let result = state.recommendations.recommend(&preferences).await?;
    Ok(Json(result))
}

/// Fallback for any method other than POST on the recommendations route
pub async fn method_not_allowed() -> Response {
    ([(header::ALLOW, "POST")], AppError::MethodNotAllowed).into_response()
}
