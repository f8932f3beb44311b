//! HTTP route handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::docs;
use crate::api::error::ApiError;
use crate::api::AppState;
use crate::models::{
    AnalysisRequest, AnalysisResult, HealthResponse, OptimizationRequest, OptimizationResult,
};

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.service.health().await)
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (content_type, body) = state
        .service
        .metrics()
        .render()
        .map_err(|e| state.api_error(e))?;
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

pub async fn analyze_prompt(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| state.rejected(rejection))?;
    state
        .service
        .analyze(&request)
        .await
        .map(Json)
        .map_err(|e| state.api_error(e))
}

pub async fn optimize_prompt(
    State(state): State<AppState>,
    payload: Result<Json<OptimizationRequest>, JsonRejection>,
) -> Result<Json<OptimizationResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| state.rejected(rejection))?;
    state
        .service
        .optimize(&request)
        .await
        .map(Json)
        .map_err(|e| state.api_error(e))
}

#[derive(Debug, Deserialize)]
pub struct ClearCacheQuery {
    #[serde(default = "default_pattern")]
    pattern: String,
}

fn default_pattern() -> String {
    "*".to_string()
}

/// Clear cache entries (admin)
pub async fn clear_cache(
    State(state): State<AppState>,
    Query(query): Query<ClearCacheQuery>,
) -> Json<Value> {
    let cleared = state.service.clear_cache(&query.pattern).await;
    Json(json!({
        "message": format!("Cache cleared for pattern: {}", query.pattern),
        "cleared": cleared,
    }))
}

pub async fn openapi() -> Json<Value> {
    Json(docs::openapi_document())
}

pub async fn docs_page() -> Html<String> {
    Html(docs::docs_page())
}
