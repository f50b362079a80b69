use crate::api::{ApiResult, AppState};
use crate::application::{
    HealthReport, ModelInfo, PredictionResponse, PredictionStats, RecentPredictions, ServiceInfo,
    RECENT_PREDICTIONS_LIMIT,
};
use crate::domain::PatientObservation;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

/// Service banner with the loaded model
pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(state.service.service_info())
}

/// Health check endpoint, probing the database
pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.service.health().await)
}

pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.service.model_info())
}

/// Score one patient observation
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PatientObservation>, JsonRejection>,
) -> ApiResult<Json<PredictionResponse>> {
    let Json(observation) = payload?;
    let response = state.service.predict(observation).await?;
    Ok(Json(response))
}

/// Most recent predictions, newest first
pub async fn recent_predictions(State(state): State<AppState>) -> Json<RecentPredictions> {
    Json(state.service.list_recent(RECENT_PREDICTIONS_LIMIT).await)
}

pub async fn stats(State(state): State<AppState>) -> Json<PredictionStats> {
    Json(state.service.compute_stats().await)
}
