use super::error::ApiError;
use super::AppState;
use crate::core::arrangement;
use crate::domain::model::{
    Alerts, CargoItem, CargoList, ImportReport, ImportRequest, Metrics, NewCargo, Recommendation,
    RetrievalResult, ReturnPlan, ReturnPlanRequest, SimulateRequest, SimulationResult,
};
use crate::domain::ports::ExportFormat;
use crate::utils::monitor::SystemStats;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub items: usize,
    pub current_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<SystemStats>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let inventory = state.inventory.read().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.uptime_seconds(),
        items: inventory.len(),
        current_date: inventory.today(),
        process: state.monitor.get_stats(),
    })
}

pub async fn get_cargo(State(state): State<AppState>) -> Json<CargoList> {
    Json(state.inventory.read().await.list())
}

pub async fn add_cargo(
    State(state): State<AppState>,
    payload: Result<Json<NewCargo>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CargoItem>)> {
    let Json(cargo) = payload?;
    let item = state.inventory.write().await.add(cargo)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn delete_cargo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let item = state.inventory.write().await.delete(&id)?;
    Ok(Json(serde_json::json!({ "deleted": item.id })))
}

pub async fn placement(
    State(state): State<AppState>,
    payload: Result<Json<NewCargo>, JsonRejection>,
) -> ApiResult<Json<Recommendation>> {
    let Json(cargo) = payload?;
    let recommendation = state.inventory.read().await.recommend(&cargo)?;
    tracing::debug!(
        item = %cargo.name,
        zone = %recommendation.recommended_zone,
        confidence = recommendation.confidence,
        "Placement recommended"
    );
    Ok(Json(recommendation))
}

pub async fn return_plan(
    State(state): State<AppState>,
    payload: Result<Json<ReturnPlanRequest>, JsonRejection>,
) -> ApiResult<Json<ReturnPlan>> {
    let Json(request) = payload?;
    Ok(Json(state.inventory.read().await.return_plan(&request)?))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RetrievalResult>> {
    Ok(Json(state.inventory.write().await.retrieve(&id)?))
}

/// Body is optional; an empty body advances one day.
pub async fn simulate_day(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<SimulationResult>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        SimulateRequest::default()
    } else {
        serde_json::from_slice::<SimulateRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid simulate request: {}", e)))?
    };

    let result = state.inventory.write().await.simulate(request.days)?;
    state.monitor.log_stats("Simulated day");
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

pub async fn export_arrangement(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let format = match query.format.as_deref() {
        Some(format) => format.parse::<ExportFormat>()?,
        None => ExportFormat::Csv,
    };

    let rows = state.inventory.read().await.arrangement();
    let body = arrangement::render(&rows, format)?;

    Ok((
        [
            (header::CONTENT_TYPE, arrangement::content_type(format).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", arrangement::file_name(format)),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn import_items(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult<Json<ImportReport>> {
    let Json(request) = payload?;
    Ok(Json(state.inventory.write().await.import(request.items)))
}

pub async fn alerts(State(state): State<AppState>) -> Json<Alerts> {
    Json(state.inventory.read().await.alerts())
}

pub async fn metrics(State(state): State<AppState>) -> Json<Metrics> {
    Json(state.inventory.read().await.metrics())
}
