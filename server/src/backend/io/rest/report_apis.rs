use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::Deserialize;
use tracing::info;

use shared::{ExportResponse, RollupPeriod};

use super::{parse_date_param, require_session};
use crate::backend::AppState;

/// Query parameters for date-scoped reports
#[derive(Deserialize, Debug)]
pub struct DateParam {
    /// Defaults to today where the report allows it
    pub date: Option<String>,
}

/// Axum handler for GET /api/reports/occupancy
pub async fn occupancy_timeline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DateParam>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("GET /api/reports/occupancy - params: {:?}", params);

    let date = match resolve_date(&params) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match state.report_service.occupancy_timeline(date).await {
        Ok(timeline) => (StatusCode::OK, Json(timeline)).into_response(),
        Err(e) => {
            tracing::error!("Error building occupancy timeline: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error building occupancy timeline",
            )
                .into_response()
        }
    }
}

/// Axum handler for GET /api/reports/pool-status
pub async fn pool_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DateParam>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("GET /api/reports/pool-status - params: {:?}", params);

    let date = match resolve_date(&params) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match state
        .report_service
        .pool_status(date, Local::now().time())
        .await
    {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => {
            tracing::error!("Error building pool status: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error building pool status").into_response()
        }
    }
}

/// Query parameters for the rollup endpoint
#[derive(Deserialize, Debug)]
pub struct RollupParams {
    /// One of "weekly", "monthly", "quarterly"
    pub period: String,
}

/// Axum handler for GET /api/reports/rollup
pub async fn rollup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RollupParams>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("GET /api/reports/rollup - params: {:?}", params);

    let period = match params.period.as_str() {
        "weekly" => RollupPeriod::Weekly,
        "monthly" => RollupPeriod::Monthly,
        "quarterly" => RollupPeriod::Quarterly,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                format!("Unknown rollup period '{}'", other),
            )
                .into_response()
        }
    };

    match state.report_service.rollup(period).await {
        Ok(rollup) => (StatusCode::OK, Json(rollup)).into_response(),
        Err(e) => {
            tracing::error!("Error building rollup: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error building rollup").into_response()
        }
    }
}

/// Axum handler for GET /api/reports/growth
pub async fn monthly_growth(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }

    match state.report_service.monthly_growth().await {
        Ok(growth) => (StatusCode::OK, Json(growth)).into_response(),
        Err(e) => {
            tracing::error!("Error building growth report: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error building growth report",
            )
                .into_response()
        }
    }
}

/// Axum handler for GET /api/reports/dashboard
pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }

    match state.report_service.dashboard().await {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(e) => {
            tracing::error!("Error building dashboard: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error building dashboard").into_response()
        }
    }
}

/// Axum handler for GET /api/reports/diagnostics
pub async fn diagnostics(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }

    match state.report_service.diagnostics().await {
        Ok(diag) => (StatusCode::OK, Json(diag)).into_response(),
        Err(e) => {
            tracing::error!("Error building diagnostics: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error building diagnostics",
            )
                .into_response()
        }
    }
}

/// Axum handler for GET /api/reports/export-day
pub async fn export_day(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DateParam>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("GET /api/reports/export-day - params: {:?}", params);

    let date = match resolve_date(&params) {
        Ok(date) => date,
        Err(response) => return response,
    };

    let snapshot = match state.ledger_service.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!("Error loading ledger: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading ledger").into_response();
        }
    };

    match state.export_service.export_day(date, &snapshot.records) {
        Ok(export) => {
            let response = ExportResponse {
                file_name: export.file_name,
                record_count: export.record_count as u32,
                csv: export.csv,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error exporting day: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error exporting day").into_response()
        }
    }
}

fn resolve_date(params: &DateParam) -> Result<chrono::NaiveDate, axum::response::Response> {
    match &params.date {
        Some(raw) => parse_date_param(raw),
        None => Ok(Local::now().date_naive()),
    }
}
