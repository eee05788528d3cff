use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::Deserialize;
use tracing::info;

use shared::{DayStatus, DayStatusResponse, RecordScanRequest};

use super::mappers::scan_mapper::ScanMapper;
use super::{parse_date_param, require_session};
use crate::backend::domain::commands::scans::RecordScanCommand;
use crate::backend::domain::ledger_service::{DayStatus as DomainDayStatus, ScanError};
use crate::backend::AppState;

/// Axum handler for POST /api/scans
pub async fn record_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RecordScanRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("POST /api/scans - raw id: {:?}", request.student_id);

    let command = RecordScanCommand {
        raw_id: request.student_id,
    };

    match state.ledger_service.record_scan(command).await {
        Ok(outcome) => (StatusCode::CREATED, Json(ScanMapper::to_dto(outcome))).into_response(),
        Err(ScanError::EmptyId) => {
            (StatusCode::BAD_REQUEST, "No student id was scanned").into_response()
        }
        Err(err @ ScanError::StudentNotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Error recording scan: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error recording scan").into_response()
        }
    }
}

/// Query parameters for the scan status endpoint
#[derive(Deserialize, Debug)]
pub struct ScanStatusQuery {
    pub student_id: String,
    /// Defaults to today
    pub date: Option<String>,
}

/// Axum handler for GET /api/scans/status
pub async fn scan_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ScanStatusQuery>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("GET /api/scans/status - query: {:?}", query);

    let date = match &query.date {
        Some(raw) => match parse_date_param(raw) {
            Ok(date) => date,
            Err(response) => return response,
        },
        None => Local::now().date_naive(),
    };

    match state
        .ledger_service
        .current_status(&query.student_id, date)
        .await
    {
        Ok(status) => {
            let response = DayStatusResponse {
                student_id: query.student_id,
                date: date.format("%Y-%m-%d").to_string(),
                status: match status {
                    DomainDayStatus::In => DayStatus::In,
                    DomainDayStatus::Out => DayStatus::Out,
                    DomainDayStatus::NoRecord => DayStatus::NoRecord,
                },
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error reading scan status: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error reading scan status").into_response()
        }
    }
}
