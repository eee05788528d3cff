use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use shared::{
    ExportResponse, RegisterStudentRequest, RegisterStudentResponse, StudentListResponse,
};

use super::mappers::student_mapper::StudentMapper;
use super::require_session;
use crate::backend::domain::commands::students::{
    RegisterStudentCommand, StudentListQuery, StudentSort,
};
use crate::backend::AppState;

/// Axum handler for POST /api/students
pub async fn register_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterStudentRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("POST /api/students - name: {}", request.name);

    let command = RegisterStudentCommand {
        name: request.name,
        dob: request.dob,
        school_name: request.school_name,
        student_id: request.student_id,
    };

    match state
        .directory_service
        .register_student(command, &state.pass_service)
        .await
    {
        Ok(result) => {
            let response = RegisterStudentResponse {
                student: StudentMapper::to_dto(result.student),
                pass_saved: result.pass_saved,
                pass_message: result.pass_message,
                success_message: "Student registered successfully".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Query parameters for the student list endpoint
#[derive(Deserialize, Debug)]
pub struct StudentListParams {
    pub search: Option<String>,
    /// One of "name", "registered_on", "school_name"
    pub sort: Option<String>,
}

/// Axum handler for GET /api/students
pub async fn list_students(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<StudentListParams>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("GET /api/students - params: {:?}", params);

    let sort = match params.sort.as_deref() {
        None | Some("name") => StudentSort::Name,
        Some("registered_on") => StudentSort::RegisteredOn,
        Some("school_name") => StudentSort::SchoolName,
        Some(other) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("Unknown sort field '{}'", other),
            )
                .into_response()
        }
    };

    let query = StudentListQuery {
        search: params.search,
        sort,
    };

    match state.directory_service.list_students(query).await {
        Ok(students) => {
            let response = StudentListResponse {
                students: students.into_iter().map(StudentMapper::to_dto).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error listing students: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing students").into_response()
        }
    }
}

/// Axum handler for GET /api/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }

    match state.directory_service.get_student(&student_id).await {
        Ok(Some(student)) => {
            (StatusCode::OK, Json(StudentMapper::to_dto(student))).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Student not found").into_response(),
        Err(e) => {
            tracing::error!("Error retrieving student: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving student").into_response()
        }
    }
}

/// Axum handler for GET /api/students/:id/summary
pub async fn get_student_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("GET /api/students/{}/summary", student_id);

    match state.report_service.student_summary(&student_id).await {
        Ok(Some(summary)) => (StatusCode::OK, Json(summary)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Student not found").into_response(),
        Err(e) => {
            tracing::error!("Error building student summary: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error building student summary",
            )
                .into_response()
        }
    }
}

/// Axum handler for GET /api/students/:id/pass
pub async fn get_student_pass(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }

    match state.pass_service.load_pass(&student_id) {
        Ok(Some(bytes)) => {
            ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            "No identity pass has been stored for this student",
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error loading pass: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading pass").into_response()
        }
    }
}

/// Axum handler for GET /api/students/:id/export
pub async fn export_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    info!("GET /api/students/{}/export", student_id);

    let student = match state.directory_service.get_student(&student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return (StatusCode::NOT_FOUND, "Student not found").into_response(),
        Err(e) => {
            tracing::error!("Error retrieving student: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving student")
                .into_response();
        }
    };

    let snapshot = match state.ledger_service.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!("Error loading ledger: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading ledger").into_response();
        }
    };

    match state
        .export_service
        .export_student(&student.student_id, &student.name, &snapshot.records)
    {
        Ok(export) => {
            let response = ExportResponse {
                file_name: export.file_name,
                record_count: export.record_count as u32,
                csv: export.csv,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error exporting student records: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error exporting student records",
            )
                .into_response()
        }
    }
}
