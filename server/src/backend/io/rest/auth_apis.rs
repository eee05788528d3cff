use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::info;

use shared::{ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse};

use super::{require_session, SESSION_HEADER};
use crate::backend::AppState;

/// Axum handler for POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/login - username: {}", request.username);

    match state
        .auth_service
        .login(&request.username, &request.password)
        .await
    {
        Ok(result) => {
            let status = if result.success {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            };
            let response = LoginResponse {
                success: result.success,
                token: result.token,
                message: result.message,
                locked_for_seconds: result.locked_for_seconds,
            };
            (status, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error during login: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error during login").into_response()
        }
    }
}

/// Axum handler for POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }

    if let Some(token) = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        state.auth_service.logout(token);
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Axum handler for POST /api/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }

    let token = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match state
        .auth_service
        .change_password(
            token,
            &request.current_password,
            &request.new_password,
            &request.confirm_password,
        )
        .await
    {
        Ok(result) => {
            let status = if result.success {
                StatusCode::OK
            } else {
                StatusCode::BAD_REQUEST
            };
            (
                status,
                Json(ChangePasswordResponse {
                    success: result.success,
                    message: result.message,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Error changing password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error changing password").into_response()
        }
    }
}
