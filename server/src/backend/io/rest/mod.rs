//! REST interface: axum handlers exposing the domain services.
//!
//! Every route except login requires a valid administrator session token in
//! the `X-Session-Token` header; the handlers check it up front via
//! [`require_session`].

pub mod auth_apis;
pub mod mappers;
pub mod report_apis;
pub mod scan_apis;
pub mod student_apis;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;

use crate::backend::AppState;

pub use auth_apis::*;
pub use report_apis::*;
pub use scan_apis::*;
pub use student_apis::*;

pub(crate) const SESSION_HEADER: &str = "x-session-token";

/// Reject the request unless it carries a live session token.
pub(crate) fn require_session(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok());

    match token {
        Some(token) if state.auth_service.validate_token(token) => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            "A valid administrator session is required",
        )
            .into_response()),
    }
}

/// Parse a `YYYY-MM-DD` query parameter, mapping failure to a 400.
pub(crate) fn parse_date_param(value: &str) -> Result<NaiveDate, Response> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a valid YYYY-MM-DD date", value),
        )
            .into_response()
    })
}
