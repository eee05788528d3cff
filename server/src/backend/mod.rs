//! # Backend Module
//!
//! Everything behind the HTTP surface of the attendance tracker.
//!
//! The backend follows a layered architecture:
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (directory, ledger, reports, auth)
//!     ↓
//! Storage Layer (flat CSV tables)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize the data directory and the application state
//! - Set up the REST router with CORS
//! - Coordinate between domain logic and the flat-file persistence

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use anyhow::Result;
use log::info;

use crate::backend::config::AppConfig;
use crate::backend::domain::pass_service::{PassGenerator, UnconfiguredPassGenerator};
use crate::backend::domain::{
    AuthService, DirectoryService, ExportService, LedgerService, PassService, ReportService,
};
use crate::backend::storage::CsvConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub directory_service: DirectoryService,
    pub ledger_service: LedgerService,
    pub report_service: ReportService,
    pub auth_service: AuthService,
    pub pass_service: PassService,
    pub export_service: ExportService,
}

/// Initialize the backend with all required services.
///
/// No identity pass generator is wired in by default; registration degrades
/// gracefully until a real one is supplied via [`initialize_backend_with`].
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    initialize_backend_with(config, Arc::new(UnconfiguredPassGenerator)).await
}

/// Initialize the backend with an explicit identity pass generator.
pub async fn initialize_backend_with(
    config: &AppConfig,
    pass_generator: Arc<dyn PassGenerator>,
) -> Result<AppState> {
    info!("Setting up data directory");
    let connection = match &config.data_dir {
        Some(dir) => CsvConnection::new(dir)?,
        None => CsvConnection::new_default()?,
    };
    connection.ensure_students_file_exists()?;
    connection.ensure_attendance_file_exists()?;

    info!("Setting up domain services");
    let directory_service = DirectoryService::new(connection.clone());
    let ledger_service = LedgerService::new(connection.clone(), directory_service.clone());
    let report_service = ReportService::new(connection.clone(), directory_service.clone());
    let auth_service = AuthService::new(connection.clone());
    let pass_service = PassService::new(connection, pass_generator);
    let export_service = ExportService::new();

    Ok(AppState {
        directory_service,
        ledger_service,
        report_service,
        auth_service,
        pass_service,
        export_service,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow a browser front end to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/auth/login", post(io::login))
        .route("/auth/logout", post(io::logout))
        .route("/auth/password", post(io::change_password))
        .route("/students", get(io::list_students).post(io::register_student))
        .route("/students/:id", get(io::get_student))
        .route("/students/:id/summary", get(io::get_student_summary))
        .route("/students/:id/pass", get(io::get_student_pass))
        .route("/students/:id/export", get(io::export_student))
        .route("/scans", post(io::record_scan))
        .route("/scans/status", get(io::scan_status))
        .route("/reports/occupancy", get(io::occupancy_timeline))
        .route("/reports/pool-status", get(io::pool_status))
        .route("/reports/rollup", get(io::rollup))
        .route("/reports/growth", get(io::monthly_growth))
        .route("/reports/dashboard", get(io::dashboard))
        .route("/reports/diagnostics", get(io::diagnostics))
        .route("/reports/export-day", get(io::export_day));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
