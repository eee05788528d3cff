//! # Domain Module
//!
//! Business logic for the attendance tracker, independent of storage and of
//! any front end.
//!
//! ## Module Organization
//!
//! - **directory_service**: student registration and lookups
//! - **ledger_service**: the check-in/check-out state machine and its
//!   persistence cycle (the core of the system)
//! - **report_service**: derived views over the ledger (occupancy, rollups,
//!   summaries, diagnostics)
//! - **auth_service**: administrator login, lockout and session tokens
//! - **pass_service**: identity pass issuance via an external generator
//! - **export_service**: CSV exports in the historical column layout
//!
//! ## Core Concepts
//!
//! - **Visit record**: one check-in, optionally closed by a check-out
//! - **Ledger**: the append/mutate-only sequence of visit records
//! - **Open session**: a record whose check-out has not happened yet
//! - **Rollup**: distinct visitors grouped by a calendar bucket

pub mod auth_service;
pub mod commands;
pub mod directory_service;
pub mod export_service;
pub mod ledger_service;
pub mod models;
pub mod pass_service;
pub mod report_service;

pub use auth_service::AuthService;
pub use directory_service::DirectoryService;
pub use export_service::ExportService;
pub use ledger_service::{DayStatus, LedgerService, ScanError};
pub use pass_service::{PassGenerator, PassService, UnconfiguredPassGenerator};
pub use report_service::ReportService;
