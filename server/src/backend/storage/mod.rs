//! # Storage Module
//!
//! Handles all data persistence for the attendance tracker.
//!
//! The storage layer is deliberately thin: two flat tables (students,
//! attendance) plus the administrator credentials file, each read and
//! rewritten as a whole. The traits in [`traits`] keep the domain layer
//! unaware of that choice.

pub mod csv;
pub mod traits;

pub use csv::{AdminRepository, AttendanceRepository, CsvConnection, StudentRepository};
pub use traits::{AdminStorage, AttendanceStorage, LedgerLoad, StudentStorage};
