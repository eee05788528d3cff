//! # Storage Traits
//!
//! Storage abstraction traits that keep the domain layer independent of the
//! flat-file backend. A different persistence layer (an embedded record
//! store, a SQL database) can be dropped in without touching the services.

use anyhow::Result;
use async_trait::async_trait;

use crate::backend::domain::models::admin::AdminCredential;
use crate::backend::domain::models::student::Student;
use crate::backend::domain::models::visit::VisitRecord;

/// A loaded attendance snapshot: the valid records plus a count of stored
/// rows that were skipped because they could not be interpreted.
#[derive(Debug, Clone, Default)]
pub struct LedgerLoad {
    pub records: Vec<VisitRecord>,
    pub malformed: usize,
}

/// Interface for the student directory table
#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// Append a new student profile
    async fn store_student(&self, student: &Student) -> Result<()>;

    /// Retrieve a profile by its exact identifier
    async fn get_student(&self, student_id: &str) -> Result<Option<Student>>;

    /// List all profiles in stored order
    async fn list_students(&self) -> Result<Vec<Student>>;
}

/// Interface for the attendance ledger table
///
/// The ledger is read and rewritten wholesale: `load` returns the entire
/// snapshot and `store` replaces it atomically.
#[async_trait]
pub trait AttendanceStorage: Send + Sync {
    /// Load every stored record, skipping and counting malformed rows
    async fn load_ledger(&self) -> Result<LedgerLoad>;

    /// Replace the stored snapshot with `records`, atomically
    async fn store_ledger(&self, records: &[VisitRecord]) -> Result<()>;
}

/// Interface for the administrator credentials table
#[async_trait]
pub trait AdminStorage: Send + Sync {
    /// Load all credential rows, seeding the default account on first use
    async fn load_credentials(&self) -> Result<Vec<AdminCredential>>;

    /// Replace the stored credential rows, atomically
    async fn store_credentials(&self, credentials: &[AdminCredential]) -> Result<()>;
}
