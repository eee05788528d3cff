//! The attendance ledger service: the scan state machine and its
//! persistence cycle.
//!
//! Every scan is a read-entire-ledger, mutate, write-entire-ledger cycle.
//! The whole cycle runs behind a single writer mutex so two scan stations
//! cannot interleave their read-modify-write and silently drop an event.

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::domain::commands::scans::{RecordScanCommand, ScanOutcome};
use crate::backend::domain::directory_service::DirectoryService;
use crate::backend::domain::models::visit::{Ledger, ScanAction, VisitStatus};
use crate::backend::storage::{AttendanceRepository, AttendanceStorage, CsvConnection, LedgerLoad};

/// Failure modes of a scan. None of them corrupt the stored snapshot: a
/// failed scan leaves the previous ledger in place.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("no student id was scanned")]
    EmptyId,
    #[error("student id '{0}' not found in the system")]
    StudentNotFound(String),
    #[error("failed to persist the attendance ledger")]
    Persistence(#[source] anyhow::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Status of a student-day as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    In,
    Out,
    NoRecord,
}

/// Service owning all mutation of the attendance ledger
#[derive(Clone)]
pub struct LedgerService {
    repository: AttendanceRepository,
    directory: DirectoryService,
    write_lock: Arc<Mutex<()>>,
}

impl LedgerService {
    pub fn new(connection: CsvConnection, directory: DirectoryService) -> Self {
        Self {
            repository: AttendanceRepository::new(connection),
            directory,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Record a scan at the current local date and time.
    pub async fn record_scan(&self, command: RecordScanCommand) -> Result<ScanOutcome, ScanError> {
        let now = Local::now();
        self.record_scan_at(command, now.date_naive(), now.time())
            .await
    }

    /// Record a scan against an explicit date and time.
    ///
    /// `record_scan` delegates here; tests use it directly for deterministic
    /// clocks.
    pub async fn record_scan_at(
        &self,
        command: RecordScanCommand,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<ScanOutcome, ScanError> {
        // Truncate to whole seconds so the persisted HH:MM:SS round-trips.
        let time = time.with_nanosecond(0).unwrap_or(time);

        let raw = command.raw_id.trim();
        if raw.is_empty() {
            return Err(ScanError::EmptyId);
        }

        // Serialize the whole read-modify-write cycle.
        let _guard = self.write_lock.lock().await;

        let student = self
            .directory
            .find_by_scan(raw)
            .await?
            .ok_or_else(|| ScanError::StudentNotFound(raw.to_string()))?;

        let load = self.repository.load_ledger().await?;
        if load.malformed > 0 {
            warn!("Ledger loaded with {} malformed rows", load.malformed);
        }

        let mut ledger = Ledger::from_records(load.records);
        let action = ledger.apply_scan(&student.student_id, &student.name, date, time);

        self.repository
            .store_ledger(ledger.records())
            .await
            .map_err(ScanError::Persistence)?;

        let time_display = time.format("%H:%M:%S");
        let message = match action {
            ScanAction::CheckedIn => format!("{} checked IN at {}", student.name, time_display),
            ScanAction::CheckedOut => format!("{} checked OUT at {}", student.name, time_display),
            ScanAction::Reentered => format!("{} re-entered at {}", student.name, time_display),
        };
        info!("{}", message);

        Ok(ScanOutcome {
            action,
            student_id: student.student_id,
            student_name: student.name,
            date,
            time,
            message,
        })
    }

    /// Status of the last record for a student-day. Pure read.
    pub async fn current_status(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> Result<DayStatus> {
        let load = self.repository.load_ledger().await?;
        let ledger = Ledger::from_records(load.records);
        Ok(match ledger.current_status(student_id, date) {
            Some(VisitStatus::In) => DayStatus::In,
            Some(VisitStatus::Out) => DayStatus::Out,
            None => DayStatus::NoRecord,
        })
    }

    /// Load the full snapshot for the report and export layers.
    pub async fn snapshot(&self) -> Result<LedgerLoad> {
        self.repository.load_ledger().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::commands::students::RegisterStudentCommand;
    use crate::backend::domain::pass_service::{PassService, UnconfiguredPassGenerator};
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    fn scan(raw: &str) -> RecordScanCommand {
        RecordScanCommand {
            raw_id: raw.to_string(),
        }
    }

    async fn setup(temp_dir: &TempDir) -> LedgerService {
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let directory = DirectoryService::new(connection.clone());
        let passes = PassService::new(
            connection.clone(),
            std::sync::Arc::new(UnconfiguredPassGenerator),
        );
        directory
            .register_student(
                RegisterStudentCommand {
                    name: "Amara Silva".to_string(),
                    dob: "2012-03-04".to_string(),
                    school_name: "Lakeview College".to_string(),
                    student_id: Some("STU0001".to_string()),
                },
                &passes,
            )
            .await
            .unwrap();
        LedgerService::new(connection, directory)
    }

    #[tokio::test]
    async fn first_scan_checks_in_with_case_insensitive_id() {
        let temp_dir = TempDir::new().unwrap();
        let service = setup(&temp_dir).await;
        let day = date("2025-07-01");

        let outcome = service
            .record_scan_at(scan("stu0001"), day, time("09:15:00"))
            .await
            .unwrap();

        assert_eq!(outcome.action, ScanAction::CheckedIn);
        assert_eq!(outcome.student_id, "STU0001");
        assert_eq!(outcome.message, "Amara Silva checked IN at 09:15:00");
        assert_eq!(service.current_status("STU0001", day).await.unwrap(), DayStatus::In);
    }

    #[tokio::test]
    async fn second_scan_checks_out_and_computes_duration() {
        let temp_dir = TempDir::new().unwrap();
        let service = setup(&temp_dir).await;
        let day = date("2025-07-01");

        service
            .record_scan_at(scan("STU0001"), day, time("09:15:00"))
            .await
            .unwrap();
        let outcome = service
            .record_scan_at(scan("STU0001"), day, time("10:45:00"))
            .await
            .unwrap();

        assert_eq!(outcome.action, ScanAction::CheckedOut);
        assert_eq!(outcome.message, "Amara Silva checked OUT at 10:45:00");

        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].duration_minutes(), Some(90));
        assert_eq!(service.current_status("STU0001", day).await.unwrap(), DayStatus::Out);
    }

    #[tokio::test]
    async fn third_scan_is_a_re_entry_with_three_records() {
        let temp_dir = TempDir::new().unwrap();
        let service = setup(&temp_dir).await;
        let day = date("2025-07-01");

        service
            .record_scan_at(scan("STU0001"), day, time("09:00:00"))
            .await
            .unwrap();
        service
            .record_scan_at(scan("STU0001"), day, time("10:00:00"))
            .await
            .unwrap();
        let outcome = service
            .record_scan_at(scan("STU0001"), day, time("14:00:00"))
            .await
            .unwrap();

        assert_eq!(outcome.action, ScanAction::Reentered);
        assert_eq!(outcome.message, "Amara Silva re-entered at 14:00:00");

        let snapshot = service.snapshot().await.unwrap();
        // In, Out, In across the persisted snapshot; three records total.
        assert_eq!(snapshot.records.len(), 3);
        assert_eq!(snapshot.records[0].status, VisitStatus::Out);
        assert_eq!(snapshot.records[2].status, VisitStatus::In);
        assert!(snapshot.records[1].time_out.is_some());
    }

    #[tokio::test]
    async fn unknown_id_fails_and_leaves_the_ledger_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let service = setup(&temp_dir).await;
        let day = date("2025-07-01");

        service
            .record_scan_at(scan("STU0001"), day, time("09:00:00"))
            .await
            .unwrap();
        let err = service
            .record_scan_at(scan("ZZZ9999"), day, time("09:05:00"))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::StudentNotFound(ref id) if id == "ZZZ9999"));
        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.records.len(), 1);
    }

    #[tokio::test]
    async fn empty_scan_is_rejected_without_a_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let service = setup(&temp_dir).await;

        let err = service
            .record_scan_at(scan("   "), date("2025-07-01"), time("09:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::EmptyId));
    }

    #[tokio::test]
    async fn status_reads_are_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let service = setup(&temp_dir).await;
        let day = date("2025-07-01");

        assert_eq!(
            service.current_status("STU0001", day).await.unwrap(),
            DayStatus::NoRecord
        );
        service
            .record_scan_at(scan("STU0001"), day, time("09:00:00"))
            .await
            .unwrap();

        let first = service.current_status("STU0001", day).await.unwrap();
        let second = service.current_status("STU0001", day).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, DayStatus::In);
    }

    #[tokio::test]
    async fn forgotten_checkout_stays_open_across_days() {
        let temp_dir = TempDir::new().unwrap();
        let service = setup(&temp_dir).await;

        service
            .record_scan_at(scan("STU0001"), date("2025-07-01"), time("18:00:00"))
            .await
            .unwrap();
        // Next day's scan starts a fresh session; yesterday's stays open.
        let outcome = service
            .record_scan_at(scan("STU0001"), date("2025-07-02"), time("08:30:00"))
            .await
            .unwrap();

        assert_eq!(outcome.action, ScanAction::CheckedIn);
        assert_eq!(
            service
                .current_status("STU0001", date("2025-07-01"))
                .await
                .unwrap(),
            DayStatus::In
        );
    }
}
