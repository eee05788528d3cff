//! Export of attendance data as CSV text, in the historical column layout
//! plus a computed duration column.

use anyhow::Result;
use chrono::NaiveDate;
use csv::Writer;
use log::info;

use crate::backend::domain::models::visit::VisitRecord;

/// Result of building an export
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub file_name: String,
    pub record_count: usize,
    pub csv: String,
}

/// Export service that renders ledger snapshots as downloadable CSV
#[derive(Clone)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// One day's records, sorted by check-in time, with a `Duration (mins)`
    /// column. Open sessions get an empty duration cell.
    pub fn export_day(&self, date: NaiveDate, records: &[VisitRecord]) -> Result<ExportResult> {
        let mut day_records: Vec<&VisitRecord> =
            records.iter().filter(|r| r.date == date).collect();
        day_records.sort_by_key(|r| r.time_in);

        let csv = Self::render(&day_records)?;
        let file_name = format!("attendance_{}.csv", date.format("%Y-%m-%d"));
        info!("Exported {} records for {}", day_records.len(), date);

        Ok(ExportResult {
            file_name,
            record_count: day_records.len(),
            csv,
        })
    }

    /// All records of one student, in stored order.
    pub fn export_student(
        &self,
        student_id: &str,
        student_name: &str,
        records: &[VisitRecord],
    ) -> Result<ExportResult> {
        let own: Vec<&VisitRecord> = records
            .iter()
            .filter(|r| r.student_id == student_id)
            .collect();

        let csv = Self::render(&own)?;
        let file_name = format!("{}_attendance.csv", student_name.replace(' ', "_"));
        info!("Exported {} records for student {}", own.len(), student_id);

        Ok(ExportResult {
            file_name,
            record_count: own.len(),
            csv,
        })
    }

    fn render(records: &[&VisitRecord]) -> Result<String> {
        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record([
            "StudentID",
            "Name",
            "Date",
            "TimeIn",
            "TimeOut",
            "Status",
            "Duration (mins)",
        ])?;

        for record in records {
            let time_out = record
                .time_out
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default();
            let duration = record
                .duration_minutes()
                .map(|m| m.to_string())
                .unwrap_or_default();
            writer.write_record(&[
                &record.student_id,
                &record.student_name,
                &record.date.format("%Y-%m-%d").to_string(),
                &record.time_in.format("%H:%M:%S").to_string(),
                &time_out,
                &record.status.as_str().to_string(),
                &duration,
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush export: {}", e))?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}
