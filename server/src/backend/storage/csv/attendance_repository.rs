use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use csv::{Reader, StringRecord, Writer};
use log::{info, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use crate::backend::domain::models::visit::{MalformedVisit, VisitRecord, VisitStatus};
use crate::backend::storage::traits::{AttendanceStorage, LedgerLoad};

/// CSV-based attendance ledger repository
///
/// Columns: `StudentID,Name,Date,TimeIn,TimeOut,Status`. `Date` is
/// `YYYY-MM-DD`, times are `HH:MM:SS`, `TimeOut` is the empty string while a
/// session is open. The whole table is read and rewritten on every mutation;
/// the rewrite goes through a temp file and an atomic rename so a crash never
/// leaves a partial snapshot behind.
#[derive(Clone)]
pub struct AttendanceRepository {
    connection: CsvConnection,
}

impl AttendanceRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn parse_record(record: &StringRecord) -> Result<VisitRecord, MalformedVisit> {
        let student_id = record.get(0).unwrap_or("").trim().to_string();
        let student_name = record.get(1).unwrap_or("").to_string();

        let date_field = record.get(2).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d")
            .map_err(|_| MalformedVisit::BadDate(date_field.to_string()))?;

        let time_in_field = record.get(3).unwrap_or("").trim();
        let time_in = NaiveTime::parse_from_str(time_in_field, "%H:%M:%S")
            .map_err(|_| MalformedVisit::BadTime(time_in_field.to_string()))?;

        let time_out_field = record.get(4).unwrap_or("").trim();
        let time_out = if time_out_field.is_empty() {
            None
        } else {
            Some(
                NaiveTime::parse_from_str(time_out_field, "%H:%M:%S")
                    .map_err(|_| MalformedVisit::BadTime(time_out_field.to_string()))?,
            )
        };

        let status_field = record.get(5).unwrap_or("").trim();
        let status = VisitStatus::parse(status_field)
            .ok_or_else(|| MalformedVisit::UnknownStatus(status_field.to_string()))?;

        let visit = VisitRecord {
            student_id,
            student_name,
            date,
            time_in,
            time_out,
            status,
        };
        visit.validate()?;
        Ok(visit)
    }
}

#[async_trait]
impl AttendanceStorage for AttendanceRepository {
    async fn load_ledger(&self) -> Result<LedgerLoad> {
        self.connection.ensure_attendance_file_exists()?;

        let file = File::open(self.connection.attendance_file_path())?;
        let reader = BufReader::new(file);
        let mut csv_reader = Reader::from_reader(reader);

        let mut load = LedgerLoad::default();

        for result in csv_reader.records() {
            let record = result?;
            match Self::parse_record(&record) {
                Ok(visit) => load.records.push(visit),
                Err(reason) => {
                    warn!("Skipping malformed attendance row: {}", reason);
                    load.malformed += 1;
                }
            }
        }

        Ok(load)
    }

    async fn store_ledger(&self, records: &[VisitRecord]) -> Result<()> {
        let file_path = self.connection.attendance_file_path();
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let writer = BufWriter::new(file);
            let mut csv_writer = Writer::from_writer(writer);

            csv_writer.write_record(["StudentID", "Name", "Date", "TimeIn", "TimeOut", "Status"])?;

            for record in records {
                let time_out = record
                    .time_out
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default();
                csv_writer.write_record(&[
                    &record.student_id,
                    &record.student_name,
                    &record.date.format("%Y-%m-%d").to_string(),
                    &record.time_in.format("%H:%M:%S").to_string(),
                    &time_out,
                    &record.status.as_str().to_string(),
                ])?;
            }

            csv_writer.flush()?;
        }

        // Atomic move from temp to final file
        std::fs::rename(&temp_path, &file_path)?;
        info!("Persisted attendance snapshot ({} records)", records.len());

        Ok(())
    }
}
