use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{Reader, Writer};
use log::{info, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use crate::backend::domain::models::student::Student;
use crate::backend::storage::traits::StudentStorage;

/// CSV-based student directory repository
///
/// Columns: `Name,StudentID,DOB,SchoolName,RegisteredOn`, dates as
/// `YYYY-MM-DD` strings.
#[derive(Clone)]
pub struct StudentRepository {
    connection: CsvConnection,
}

impl StudentRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read all students from the students table
    fn read_students(&self) -> Result<Vec<Student>> {
        self.connection.ensure_students_file_exists()?;

        let file = File::open(self.connection.students_file_path())?;
        let reader = BufReader::new(file);
        let mut csv_reader = Reader::from_reader(reader);

        let mut students = Vec::new();

        for result in csv_reader.records() {
            let record = result?;

            let name = record.get(0).unwrap_or("").to_string();
            let student_id = record.get(1).unwrap_or("").to_string();
            let dob = match parse_date(record.get(2).unwrap_or("")) {
                Some(date) => date,
                None => {
                    warn!("Skipping student row with unparseable DOB: {:?}", record.get(2));
                    continue;
                }
            };
            let school_name = record.get(3).unwrap_or("").to_string();
            let registered_on = match parse_date(record.get(4).unwrap_or("")) {
                Some(date) => date,
                None => {
                    warn!(
                        "Skipping student row with unparseable RegisteredOn: {:?}",
                        record.get(4)
                    );
                    continue;
                }
            };

            students.push(Student {
                student_id,
                name,
                dob,
                school_name,
                registered_on,
            });
        }

        Ok(students)
    }

    /// Write all students back to the students table
    fn write_students(&self, students: &[Student]) -> Result<()> {
        let file_path = self.connection.students_file_path();
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let writer = BufWriter::new(file);
            let mut csv_writer = Writer::from_writer(writer);

            csv_writer.write_record(["Name", "StudentID", "DOB", "SchoolName", "RegisteredOn"])?;

            for student in students {
                csv_writer.write_record(&[
                    &student.name,
                    &student.student_id,
                    &student.dob.format("%Y-%m-%d").to_string(),
                    &student.school_name,
                    &student.registered_on.format("%Y-%m-%d").to_string(),
                ])?;
            }

            csv_writer.flush()?;
        }

        // Atomic move from temp to final file
        std::fs::rename(&temp_path, &file_path)?;

        Ok(())
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[async_trait]
impl StudentStorage for StudentRepository {
    async fn store_student(&self, student: &Student) -> Result<()> {
        info!("Storing student profile: {}", student.student_id);

        let mut students = self.read_students()?;
        students.push(student.clone());
        self.write_students(&students)?;

        info!("Successfully stored student: {}", student.student_id);
        Ok(())
    }

    async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        let students = self.read_students()?;
        Ok(students.into_iter().find(|s| s.student_id == student_id))
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        self.read_students()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_student(id: &str, name: &str) -> Student {
        Student {
            student_id: id.to_string(),
            name: name.to_string(),
            dob: NaiveDate::from_ymd_opt(2012, 3, 4).unwrap(),
            school_name: "Lakeview College".to_string(),
            registered_on: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        }
    }

    #[tokio::test]
    async fn store_and_retrieve_student() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let repo = StudentRepository::new(CsvConnection::new(temp_dir.path())?);

        repo.store_student(&sample_student("STU0001", "Amara Silva")).await?;

        let loaded = repo.get_student("STU0001").await?;
        assert_eq!(loaded, Some(sample_student("STU0001", "Amara Silva")));
        assert!(repo.get_student("STU9999").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn list_preserves_stored_order() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let repo = StudentRepository::new(CsvConnection::new(temp_dir.path())?);

        repo.store_student(&sample_student("STU0002", "Bimal Perera")).await?;
        repo.store_student(&sample_student("STU0001", "Amara Silva")).await?;

        let students = repo.list_students().await?;
        let ids: Vec<&str> = students.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(ids, vec!["STU0002", "STU0001"]);
        Ok(())
    }

    #[tokio::test]
    async fn rows_with_bad_dates_are_skipped() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        std::fs::write(
            connection.students_file_path(),
            "Name,StudentID,DOB,SchoolName,RegisteredOn\n\
             Amara Silva,STU0001,2012-03-04,Lakeview College,2025-01-15\n\
             Broken Row,STU0002,not-a-date,Lakeview College,2025-01-15\n",
        )?;
        let repo = StudentRepository::new(connection);

        let students = repo.list_students().await?;
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].student_id, "STU0001");
        Ok(())
    }
}
