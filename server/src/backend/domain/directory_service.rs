use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use log::{info, warn};

use crate::backend::domain::commands::students::{
    RegisterStudentCommand, RegisterStudentResult, StudentListQuery, StudentSort,
};
use crate::backend::domain::models::student::Student;
use crate::backend::domain::pass_service::{PassService, PassStatus};
use crate::backend::storage::{CsvConnection, StudentRepository, StudentStorage};

/// Service for the student directory: registration and lookups
#[derive(Clone)]
pub struct DirectoryService {
    repository: StudentRepository,
}

impl DirectoryService {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            repository: StudentRepository::new(connection),
        }
    }

    /// Register a new student and issue their identity pass.
    ///
    /// Validation failures and duplicate identifiers abort the registration;
    /// a failing pass generator does not.
    pub async fn register_student(
        &self,
        command: RegisterStudentCommand,
        pass_service: &PassService,
    ) -> Result<RegisterStudentResult> {
        info!("Registering student: name={}", command.name);

        let dob = self.validate_register_command(&command)?;

        let existing = self.repository.list_students().await?;

        let student_id = match &command.student_id {
            Some(id) => {
                let id = id.trim().to_string();
                if id.is_empty() {
                    return Err(anyhow::anyhow!("Student ID cannot be empty"));
                }
                if existing
                    .iter()
                    .any(|s| s.student_id.eq_ignore_ascii_case(&id))
                {
                    return Err(anyhow::anyhow!("Student ID already exists in the system"));
                }
                id
            }
            None => Self::generate_unique_id(&existing),
        };

        let student = Student {
            student_id: student_id.clone(),
            name: command.name.trim().to_string(),
            dob,
            school_name: command.school_name.trim().to_string(),
            registered_on: Local::now().date_naive(),
        };

        self.repository.store_student(&student).await?;
        info!("Registered student {} with ID {}", student.name, student.student_id);

        let (pass_saved, pass_message) =
            match pass_service.issue_pass(&student.student_id, &student.name) {
                PassStatus::Saved => (true, "Identity pass saved".to_string()),
                PassStatus::Degraded(message) => {
                    warn!("Registration degraded for {}: {}", student.student_id, message);
                    (false, message)
                }
            };

        Ok(RegisterStudentResult {
            student,
            pass_saved,
            pass_message,
        })
    }

    /// Resolve raw scanned text to a profile: trimmed, case-insensitive.
    /// The returned profile carries the canonical-cased identifier.
    pub async fn find_by_scan(&self, raw_id: &str) -> Result<Option<Student>> {
        let wanted = raw_id.trim();
        if wanted.is_empty() {
            return Ok(None);
        }
        let students = self.repository.list_students().await?;
        Ok(students
            .into_iter()
            .find(|s| s.student_id.eq_ignore_ascii_case(wanted)))
    }

    /// Retrieve a profile by its exact identifier
    pub async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        self.repository.get_student(student_id).await
    }

    /// List students with optional search and the requested ordering
    pub async fn list_students(&self, query: StudentListQuery) -> Result<Vec<Student>> {
        let mut students = self.repository.list_students().await?;

        if let Some(search) = query.search.as_deref() {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() {
                students.retain(|s| {
                    s.name.to_lowercase().contains(&needle)
                        || s.student_id.to_lowercase().contains(&needle)
                });
            }
        }

        match query.sort {
            StudentSort::Name => students.sort_by(|a, b| a.name.cmp(&b.name)),
            StudentSort::RegisteredOn => {
                students.sort_by(|a, b| a.registered_on.cmp(&b.registered_on))
            }
            StudentSort::SchoolName => students.sort_by(|a, b| a.school_name.cmp(&b.school_name)),
        }

        Ok(students)
    }

    pub async fn student_count(&self) -> Result<usize> {
        Ok(self.repository.list_students().await?.len())
    }

    fn validate_register_command(&self, command: &RegisterStudentCommand) -> Result<NaiveDate> {
        if command.name.trim().is_empty() {
            return Err(anyhow::anyhow!("Student name cannot be empty"));
        }
        if command.name.len() > 100 {
            return Err(anyhow::anyhow!("Student name cannot exceed 100 characters"));
        }
        if command.school_name.trim().is_empty() {
            return Err(anyhow::anyhow!("School name cannot be empty"));
        }
        if command.school_name.len() > 100 {
            return Err(anyhow::anyhow!("School name cannot exceed 100 characters"));
        }

        let dob = NaiveDate::parse_from_str(command.dob.trim(), "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Date of birth must be in YYYY-MM-DD format"))?;

        let today = Local::now().date_naive();
        if dob < NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() || dob > today {
            return Err(anyhow::anyhow!(
                "Date of birth must be between 1900-01-01 and today"
            ));
        }

        Ok(dob)
    }

    /// Generate an id that is not already taken, bumping the seed on collision
    fn generate_unique_id(existing: &[Student]) -> String {
        let mut seed = Utc::now().timestamp_millis() as u64;
        loop {
            let candidate = Student::generate_id(seed);
            let taken = existing
                .iter()
                .any(|s| s.student_id.eq_ignore_ascii_case(&candidate));
            if !taken {
                return candidate;
            }
            seed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::pass_service::UnconfiguredPassGenerator;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn services(temp_dir: &TempDir) -> (DirectoryService, PassService) {
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let directory = DirectoryService::new(connection.clone());
        let passes = PassService::new(connection, Arc::new(UnconfiguredPassGenerator));
        (directory, passes)
    }

    fn register_command(name: &str, id: Option<&str>) -> RegisterStudentCommand {
        RegisterStudentCommand {
            name: name.to_string(),
            dob: "2012-03-04".to_string(),
            school_name: "Lakeview College".to_string(),
            student_id: id.map(|s| s.to_string()),
        }
    }

    #[tokio::test]
    async fn registration_persists_and_reports_degraded_pass() {
        let temp_dir = TempDir::new().unwrap();
        let (directory, passes) = services(&temp_dir);

        let result = directory
            .register_student(register_command("Amara Silva", Some("STU0001")), &passes)
            .await
            .unwrap();

        assert_eq!(result.student.student_id, "STU0001");
        assert!(!result.pass_saved);
        assert!(result.pass_message.contains("unavailable"));

        let stored = directory.get_student("STU0001").await.unwrap();
        assert_eq!(stored.unwrap().name, "Amara Silva");
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_case_insensitively() {
        let temp_dir = TempDir::new().unwrap();
        let (directory, passes) = services(&temp_dir);

        directory
            .register_student(register_command("Amara Silva", Some("STU0001")), &passes)
            .await
            .unwrap();
        let err = directory
            .register_student(register_command("Bimal Perera", Some("stu0001")), &passes)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn generated_ids_are_unique() {
        let temp_dir = TempDir::new().unwrap();
        let (directory, passes) = services(&temp_dir);

        let first = directory
            .register_student(register_command("Amara Silva", None), &passes)
            .await
            .unwrap();
        let second = directory
            .register_student(register_command("Bimal Perera", None), &passes)
            .await
            .unwrap();

        assert_ne!(first.student.student_id, second.student.student_id);
        assert!(first.student.student_id.starts_with("STU"));
    }

    #[tokio::test]
    async fn scan_lookup_is_trimmed_and_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let (directory, passes) = services(&temp_dir);

        directory
            .register_student(register_command("Amara Silva", Some("STU0001")), &passes)
            .await
            .unwrap();

        let found = directory.find_by_scan("  stu0001  ").await.unwrap();
        // Canonical casing comes back, not the scanned casing.
        assert_eq!(found.unwrap().student_id, "STU0001");

        assert!(directory.find_by_scan("ZZZ9999").await.unwrap().is_none());
        assert!(directory.find_by_scan("   ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn validation_rejects_bad_input() {
        let temp_dir = TempDir::new().unwrap();
        let (directory, passes) = services(&temp_dir);

        let mut command = register_command("", Some("STU0001"));
        let err = directory
            .register_student(command.clone(), &passes)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("name cannot be empty"));

        command = register_command("Amara Silva", Some("STU0001"));
        command.dob = "04/03/2012".to_string();
        let err = directory
            .register_student(command, &passes)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn listing_supports_search_and_sort() {
        let temp_dir = TempDir::new().unwrap();
        let (directory, passes) = services(&temp_dir);

        directory
            .register_student(register_command("Bimal Perera", Some("STU0002")), &passes)
            .await
            .unwrap();
        directory
            .register_student(register_command("Amara Silva", Some("STU0001")), &passes)
            .await
            .unwrap();

        let all = directory
            .list_students(StudentListQuery::default())
            .await
            .unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Amara Silva", "Bimal Perera"]);

        let matched = directory
            .list_students(StudentListQuery {
                search: Some("stu0002".to_string()),
                sort: StudentSort::Name,
            })
            .await
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Bimal Perera");
    }
}
