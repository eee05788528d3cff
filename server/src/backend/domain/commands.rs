//! Domain-level command and query types
//!
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping the
//! public DTOs defined in the `shared` crate to these internal types.

pub mod students {
    use crate::backend::domain::models::student::Student;

    /// Input for registering a new student.
    #[derive(Debug, Clone)]
    pub struct RegisterStudentCommand {
        pub name: String,
        /// Date of birth as `YYYY-MM-DD`
        pub dob: String,
        pub school_name: String,
        /// Explicit identifier; generated when `None`
        pub student_id: Option<String>,
    }

    /// How the student list should be ordered.
    #[derive(Debug, Clone, Copy, Default)]
    pub enum StudentSort {
        #[default]
        Name,
        RegisteredOn,
        SchoolName,
    }

    /// Query parameters for listing students.
    #[derive(Debug, Clone, Default)]
    pub struct StudentListQuery {
        /// Case-insensitive substring matched against name and id
        pub search: Option<String>,
        pub sort: StudentSort,
    }

    /// Result of registering a student, including the pass outcome.
    #[derive(Debug, Clone)]
    pub struct RegisterStudentResult {
        pub student: Student,
        pub pass_saved: bool,
        pub pass_message: String,
    }
}

pub mod scans {
    use crate::backend::domain::models::visit::ScanAction;
    use chrono::{NaiveDate, NaiveTime};

    /// Input for recording a scan: raw text from the scanner or keyboard.
    #[derive(Debug, Clone)]
    pub struct RecordScanCommand {
        pub raw_id: String,
    }

    /// Outcome of a recorded scan.
    #[derive(Debug, Clone)]
    pub struct ScanOutcome {
        pub action: ScanAction,
        pub student_id: String,
        pub student_name: String,
        pub date: NaiveDate,
        pub time: NaiveTime,
        pub message: String,
    }
}
