//! CSV storage backend: one data directory of flat tables, read and
//! rewritten wholesale, with atomic temp-file renames on every write.

pub mod admin_repository;
pub mod attendance_repository;
pub mod connection;
pub mod student_repository;

pub use admin_repository::AdminRepository;
pub use attendance_repository::AttendanceRepository;
pub use connection::CsvConnection;
pub use student_repository::StudentRepository;
