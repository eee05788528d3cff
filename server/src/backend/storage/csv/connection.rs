use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// CsvConnection manages file paths and ensures the flat tables exist.
///
/// All persistent state lives in one data directory: `students.csv`,
/// `attendance.csv`, `admin.csv` and a `qr_codes/` folder for identity
/// pass images.
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

const STUDENTS_HEADER: &str = "Name,StudentID,DOB,SchoolName,RegisteredOn\n";
const ATTENDANCE_HEADER: &str = "StudentID,Name,Date,TimeIn,TimeOut,Status\n";

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a new CSV connection in the default data directory
    /// (`~/Documents/Pool Attendance`).
    pub fn new_default() -> Result<Self> {
        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;

        let data_dir = PathBuf::from(home_dir)
            .join("Documents")
            .join("Pool Attendance");
        info!("Using default data directory: {}", data_dir.display());

        Self::new(data_dir)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn students_file_path(&self) -> PathBuf {
        self.base_directory.join("students.csv")
    }

    pub fn attendance_file_path(&self) -> PathBuf {
        self.base_directory.join("attendance.csv")
    }

    pub fn admin_file_path(&self) -> PathBuf {
        self.base_directory.join("admin.csv")
    }

    /// Directory holding generated identity pass images
    pub fn passes_directory(&self) -> PathBuf {
        self.base_directory.join("qr_codes")
    }

    pub fn pass_file_path(&self, student_id: &str) -> PathBuf {
        self.passes_directory().join(format!("{}.png", student_id))
    }

    /// Ensure the students table exists with its header
    pub fn ensure_students_file_exists(&self) -> Result<()> {
        self.ensure_file(&self.students_file_path(), STUDENTS_HEADER)
    }

    /// Ensure the attendance table exists with its header
    pub fn ensure_attendance_file_exists(&self) -> Result<()> {
        self.ensure_file(&self.attendance_file_path(), ATTENDANCE_HEADER)
    }

    pub fn ensure_passes_directory_exists(&self) -> Result<()> {
        let dir = self.passes_directory();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    fn ensure_file(&self, path: &Path, header: &str) -> Result<()> {
        if !self.base_directory.exists() {
            fs::create_dir_all(&self.base_directory)?;
        }
        if !path.exists() {
            fs::write(path, header)?;
            info!("Created {}", path.display());
        }
        Ok(())
    }
}
