//! Identity pass handling.
//!
//! The actual image rendering is an external collaborator hidden behind
//! [`PassGenerator`]: given an identifier and a display name it produces
//! scannable image bytes. This service only stores and serves those bytes.
//! A failing generator degrades registration, it never fails it.

use anyhow::Result;
use log::{info, warn};
use std::fs;
use std::sync::Arc;

use crate::backend::storage::CsvConnection;

/// External collaborator contract: produce a scannable identity image.
pub trait PassGenerator: Send + Sync {
    fn generate(&self, student_id: &str, student_name: &str) -> Result<Vec<u8>>;
}

/// Placeholder used when no generator has been wired in. Every request
/// degrades, which registration tolerates by design.
pub struct UnconfiguredPassGenerator;

impl PassGenerator for UnconfiguredPassGenerator {
    fn generate(&self, _student_id: &str, _student_name: &str) -> Result<Vec<u8>> {
        Err(anyhow::anyhow!("no identity pass generator is configured"))
    }
}

/// Outcome of a pass issuance attempt.
#[derive(Debug, Clone)]
pub enum PassStatus {
    /// Image bytes were produced and stored under the passes directory
    Saved,
    /// The pass could not be produced or stored; registration continues
    Degraded(String),
}

/// Service that issues and serves identity passes
#[derive(Clone)]
pub struct PassService {
    connection: CsvConnection,
    generator: Arc<dyn PassGenerator>,
}

impl PassService {
    pub fn new(connection: CsvConnection, generator: Arc<dyn PassGenerator>) -> Self {
        Self {
            connection,
            generator,
        }
    }

    /// Produce and store a pass for a student. Never fails: generator or
    /// filesystem trouble is reported as a degraded status instead.
    pub fn issue_pass(&self, student_id: &str, student_name: &str) -> PassStatus {
        let bytes = match self.generator.generate(student_id, student_name) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Pass generation unavailable for {}: {}", student_id, e);
                return PassStatus::Degraded(format!("pass generation unavailable: {}", e));
            }
        };

        if let Err(e) = self.connection.ensure_passes_directory_exists() {
            warn!("Could not create passes directory: {}", e);
            return PassStatus::Degraded(format!("could not store pass: {}", e));
        }

        let path = self.connection.pass_file_path(student_id);
        match fs::write(&path, &bytes) {
            Ok(()) => {
                info!("Stored identity pass for {} at {}", student_id, path.display());
                PassStatus::Saved
            }
            Err(e) => {
                warn!("Could not write pass for {}: {}", student_id, e);
                PassStatus::Degraded(format!("could not store pass: {}", e))
            }
        }
    }

    /// Load a previously stored pass image, if one exists.
    pub fn load_pass(&self, student_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.connection.pass_file_path(student_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Generator returning fixed bytes, standing in for the real renderer.
    pub struct StubPassGenerator;

    impl PassGenerator for StubPassGenerator {
        fn generate(&self, student_id: &str, student_name: &str) -> Result<Vec<u8>> {
            Ok(format!("pass:{}:{}", student_id, student_name).into_bytes())
        }
    }

    #[test]
    fn issued_pass_is_stored_and_loadable() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        let service = PassService::new(connection, Arc::new(StubPassGenerator));

        let status = service.issue_pass("STU0001", "Amara Silva");
        assert!(matches!(status, PassStatus::Saved));

        let bytes = service.load_pass("STU0001")?;
        assert_eq!(bytes, Some(b"pass:STU0001:Amara Silva".to_vec()));
        Ok(())
    }

    #[test]
    fn unconfigured_generator_degrades_instead_of_failing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        let service = PassService::new(connection, Arc::new(UnconfiguredPassGenerator));

        match service.issue_pass("STU0001", "Amara Silva") {
            PassStatus::Degraded(message) => {
                assert!(message.contains("unavailable"));
            }
            PassStatus::Saved => panic!("expected degraded status"),
        }
        assert_eq!(service.load_pass("STU0001")?, None);
        Ok(())
    }
}
