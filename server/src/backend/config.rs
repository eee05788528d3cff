//! Server configuration, loaded from an optional `config.yaml`.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level server configuration.
///
/// Everything has a sensible default so the tracker runs with no config
/// file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the flat tables; `~/Documents/Pool Attendance`
    /// when unset
    pub data_dir: Option<PathBuf>,
    /// Address the HTTP shell listens on
    pub bind_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config.yaml` in the working directory, or
    /// from the path in `ATTENDANCE_TRACKER_CONFIG`. Missing file means
    /// defaults; an unreadable file is reported and defaults are used.
    pub fn load() -> Self {
        let path = std::env::var("ATTENDANCE_TRACKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.yaml"));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Could not parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Could not read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from(Path::new("/definitely/not/here.yaml"));
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "data_dir: /srv/pool-data\n").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/pool-data")));
        assert_eq!(config.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn garbage_config_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "bind_address: [not, a, string\n").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.bind_address, "127.0.0.1:3000");
    }
}
