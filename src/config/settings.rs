//! User settings for OrderDesk
//!
//! Manages listing defaults, export batching and export retention.

use serde::{Deserialize, Serialize};

use super::paths::OrderdeskPaths;
use crate::error::OrderError;

/// Retention policy for exported spreadsheets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRetention {
    /// Number of most recent export files to keep
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Export files older than this many days are removed
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

impl ExportRetention {
    /// The same policy with `max_files` raised to at least 1, so the export
    /// just written always survives
    pub fn normalized(self) -> Self {
        Self {
            max_files: self.max_files.max(1),
            ..self
        }
    }
}

impl Default for ExportRetention {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_age_days: default_max_age_days(),
        }
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Rows read from the store per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Cleanup policy applied after every export
    #[serde(default)]
    pub retention: ExportRetention,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            retention: ExportRetention::default(),
        }
    }
}

/// User settings for OrderDesk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Orders per page when listing
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// How many times an order create is attempted when its number collides
    #[serde(default = "default_order_number_attempts")]
    pub order_number_attempts: u32,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Spreadsheet export settings
    #[serde(default)]
    pub export: ExportSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_page_size() -> usize {
    10
}

fn default_order_number_attempts() -> u32 {
    5
}

fn default_log_filter() -> String {
    "warn".to_string()
}

fn default_batch_size() -> usize {
    5000
}

fn default_max_files() -> usize {
    20
}

fn default_max_age_days() -> u32 {
    7
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_page_size: default_page_size(),
            order_number_attempts: default_order_number_attempts(),
            log_filter: default_log_filter(),
            export: ExportSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &OrderdeskPaths) -> Result<Self, OrderError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                OrderError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                OrderError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &OrderdeskPaths) -> Result<(), OrderError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            OrderError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            OrderError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_page_size, 10);
        assert_eq!(settings.order_number_attempts, 5);
        assert_eq!(settings.export.batch_size, 5000);
        assert_eq!(settings.export.retention.max_files, 20);
        assert_eq!(settings.export.retention.max_age_days, 7);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = OrderdeskPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.default_page_size = 25;
        settings.export.retention.max_files = 3;

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.default_page_size, 25);
        assert_eq!(loaded.export.retention.max_files, 3);
    }

    #[test]
    fn test_retention_keeps_at_least_one_file() {
        let retention = ExportRetention {
            max_files: 0,
            max_age_days: 3,
        };
        assert_eq!(retention.normalized().max_files, 1);
        assert_eq!(retention.normalized().max_age_days, 3);
        assert_eq!(ExportRetention::default().normalized(), ExportRetention::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = OrderdeskPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        std::fs::write(paths.settings_file(), r#"{"export": {"batch_size": 100}}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.export.batch_size, 100);
        assert_eq!(loaded.export.retention, ExportRetention::default());
        assert_eq!(loaded.default_page_size, 10);
    }
}
