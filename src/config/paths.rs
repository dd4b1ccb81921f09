//! Path management for OrderDesk
//!
//! Provides XDG-compliant path resolution for settings, the order store and
//! exported spreadsheets.
//!
//! ## Path Resolution Order
//!
//! 1. `ORDERDESK_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/orderdesk` or `~/.config/orderdesk`
//! 3. Windows: `%APPDATA%\orderdesk`

use std::path::PathBuf;

use crate::error::OrderError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "ORDERDESK_DATA_DIR";

/// Manages all paths used by OrderDesk
#[derive(Debug, Clone)]
pub struct OrderdeskPaths {
    /// Base directory for all OrderDesk data
    base_dir: PathBuf,
}

impl OrderdeskPaths {
    /// Create a new OrderdeskPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if neither the override nor a home directory can be
    /// determined.
    pub fn new() -> Result<Self, OrderError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create OrderdeskPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/orderdesk/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/orderdesk/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the export artifact directory (~/.config/orderdesk/exports/)
    pub fn exports_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to orders.json (orders and line items)
    pub fn store_file(&self) -> PathBuf {
        self.data_dir().join("orders.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), OrderError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| OrderError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| OrderError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.exports_dir())
            .map_err(|e| OrderError::Io(format!("Failed to create exports directory: {}", e)))?;

        Ok(())
    }

    /// Check if OrderDesk has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, OrderError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").map_err(|_| {
                OrderError::Config("Could not determine HOME directory".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("orderdesk"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, OrderError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| OrderError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("orderdesk"))
}
