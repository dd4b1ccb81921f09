//! Configuration module for OrderDesk
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::OrderdeskPaths;
pub use settings::{ExportRetention, ExportSettings, Settings};
