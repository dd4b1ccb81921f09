//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod export;
pub mod order;

pub use export::{handle_export_command, ExportCommands};
pub use order::{handle_order_command, handle_seed_command, OrderCommands};
