//! Display formatting for terminal output
//!
//! Provides utilities for formatting orders and exports as plain-text tables
//! and detail views.

pub mod export;
pub mod order;

pub use export::{format_export_list, format_export_summary};
pub use order::{format_order_details, format_order_page};
