//! OrderDesk - order management with invoice numbering and spreadsheet export
//!
//! This library provides the core functionality for OrderDesk: orders with
//! line items, sequential per-day invoice numbers, grand totals kept in step
//! with the line items, and a two-sheet `.xlsx` export.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (orders, line items, order numbers, money)
//! - `storage`: Transactional JSON storage and the export artifact store
//! - `services`: Order workflow and invoice numbering
//! - `export`: Spreadsheet export, download and retention
//! - `display`: Plain-text formatting for the CLI
//! - `cli`: Command handlers
//! - `logging`: Tracing subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use orderdesk::models::{LineItemInput, Money, OrderInput};
//! use orderdesk::services::OrderTransactionService;
//! use orderdesk::storage::Storage;
//!
//! let storage = Storage::in_memory();
//! let service = OrderTransactionService::new(&storage);
//! let input = OrderInput::new("Acme", chrono::Local::now().date_naive())
//!     .with_item(LineItemInput::new("Widget", 2, Money::from_cents(1050)));
//! let order = service.create(&input)?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{ErrorKind, OrderError, OrderResult};
