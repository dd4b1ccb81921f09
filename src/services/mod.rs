//! Service layer for OrderDesk
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, invoice numbering, and the multi-step order writes.

pub mod order;
pub mod order_number;

pub use order::{OrderQuery, OrderTransactionService};
pub use order_number::OrderNumberGenerator;
