//! Core data models for OrderDesk
//!
//! This module contains the data structures of the order domain: orders,
//! line items, invoice numbers and money amounts.

pub mod ids;
pub mod line_item;
pub mod money;
pub mod order;
pub mod order_number;

pub use ids::{LineItemId, OrderId};
pub use line_item::{
    LineItem, LineItemDraft, LineItemField, LineItemInput, LineItemValidationError,
};
pub use money::Money;
pub use order::{
    NewOrder, Order, OrderChanges, OrderDetail, OrderField, OrderInput, OrderRow,
    OrderValidationError, ValidatedOrder,
};
pub use order_number::{OrderNumber, OrderNumberParseError};
