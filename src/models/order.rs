//! Order model
//!
//! An order is a customer transaction header: a unique invoice number, the
//! customer, the order date and a grand total derived from its line items.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{LineItemId, OrderId};
use super::line_item::{LineItem, LineItemDraft, LineItemInput};
use super::money::Money;
use super::order_number::OrderNumber;

/// A stored order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier
    pub id: OrderId,

    /// Invoice number, unique across all orders
    pub order_no: OrderNumber,

    pub customer_name: String,

    pub order_date: NaiveDate,

    /// Sum of the line item subtotals, maintained by the totals step
    pub grand_total: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new row with a zero grand total
    pub fn new(id: OrderId, new: NewOrder) -> Self {
        let now = Utc::now();
        Self {
            id,
            order_no: new.order_no,
            customer_name: new.customer_name,
            order_date: new.order_date,
            grand_total: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a set of changes
    pub fn apply(&mut self, changes: OrderChanges) {
        if let Some(customer_name) = changes.customer_name {
            self.customer_name = customer_name;
        }
        if let Some(order_date) = changes.order_date {
            self.order_date = order_date;
        }
        if let Some(grand_total) = changes.grand_total {
            self.grand_total = grand_total;
        }
        self.updated_at = Utc::now();
    }

    /// Project onto the requested columns
    pub fn project(&self, fields: &[OrderField]) -> OrderRow {
        let wants = |field| fields.contains(&field);
        OrderRow {
            id: self.id,
            order_no: wants(OrderField::OrderNo).then_some(self.order_no),
            customer_name: wants(OrderField::CustomerName).then(|| self.customer_name.clone()),
            order_date: wants(OrderField::OrderDate).then_some(self.order_date),
            grand_total: wants(OrderField::GrandTotal).then_some(self.grand_total),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.order_no,
            self.order_date.format("%Y-%m-%d"),
            self.customer_name,
            self.grand_total
        )
    }
}

/// Columns of the order table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    Id,
    OrderNo,
    CustomerName,
    OrderDate,
    GrandTotal,
}

impl OrderField {
    /// Every column, in listing order
    pub const ALL: [OrderField; 5] = [
        OrderField::Id,
        OrderField::OrderNo,
        OrderField::CustomerName,
        OrderField::OrderDate,
        OrderField::GrandTotal,
    ];
}

/// A partial order holding only the projected columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    pub id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_no: Option<OrderNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<Money>,
}

/// Fields for inserting an order. The grand total always starts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_no: OrderNumber,
    pub customer_name: String,
    pub order_date: NaiveDate,
}

/// Partial update of an order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderChanges {
    pub customer_name: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub grand_total: Option<Money>,
}

impl OrderChanges {
    /// Header edit: customer and date
    pub fn header(customer_name: impl Into<String>, order_date: NaiveDate) -> Self {
        Self {
            customer_name: Some(customer_name.into()),
            order_date: Some(order_date),
            grand_total: None,
        }
    }

    /// Totals recomputation
    pub fn grand_total(total: Money) -> Self {
        Self {
            grand_total: Some(total),
            ..Self::default()
        }
    }
}

/// An order as submitted by a caller, mirroring the order form payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInput {
    pub customer_name: String,
    pub order_date: NaiveDate,
    #[serde(rename = "products", default)]
    pub line_items: Vec<LineItemInput>,
}

impl OrderInput {
    pub fn new(customer_name: impl Into<String>, order_date: NaiveDate) -> Self {
        Self {
            customer_name: customer_name.into(),
            order_date,
            line_items: Vec::new(),
        }
    }

    /// Add a line item (builder style)
    pub fn with_item(mut self, item: LineItemInput) -> Self {
        self.line_items.push(item);
        self
    }

    /// Check every field and line, producing the values to write
    pub fn validate(&self) -> Result<ValidatedOrder, OrderValidationError> {
        let customer_name = self.customer_name.trim();
        if customer_name.is_empty() {
            return Err(OrderValidationError::EmptyCustomerName);
        }

        let line_items = self
            .line_items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.to_draft()
                    .map(|draft| (item.id, draft))
                    .map_err(|error| OrderValidationError::LineItem {
                        line: index + 1,
                        error: error.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedOrder {
            customer_name: customer_name.to_string(),
            order_date: self.order_date,
            line_items,
        })
    }
}

/// An order input that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub customer_name: String,
    pub order_date: NaiveDate,
    pub line_items: Vec<(Option<LineItemId>, LineItemDraft)>,
}

/// An order together with its line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub line_items: Vec<LineItem>,
}

/// Validation errors for orders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    EmptyCustomerName,
    LineItem { line: usize, error: String },
}

impl fmt::Display for OrderValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCustomerName => write!(f, "Customer name cannot be empty"),
            Self::LineItem { line, error } => write!(f, "Line item {}: {}", line, error),
        }
    }
}

impl std::error::Error for OrderValidationError {}
