//! Line item model
//!
//! A line item is one purchased product on an order. Its subtotal is always
//! derived from quantity and price by the writer; callers never supply it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{deserialize_optional_id, LineItemId, OrderId};
use super::money::{self, Money};

/// A stored line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique identifier
    pub id: LineItemId,

    /// The order owning this line
    pub order_id: OrderId,

    /// Product description
    pub product_name: String,

    /// Quantity, always at least one
    pub qty: u32,

    /// Unit price
    pub price: Money,

    /// `qty * price`
    pub subtotal: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LineItem {
    /// Build a new row from a validated draft
    pub fn new(id: LineItemId, order_id: OrderId, draft: &LineItemDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            order_id,
            product_name: draft.product_name.clone(),
            qty: draft.qty,
            price: draft.price,
            subtotal: draft.subtotal,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the product fields from a draft, recomputing the subtotal
    pub fn apply(&mut self, draft: &LineItemDraft) {
        self.product_name = draft.product_name.clone();
        self.qty = draft.qty;
        self.price = draft.price;
        self.subtotal = draft.subtotal;
        self.updated_at = Utc::now();
    }
}

/// Columns of the line item table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineItemField {
    Id,
    OrderId,
    ProductName,
    Qty,
    Price,
    Subtotal,
}

/// A validated line item ready to be written
///
/// Fields are private so the subtotal can only come from `qty * price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemDraft {
    product_name: String,
    qty: u32,
    price: Money,
    subtotal: Money,
}

impl LineItemDraft {
    /// Validate raw values into a draft
    pub fn new(
        product_name: &str,
        qty: i64,
        price: Money,
    ) -> Result<Self, LineItemValidationError> {
        let product_name = product_name.trim();
        if product_name.is_empty() {
            return Err(LineItemValidationError::EmptyProductName);
        }
        if qty < 1 {
            return Err(LineItemValidationError::NonPositiveQuantity(qty));
        }
        let qty =
            u32::try_from(qty).map_err(|_| LineItemValidationError::QuantityTooLarge(qty))?;
        if price.is_negative() {
            return Err(LineItemValidationError::NegativePrice(price));
        }
        let subtotal = price
            .checked_times(qty)
            .ok_or(LineItemValidationError::SubtotalOverflow)?;

        Ok(Self {
            product_name: product_name.to_string(),
            qty,
            price,
            subtotal,
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn qty(&self) -> u32 {
        self.qty
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }
}

/// A line item as submitted by a caller
///
/// Serialized field names follow the order form payload: `quantity` rather
/// than `qty`, and prices as decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Existing line item being edited, or None for a new line
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<LineItemId>,

    pub product_name: String,

    #[serde(rename = "quantity")]
    pub qty: i64,

    #[serde(with = "money::decimal")]
    pub price: Money,
}

impl LineItemInput {
    /// Input for a brand new line
    pub fn new(product_name: impl Into<String>, qty: i64, price: Money) -> Self {
        Self {
            id: None,
            product_name: product_name.into(),
            qty,
            price,
        }
    }

    /// Input editing an existing line
    pub fn existing(
        id: LineItemId,
        product_name: impl Into<String>,
        qty: i64,
        price: Money,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(product_name, qty, price)
        }
    }

    /// Validate into a draft
    pub fn to_draft(&self) -> Result<LineItemDraft, LineItemValidationError> {
        LineItemDraft::new(&self.product_name, self.qty, self.price)
    }
}

/// Validation errors for line items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItemValidationError {
    EmptyProductName,
    NonPositiveQuantity(i64),
    QuantityTooLarge(i64),
    NegativePrice(Money),
    SubtotalOverflow,
}

impl fmt::Display for LineItemValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyProductName => write!(f, "product name cannot be empty"),
            Self::NonPositiveQuantity(qty) => {
                write!(f, "quantity must be at least 1 (got {})", qty)
            }
            Self::QuantityTooLarge(qty) => write!(f, "quantity {} is too large", qty),
            Self::NegativePrice(price) => write!(f, "price cannot be negative (got {})", price),
            Self::SubtotalOverflow => write!(f, "quantity times price is too large"),
        }
    }
}

impl std::error::Error for LineItemValidationError {}
