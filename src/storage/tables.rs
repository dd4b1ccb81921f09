//! In-process order and line item tables
//!
//! Holds the rows plus the indexes the repositories rely on: the unique
//! order number index and the order -> line items index. The whole set is
//! persisted as one JSON document so a commit is a single atomic rename.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::models::{LineItem, LineItemId, Order, OrderId, OrderNumber};

use super::file_io::{read_json, write_json_atomic};

/// Serializable store document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    next_order_id: u64,
    #[serde(default)]
    next_line_item_id: u64,
    #[serde(default)]
    orders: Vec<Order>,
    #[serde(default)]
    line_items: Vec<LineItem>,
}

/// Orders and line items with their indexes
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub(super) orders: BTreeMap<OrderId, Order>,
    /// Index: order_no -> order id (unique)
    pub(super) order_numbers: HashMap<OrderNumber, OrderId>,
    pub(super) line_items: BTreeMap<LineItemId, LineItem>,
    /// Index: order id -> its line item ids
    pub(super) by_order: HashMap<OrderId, BTreeSet<LineItemId>>,
    next_order_id: u64,
    next_line_item_id: u64,
}

impl Tables {
    /// Empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tables from disk and rebuild indexes
    pub fn load(path: &Path) -> Result<Self, OrderError> {
        let data: StoreData = read_json(path)?;
        let mut tables = Self::new();

        for order in data.orders {
            if tables.order_numbers.insert(order.order_no, order.id).is_some() {
                return Err(OrderError::Storage(format!(
                    "Duplicate order number {} in {}",
                    order.order_no,
                    path.display()
                )));
            }
            tables.by_order.entry(order.id).or_default();
            tables.orders.insert(order.id, order);
        }

        for item in data.line_items {
            if !tables.orders.contains_key(&item.order_id) {
                return Err(OrderError::Storage(format!(
                    "Line item {} references missing order {}",
                    item.id, item.order_id
                )));
            }
            tables.by_order.entry(item.order_id).or_default().insert(item.id);
            tables.line_items.insert(item.id, item);
        }

        // Never hand out an id that is already on disk, even if the counter
        // in the file lags behind
        let max_order = tables.orders.keys().next_back().map_or(0, |id| id.get());
        let max_item = tables.line_items.keys().next_back().map_or(0, |id| id.get());
        tables.next_order_id = data.next_order_id.max(max_order);
        tables.next_line_item_id = data.next_line_item_id.max(max_item);

        Ok(tables)
    }

    /// Save tables to disk
    pub fn save(&self, path: &Path) -> Result<(), OrderError> {
        let data = StoreData {
            next_order_id: self.next_order_id,
            next_line_item_id: self.next_line_item_id,
            orders: self.orders.values().cloned().collect(),
            line_items: self.line_items.values().cloned().collect(),
        };
        write_json_atomic(path, &data)
    }

    pub(super) fn allocate_order_id(&mut self) -> OrderId {
        self.next_order_id += 1;
        OrderId::from_raw(self.next_order_id)
    }

    pub(super) fn allocate_line_item_id(&mut self) -> LineItemId {
        self.next_line_item_id += 1;
        LineItemId::from_raw(self.next_line_item_id)
    }

    /// Number of orders
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of line items
    pub fn line_item_count(&self) -> usize {
        self.line_items.len()
    }
}
