//! Line item repository
//!
//! Line items always belong to an existing order. The subtotal is taken from
//! the validated draft, so no caller can store an inconsistent one.

use crate::error::{OrderError, OrderResult};
use crate::models::{LineItem, LineItemDraft, LineItemField, LineItemId, Money, OrderId};

use super::query::{Criteria, Filterable, Paginated, Pagination, Value};
use super::tables::Tables;

impl Filterable for LineItem {
    type Field = LineItemField;

    fn field_value(&self, field: LineItemField) -> Value {
        match field {
            LineItemField::Id => Value::Id(self.id.get()),
            LineItemField::OrderId => Value::Id(self.order_id.get()),
            LineItemField::ProductName => Value::Text(self.product_name.clone()),
            LineItemField::Qty => Value::Int(i64::from(self.qty)),
            LineItemField::Price => Value::Money(self.price),
            LineItemField::Subtotal => Value::Money(self.subtotal),
        }
    }
}

/// Access to stored line items
pub trait LineItemStore {
    /// Get a line item by ID
    fn find_line_item(&self, id: LineItemId) -> OrderResult<LineItem>;

    /// Filter and paginate line items in ascending id order
    fn query_line_items(
        &self,
        criteria: &Criteria<LineItemField>,
        page: Pagination,
    ) -> OrderResult<Paginated<LineItem>>;

    /// Up to `limit` line items with an id of at least `from`, in id order
    fn line_items_from(&self, from: LineItemId, limit: usize) -> OrderResult<Vec<LineItem>>;

    /// Insert a line item under an existing order
    fn create_line_item(&mut self, order_id: OrderId, draft: &LineItemDraft)
        -> OrderResult<LineItemId>;

    /// Overwrite a line item's product fields
    fn update_line_item(&mut self, id: LineItemId, draft: &LineItemDraft) -> OrderResult<()>;

    /// Delete a single line item
    fn delete_line_item(&mut self, id: LineItemId) -> OrderResult<()>;

    /// Delete every matching line item, returning how many were removed
    fn delete_line_items_where(&mut self, criteria: &Criteria<LineItemField>)
        -> OrderResult<usize>;

    /// Sum a money column over an order's line items
    fn sum_line_items(&self, order_id: OrderId, field: LineItemField) -> OrderResult<Money>;

    /// All line items of one order, in id order
    fn line_items_of(&self, order_id: OrderId) -> OrderResult<Vec<LineItem>> {
        let criteria = Criteria::all().eq(LineItemField::OrderId, Value::Id(order_id.get()));
        Ok(self
            .query_line_items(&criteria, Pagination::first(usize::MAX))?
            .items)
    }
}

impl Tables {
    fn items_of(&self, order_id: OrderId) -> impl Iterator<Item = &LineItem> {
        self.by_order
            .get(&order_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.line_items.get(id))
    }
}

impl LineItemStore for Tables {
    fn find_line_item(&self, id: LineItemId) -> OrderResult<LineItem> {
        self.line_items
            .get(&id)
            .cloned()
            .ok_or_else(|| OrderError::line_item_not_found(id.to_string()))
    }

    fn query_line_items(
        &self,
        criteria: &Criteria<LineItemField>,
        page: Pagination,
    ) -> OrderResult<Paginated<LineItem>> {
        let matched: Vec<&LineItem> = self
            .line_items
            .values()
            .filter(|item| criteria.matches(*item))
            .collect();

        Ok(page.apply(matched).map(LineItem::clone))
    }

    fn line_items_from(&self, from: LineItemId, limit: usize) -> OrderResult<Vec<LineItem>> {
        Ok(self
            .line_items
            .range(from..)
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect())
    }

    fn create_line_item(
        &mut self,
        order_id: OrderId,
        draft: &LineItemDraft,
    ) -> OrderResult<LineItemId> {
        if !self.orders.contains_key(&order_id) {
            return Err(OrderError::order_not_found(order_id.to_string()));
        }

        let id = self.allocate_line_item_id();
        self.line_items.insert(id, LineItem::new(id, order_id, draft));
        self.by_order.entry(order_id).or_default().insert(id);
        Ok(id)
    }

    fn update_line_item(&mut self, id: LineItemId, draft: &LineItemDraft) -> OrderResult<()> {
        let item = self
            .line_items
            .get_mut(&id)
            .ok_or_else(|| OrderError::line_item_not_found(id.to_string()))?;
        item.apply(draft);
        Ok(())
    }

    fn delete_line_item(&mut self, id: LineItemId) -> OrderResult<()> {
        let item = self
            .line_items
            .remove(&id)
            .ok_or_else(|| OrderError::line_item_not_found(id.to_string()))?;
        if let Some(ids) = self.by_order.get_mut(&item.order_id) {
            ids.remove(&id);
        }
        Ok(())
    }

    fn delete_line_items_where(
        &mut self,
        criteria: &Criteria<LineItemField>,
    ) -> OrderResult<usize> {
        let doomed: Vec<LineItemId> = self
            .line_items
            .values()
            .filter(|item| criteria.matches(*item))
            .map(|item| item.id)
            .collect();

        for id in &doomed {
            self.delete_line_item(*id)?;
        }
        Ok(doomed.len())
    }

    fn sum_line_items(&self, order_id: OrderId, field: LineItemField) -> OrderResult<Money> {
        let column = |item: &LineItem| match field {
            LineItemField::Price => Ok(item.price),
            LineItemField::Subtotal => Ok(item.subtotal),
            other => Err(OrderError::Storage(format!(
                "cannot sum non-money column {:?}",
                other
            ))),
        };

        self.items_of(order_id).try_fold(Money::zero(), |total, item| {
            total.checked_add(column(item)?).ok_or_else(|| {
                OrderError::Storage(format!("total of order {} overflows", order_id))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewOrder, OrderNumber};
    use crate::storage::OrderStore;
    use chrono::NaiveDate;

    fn draft(name: &str, qty: i64, cents: i64) -> LineItemDraft {
        LineItemDraft::new(name, qty, Money::from_cents(cents)).unwrap()
    }

    fn tables_with_order() -> (Tables, OrderId) {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut tables = Tables::new();
        let order_id = tables
            .create_order(NewOrder {
                order_no: OrderNumber::first_of(date),
                customer_name: "Acme".into(),
                order_date: date,
            })
            .unwrap();
        (tables, order_id)
    }

    #[test]
    fn test_create_requires_existing_order() {
        let mut tables = Tables::new();
        let err = tables
            .create_line_item(OrderId::from_raw(1), &draft("Widget", 1, 100))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(tables.line_item_count(), 0);
    }

    #[test]
    fn test_create_stores_subtotal() {
        let (mut tables, order_id) = tables_with_order();
        let id = tables.create_line_item(order_id, &draft("Widget", 4, 125)).unwrap();

        let item = tables.find_line_item(id).unwrap();
        assert_eq!(item.order_id, order_id);
        assert_eq!(item.subtotal, Money::from_cents(500));
    }

    #[test]
    fn test_update_recomputes_subtotal() {
        let (mut tables, order_id) = tables_with_order();
        let id = tables.create_line_item(order_id, &draft("Widget", 4, 125)).unwrap();

        tables.update_line_item(id, &draft("Widget XL", 2, 300)).unwrap();
        let item = tables.find_line_item(id).unwrap();
        assert_eq!(item.product_name, "Widget XL");
        assert_eq!(item.subtotal, Money::from_cents(600));

        let missing = LineItemId::from_raw(99);
        assert!(tables
            .update_line_item(missing, &draft("X", 1, 1))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_sum_columns() {
        let (mut tables, order_id) = tables_with_order();
        tables.create_line_item(order_id, &draft("A", 2, 150)).unwrap();
        tables.create_line_item(order_id, &draft("B", 1, 99)).unwrap();

        assert_eq!(
            tables.sum_line_items(order_id, LineItemField::Subtotal).unwrap(),
            Money::from_cents(399)
        );
        assert_eq!(
            tables.sum_line_items(order_id, LineItemField::Price).unwrap(),
            Money::from_cents(249)
        );
        assert!(tables.sum_line_items(order_id, LineItemField::Qty).is_err());
    }

    #[test]
    fn test_sum_of_empty_order_is_zero() {
        let (tables, order_id) = tables_with_order();
        assert!(tables
            .sum_line_items(order_id, LineItemField::Subtotal)
            .unwrap()
            .is_zero());
    }

    #[test]
    fn test_delete_where_not_in() {
        let (mut tables, order_id) = tables_with_order();
        let a = tables.create_line_item(order_id, &draft("A", 1, 100)).unwrap();
        let b = tables.create_line_item(order_id, &draft("B", 1, 100)).unwrap();
        let c = tables.create_line_item(order_id, &draft("C", 1, 100)).unwrap();

        let criteria = Criteria::all()
            .eq(LineItemField::OrderId, Value::Id(order_id.get()))
            .not_in(LineItemField::Id, vec![Value::Id(a.get())]);
        assert_eq!(tables.delete_line_items_where(&criteria).unwrap(), 2);

        let remaining: Vec<_> = tables
            .line_items_of(order_id)
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(remaining, vec![a]);
        assert!(tables.find_line_item(b).is_err());
        assert!(tables.find_line_item(c).is_err());
    }

    #[test]
    fn test_delete_where_not_in_empty_deletes_nothing() {
        let (mut tables, order_id) = tables_with_order();
        tables.create_line_item(order_id, &draft("A", 1, 100)).unwrap();

        let criteria = Criteria::all()
            .eq(LineItemField::OrderId, Value::Id(order_id.get()))
            .not_in(LineItemField::Id, Vec::new());
        assert_eq!(tables.delete_line_items_where(&criteria).unwrap(), 0);
        assert_eq!(tables.line_item_count(), 1);
    }

    #[test]
    fn test_query_pages_in_id_order() {
        let (mut tables, order_id) = tables_with_order();
        for n in 0..5 {
            tables
                .create_line_item(order_id, &draft(&format!("Item {}", n), 1, 100))
                .unwrap();
        }

        let page = tables
            .query_line_items(&Criteria::all(), Pagination::new(2, 2))
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].product_name, "Item 2");
    }

    #[test]
    fn test_line_items_from_reads_one_batch() {
        let (mut tables, order_id) = tables_with_order();
        for n in 0..4 {
            tables
                .create_line_item(order_id, &draft(&format!("Item {}", n), 1, 100))
                .unwrap();
        }

        let batch = tables.line_items_from(LineItemId::from_raw(2), 2).unwrap();
        let names: Vec<_> = batch.iter().map(|item| item.product_name.as_str()).collect();
        assert_eq!(names, vec!["Item 1", "Item 2"]);
        assert!(tables.line_items_from(LineItemId::from_raw(9), 2).unwrap().is_empty());
    }
}
