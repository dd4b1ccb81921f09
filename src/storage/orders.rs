//! Order repository
//!
//! CRUD plus filtered, sorted and paginated queries over orders. Deleting an
//! order cascades to its line items.

use crate::error::{OrderError, OrderResult};
use crate::models::{NewOrder, Order, OrderChanges, OrderField, OrderId, OrderRow};

use super::query::{Criteria, Filterable, Paginated, Pagination, Sort, Value};
use super::tables::Tables;

impl Filterable for Order {
    type Field = OrderField;

    fn field_value(&self, field: OrderField) -> Value {
        match field {
            OrderField::Id => Value::Id(self.id.get()),
            OrderField::OrderNo => Value::Text(self.order_no.to_string()),
            OrderField::CustomerName => Value::Text(self.customer_name.clone()),
            OrderField::OrderDate => Value::Date(self.order_date),
            OrderField::GrandTotal => Value::Money(self.grand_total),
        }
    }
}

/// Access to stored orders
pub trait OrderStore {
    /// Get an order by ID
    fn find_order(&self, id: OrderId) -> OrderResult<Order>;

    /// Get only the requested columns of an order
    fn find_order_projected(&self, id: OrderId, fields: &[OrderField]) -> OrderResult<OrderRow> {
        self.find_order(id).map(|order| order.project(fields))
    }

    /// Filter, order and paginate orders. Without a sort, rows come in
    /// ascending id order.
    fn query_orders(
        &self,
        criteria: &Criteria<OrderField>,
        sort: Option<Sort<OrderField>>,
        page: Pagination,
        fields: &[OrderField],
    ) -> OrderResult<Paginated<OrderRow>>;

    /// Up to `limit` whole orders with an id of at least `from`, in id order
    fn orders_from(&self, from: OrderId, limit: usize) -> OrderResult<Vec<Order>>;

    /// Insert an order, returning its new ID
    fn create_order(&mut self, new: NewOrder) -> OrderResult<OrderId>;

    /// Apply changes to an existing order
    fn update_order(&mut self, id: OrderId, changes: OrderChanges) -> OrderResult<()>;

    /// Delete an order and all of its line items
    fn delete_order(&mut self, id: OrderId) -> OrderResult<()>;
}

impl OrderStore for Tables {
    fn find_order(&self, id: OrderId) -> OrderResult<Order> {
        self.orders
            .get(&id)
            .cloned()
            .ok_or_else(|| OrderError::order_not_found(id.to_string()))
    }

    fn query_orders(
        &self,
        criteria: &Criteria<OrderField>,
        sort: Option<Sort<OrderField>>,
        page: Pagination,
        fields: &[OrderField],
    ) -> OrderResult<Paginated<OrderRow>> {
        let mut matched: Vec<&Order> = self
            .orders
            .values()
            .filter(|order| criteria.matches(*order))
            .collect();

        if let Some(sort) = sort {
            // Stable sort keeps id order among equal keys
            matched.sort_by(|a, b| sort.compare(*a, *b));
        }

        Ok(page.apply(matched).map(|order| order.project(fields)))
    }

    fn orders_from(&self, from: OrderId, limit: usize) -> OrderResult<Vec<Order>> {
        Ok(self
            .orders
            .range(from..)
            .take(limit)
            .map(|(_, order)| order.clone())
            .collect())
    }

    fn create_order(&mut self, new: NewOrder) -> OrderResult<OrderId> {
        if let Some(existing) = self.order_numbers.get(&new.order_no) {
            return Err(OrderError::Conflict(format!(
                "order number {} is already used by {}",
                new.order_no, existing
            )));
        }

        let id = self.allocate_order_id();
        let order = Order::new(id, new);
        self.order_numbers.insert(order.order_no, id);
        self.by_order.entry(id).or_default();
        self.orders.insert(id, order);
        Ok(id)
    }

    fn update_order(&mut self, id: OrderId, changes: OrderChanges) -> OrderResult<()> {
        let order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| OrderError::order_not_found(id.to_string()))?;
        order.apply(changes);
        Ok(())
    }

    fn delete_order(&mut self, id: OrderId) -> OrderResult<()> {
        let order = self
            .orders
            .remove(&id)
            .ok_or_else(|| OrderError::order_not_found(id.to_string()))?;
        self.order_numbers.remove(&order.order_no);

        for item_id in self.by_order.remove(&id).unwrap_or_default() {
            self.line_items.remove(&item_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItemDraft, Money, OrderNumber};
    use crate::storage::LineItemStore;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn new_order(date: NaiveDate, sequence: u16, customer: &str) -> NewOrder {
        NewOrder {
            order_no: OrderNumber::new(date, sequence).unwrap(),
            customer_name: customer.to_string(),
            order_date: date,
        }
    }

    #[test]
    fn test_create_and_find() {
        let mut tables = Tables::new();
        let id = tables.create_order(new_order(day(1), 1, "Acme")).unwrap();

        let order = tables.find_order(id).unwrap();
        assert_eq!(order.customer_name, "Acme");
        assert_eq!(order.order_no.to_string(), "INV202405010001");
        assert!(order.grand_total.is_zero());
    }

    #[test]
    fn test_ids_increase() {
        let mut tables = Tables::new();
        let first = tables.create_order(new_order(day(1), 1, "A")).unwrap();
        let second = tables.create_order(new_order(day(1), 2, "B")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_duplicate_order_number_conflicts() {
        let mut tables = Tables::new();
        tables.create_order(new_order(day(1), 1, "Acme")).unwrap();

        let err = tables.create_order(new_order(day(1), 1, "Globex")).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(tables.order_count(), 1);
    }

    #[test]
    fn test_find_missing_is_not_found() {
        let tables = Tables::new();
        assert!(tables.find_order(OrderId::from_raw(9)).unwrap_err().is_not_found());
        assert!(tables
            .find_order_projected(OrderId::from_raw(9), &[OrderField::OrderNo])
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_find_projected() {
        let mut tables = Tables::new();
        let id = tables.create_order(new_order(day(1), 1, "Acme")).unwrap();

        let row = tables.find_order_projected(id, &[OrderField::CustomerName]).unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.customer_name.as_deref(), Some("Acme"));
        assert!(row.order_no.is_none());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut tables = Tables::new();
        let err = tables
            .update_order(OrderId::from_raw(3), OrderChanges::header("X", day(1)))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_cascades_to_line_items() {
        let mut tables = Tables::new();
        let keep = tables.create_order(new_order(day(1), 1, "Keep")).unwrap();
        let gone = tables.create_order(new_order(day(1), 2, "Gone")).unwrap();
        let draft = LineItemDraft::new("Widget", 1, Money::from_cents(100)).unwrap();
        let kept_item = tables.create_line_item(keep, &draft).unwrap();
        tables.create_line_item(gone, &draft).unwrap();
        tables.create_line_item(gone, &draft).unwrap();

        tables.delete_order(gone).unwrap();

        assert_eq!(tables.order_count(), 1);
        assert_eq!(tables.line_item_count(), 1);
        assert!(tables.find_line_item(kept_item).is_ok());
        assert!(tables.delete_order(gone).unwrap_err().is_not_found());

        // The freed order number can be used again
        tables.create_order(new_order(day(1), 2, "Again")).unwrap();
    }

    #[test]
    fn test_orders_from_reads_one_batch() {
        let mut tables = Tables::new();
        for sequence in 1..=5 {
            tables.create_order(new_order(day(1), sequence, "A")).unwrap();
        }
        tables.delete_order(OrderId::from_raw(3)).unwrap();

        let batch = tables.orders_from(OrderId::from_raw(2), 2).unwrap();
        let ids: Vec<u64> = batch.iter().map(|order| order.id.get()).collect();
        assert_eq!(ids, vec![2, 4]);
        assert!(tables.orders_from(OrderId::from_raw(6), 2).unwrap().is_empty());
    }

    #[test]
    fn test_query_filters_sorts_and_pages() {
        let mut tables = Tables::new();
        tables.create_order(new_order(day(1), 1, "A")).unwrap();
        tables.create_order(new_order(day(1), 2, "B")).unwrap();
        tables.create_order(new_order(day(2), 1, "C")).unwrap();

        let criteria = Criteria::all().like(OrderField::OrderNo, "INV20240501%");
        let page = tables
            .query_orders(&criteria, None, Pagination::first(10), &OrderField::ALL)
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].customer_name.as_deref(), Some("A"));

        let page = tables
            .query_orders(
                &Criteria::all(),
                Some(Sort::desc(OrderField::OrderNo)),
                Pagination::first(1),
                &[OrderField::OrderNo],
            )
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.last_page, 3);
        assert_eq!(
            page.items[0].order_no.map(|n| n.to_string()).as_deref(),
            Some("INV202405020001")
        );
    }
}
