//! Order service
//!
//! Provides the order workflow: creating an order with its line items,
//! editing it with line item reconciliation, deleting it, and the paginated
//! search. Every write runs as one datastore transaction, so a failure at
//! any step leaves the store untouched.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::config::Settings;
use crate::error::{OrderError, OrderResult};
use crate::models::{
    LineItemDraft, LineItemField, LineItemId, NewOrder, Order, OrderChanges, OrderDetail,
    OrderField, OrderId, OrderInput, OrderRow, ValidatedOrder,
};
use crate::storage::{Criteria, Datastore, Paginated, Pagination, Repositories, Sort, Value};

use super::order_number::OrderNumberGenerator;

const DEFAULT_ORDER_NUMBER_ATTEMPTS: u32 = 5;
const DEFAULT_PAGE_SIZE: usize = 10;

/// Options for the order listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    /// Page to return, 1-indexed
    pub page: usize,
    /// Page size; the service default when None
    pub per_page: Option<usize>,
    /// Substring of the order number
    pub search: String,
    /// First order date included
    pub period_from: Option<NaiveDate>,
    /// Last order date included
    pub period_to: Option<NaiveDate>,
    /// Sort by order number, highest first
    pub latest_first: bool,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: None,
            search: String::new(),
            period_from: None,
            period_to: None,
            latest_first: false,
        }
    }
}

impl OrderQuery {
    /// Create a new query for the first page
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Filter by order number substring
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Filter by order date range, both ends optional
    pub fn period(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.period_from = from;
        self.period_to = to;
        self
    }

    pub fn latest_first(mut self) -> Self {
        self.latest_first = true;
        self
    }

    /// Translate the options into store criteria
    pub fn criteria(&self) -> OrderResult<Criteria<OrderField>> {
        let criteria = match (self.period_from, self.period_to) {
            (Some(from), Some(to)) if from == to => Criteria::all().like(
                OrderField::OrderDate,
                format!("%{}%", from.format("%Y-%m-%d")),
            ),
            (Some(from), Some(to)) if from > to => {
                return Err(OrderError::Validation(format!(
                    "period start {} is after period end {}",
                    from, to
                )))
            }
            (Some(from), Some(to)) => Criteria::all().between(OrderField::OrderDate, from, to),
            (Some(from), None) => Criteria::all().gte(OrderField::OrderDate, from),
            (None, Some(to)) => Criteria::all().lte(OrderField::OrderDate, to),
            (None, None) => Criteria::all(),
        };

        Ok(criteria.contains(OrderField::OrderNo, &self.search))
    }

    fn sort(&self) -> Option<Sort<OrderField>> {
        self.latest_first.then(|| Sort::desc(OrderField::OrderNo))
    }
}

/// Service for order management
pub struct OrderTransactionService<'a, D: Datastore> {
    store: &'a D,
    order_number_attempts: u32,
    page_size: usize,
}

impl<'a, D: Datastore> OrderTransactionService<'a, D> {
    /// Create a new order service
    pub fn new(store: &'a D) -> Self {
        Self {
            store,
            order_number_attempts: DEFAULT_ORDER_NUMBER_ATTEMPTS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Create an order service using the configured defaults
    pub fn from_settings(store: &'a D, settings: &Settings) -> Self {
        Self::new(store)
            .with_order_number_attempts(settings.order_number_attempts)
            .with_page_size(settings.default_page_size)
    }

    /// How many times a create is tried when its order number collides
    pub fn with_order_number_attempts(mut self, attempts: u32) -> Self {
        self.order_number_attempts = attempts.max(1);
        self
    }

    /// Page size used when a query does not name one
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create an order numbered for the current local date
    pub fn create(&self, input: &OrderInput) -> OrderResult<Order> {
        self.create_on(input, Local::now().date_naive())
    }

    /// Create an order numbered for `today`.
    ///
    /// Line item ids in the input are ignored; every line is new.
    #[instrument(skip(self, input), fields(customer = %input.customer_name))]
    pub fn create_on(&self, input: &OrderInput, today: NaiveDate) -> OrderResult<Order> {
        let validated = input.validate()?;

        let mut attempt = 1;
        loop {
            let result = self
                .store
                .transaction(|repos| insert_order(repos, &validated, today));

            match result {
                Err(e) if e.is_conflict() && attempt < self.order_number_attempts => {
                    warn!(attempt, error = %e, "order number collided, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.in_operation("create")),
                Ok(order) => {
                    info!(
                        id = %order.id,
                        order_no = %order.order_no,
                        grand_total = %order.grand_total,
                        "created order"
                    );
                    return Ok(order);
                }
            }
        }
    }

    /// Replace an order's header and line items.
    ///
    /// Lines with an id update that line, lines without one are added, and
    /// stored lines whose id is not listed are deleted. When no line carries
    /// an id, the stored lines are kept.
    #[instrument(skip(self, input), fields(customer = %input.customer_name))]
    pub fn update(&self, id: OrderId, input: &OrderInput) -> OrderResult<Order> {
        let validated = input.validate()?;

        let order = self
            .store
            .transaction(|repos| {
                repos.update_order(
                    id,
                    OrderChanges::header(validated.customer_name.clone(), validated.order_date),
                )?;
                reconcile_line_items(repos, id, &validated.line_items)?;
                recompute_total(repos, id)
            })
            .map_err(|e| e.in_operation("update"))?;

        info!(
            id = %order.id,
            order_no = %order.order_no,
            grand_total = %order.grand_total,
            "updated order"
        );
        Ok(order)
    }

    /// Delete an order and its line items
    #[instrument(skip(self))]
    pub fn delete(&self, id: OrderId) -> OrderResult<()> {
        self.store
            .transaction(|repos| repos.delete_order(id))
            .map_err(|e| e.in_operation("delete"))?;

        info!(%id, "deleted order");
        Ok(())
    }

    /// Search orders, one page at a time
    #[instrument(skip(self))]
    pub fn list(&self, query: &OrderQuery) -> OrderResult<Paginated<OrderRow>> {
        let criteria = query.criteria()?;
        let page = Pagination::new(query.page, query.per_page.unwrap_or(self.page_size));

        self.store
            .read(|repos| repos.query_orders(&criteria, query.sort(), page, &OrderField::ALL))
    }

    /// Get an order with its line items
    pub fn find(&self, id: OrderId) -> OrderResult<OrderDetail> {
        self.store.read(|repos| {
            Ok(OrderDetail {
                order: repos.find_order(id)?,
                line_items: repos.line_items_of(id)?,
            })
        })
    }
}

/// Number, insert and total a new order
fn insert_order(
    repos: &mut dyn Repositories,
    order: &ValidatedOrder,
    today: NaiveDate,
) -> OrderResult<Order> {
    let order_no = OrderNumberGenerator::next(&*repos, today)?;

    let id = repos.create_order(NewOrder {
        order_no,
        customer_name: order.customer_name.clone(),
        order_date: order.order_date,
    })?;

    for (_, draft) in &order.line_items {
        repos.create_line_item(id, draft)?;
    }

    recompute_total(repos, id)
}

/// Bring an order's stored line items in line with the submitted ones
fn reconcile_line_items(
    repos: &mut dyn Repositories,
    order_id: OrderId,
    items: &[(Option<LineItemId>, LineItemDraft)],
) -> OrderResult<()> {
    let mut listed = BTreeSet::new();
    for item_id in items.iter().filter_map(|(id, _)| *id) {
        let existing = repos.find_line_item(item_id).map_err(|e| {
            if e.is_not_found() {
                OrderError::Validation(format!("line item {} does not exist", item_id))
            } else {
                e
            }
        })?;
        if existing.order_id != order_id {
            return Err(OrderError::Validation(format!(
                "line item {} does not belong to order {}",
                item_id, order_id
            )));
        }
        if !listed.insert(item_id) {
            return Err(OrderError::Validation(format!(
                "line item {} is listed more than once",
                item_id
            )));
        }
    }

    // NOT IN of an empty list matches nothing, so an all-new payload keeps
    // the stored lines
    let unlisted = Criteria::all()
        .eq(LineItemField::OrderId, Value::Id(order_id.get()))
        .not_in(
            LineItemField::Id,
            listed.iter().map(|id| Value::Id(id.get())).collect(),
        );
    let removed = repos.delete_line_items_where(&unlisted)?;

    let mut added = 0;
    for (item_id, draft) in items {
        match item_id {
            Some(item_id) => repos.update_line_item(*item_id, draft)?,
            None => {
                repos.create_line_item(order_id, draft)?;
                added += 1;
            }
        }
    }

    debug!(
        %order_id,
        removed,
        updated = listed.len(),
        added,
        "reconciled line items"
    );
    Ok(())
}

/// Set the grand total to the sum of the line subtotals
fn recompute_total(repos: &mut dyn Repositories, id: OrderId) -> OrderResult<Order> {
    let total = repos.sum_line_items(id, LineItemField::Subtotal)?;
    repos.update_order(id, OrderChanges::grand_total(total))?;
    repos.find_order(id)
}
