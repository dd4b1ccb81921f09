//! Invoice number generation
//!
//! Numbers are scoped to a day: the first order of a day gets sequence 0001
//! and each later one takes the day's highest sequence plus one.

use chrono::NaiveDate;

use crate::error::{OrderError, OrderResult};
use crate::models::{OrderField, OrderNumber};
use crate::storage::query::escape_like;
use crate::storage::{Criteria, OrderStore, Pagination, Sort};

/// Produces the next invoice number for a day
pub struct OrderNumberGenerator;

impl OrderNumberGenerator {
    /// The next free number for `today`.
    ///
    /// Must run in the same transaction as the insert that uses the number.
    pub fn next<S>(store: &S, today: NaiveDate) -> OrderResult<OrderNumber>
    where
        S: OrderStore + ?Sized,
    {
        let prefix = OrderNumber::prefix_for(today);
        let pattern = format!("{}%", escape_like(&prefix));
        let criteria = Criteria::all().like(OrderField::OrderNo, pattern);

        let latest = store
            .query_orders(
                &criteria,
                Some(Sort::desc(OrderField::OrderNo)),
                Pagination::first(1),
                &[OrderField::OrderNo],
            )?
            .items
            .into_iter()
            .next()
            .and_then(|row| row.order_no);

        match latest {
            None => Ok(OrderNumber::first_of(today)),
            Some(last) => last.next().ok_or_else(|| {
                OrderError::Validation(format!(
                    "daily order number sequence exhausted for {}",
                    today.format("%Y-%m-%d")
                ))
            }),
        }
    }
}
