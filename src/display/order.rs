//! Order display formatting
//!
//! Formats the order listing page and the order detail view for the terminal.

use crate::models::{OrderDetail, OrderRow};
use crate::storage::Paginated;

/// Format one page of the order listing as a table
pub fn format_order_page(page: &Paginated<OrderRow>) -> String {
    if page.items.is_empty() {
        return if page.total == 0 {
            "No orders found.\n".to_string()
        } else {
            format!(
                "Page {} is empty ({} orders over {} pages).\n",
                page.current_page, page.total, page.last_page
            )
        };
    }

    let customer_width = page
        .items
        .iter()
        .filter_map(|row| row.customer_name.as_ref())
        .map(|name| name.chars().count().min(30))
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<8}  {:<15}  {:<customer_width$}  {:<10}  {:>12}\n",
        "ID",
        "Order Number",
        "Customer",
        "Date",
        "Grand Total",
        customer_width = customer_width,
    ));
    output.push_str(&format!(
        "{:-<8}  {:-<15}  {:-<customer_width$}  {:-<10}  {:->12}\n",
        "",
        "",
        "",
        "",
        "",
        customer_width = customer_width,
    ));

    for row in &page.items {
        output.push_str(&format!(
            "{:<8}  {:<15}  {:<customer_width$}  {:<10}  {:>12}\n",
            row.id.to_string(),
            row.order_no.map(|n| n.to_string()).unwrap_or_default(),
            truncate(row.customer_name.as_deref().unwrap_or(""), customer_width),
            row.order_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            row.grand_total.map(|t| t.to_string()).unwrap_or_default(),
            customer_width = customer_width,
        ));
    }

    output.push_str(&format!(
        "\nPage {} of {} ({} orders, {} per page)\n",
        page.current_page, page.last_page, page.total, page.per_page
    ));
    output
}

/// Format an order with its line items
pub fn format_order_details(detail: &OrderDetail) -> String {
    let order = &detail.order;
    let mut output = String::new();

    output.push_str(&format!("Order:       {} ({})\n", order.order_no, order.id));
    output.push_str(&format!("Customer:    {}\n", order.customer_name));
    output.push_str(&format!("Date:        {}\n", order.order_date.format("%Y-%m-%d")));
    output.push_str(&format!("Grand Total: {}\n", order.grand_total));

    if detail.line_items.is_empty() {
        output.push_str("\nNo line items.\n");
        return output;
    }

    output.push_str(&format!(
        "\n{:<10}  {:<30}  {:>6}  {:>12}  {:>12}\n",
        "Item", "Product", "Qty", "Price", "Subtotal"
    ));
    output.push_str(&"-".repeat(78));
    output.push('\n');

    for item in &detail.line_items {
        output.push_str(&format!(
            "{:<10}  {:<30}  {:>6}  {:>12}  {:>12}\n",
            item.id.to_string(),
            truncate(&item.product_name, 30),
            item.qty,
            item.price.to_string(),
            item.subtotal.to_string(),
        ));
    }

    output
}

/// Shorten a string to at most `max_len` characters
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
