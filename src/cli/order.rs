//! Order CLI commands
//!
//! Implements CLI commands for listing, viewing, creating, editing and
//! deleting orders, plus demo data seeding.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Subcommand;

use crate::config::Settings;
use crate::display::order::{format_order_details, format_order_page};
use crate::error::{OrderError, OrderResult};
use crate::models::{LineItemId, LineItemInput, Money, Order, OrderId, OrderInput};
use crate::services::{OrderQuery, OrderTransactionService};
use crate::storage::Storage;

/// Order subcommands
#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// List orders one page at a time
    List {
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Orders per page (defaults to the configured page size)
        #[arg(long)]
        per_page: Option<usize>,
        /// Only orders whose number contains this text (case-sensitive)
        #[arg(short, long, default_value = "")]
        search: String,
        /// First order date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Last order date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Highest order number first
        #[arg(long)]
        latest_first: bool,
    },
    /// Show an order with its line items
    Show {
        /// Order ID (e.g. "3" or "ord-3")
        order: String,
    },
    /// Create an order
    Create {
        #[command(flatten)]
        form: OrderForm,
    },
    /// Replace an order's details and line items
    Update {
        /// Order ID (e.g. "3" or "ord-3")
        order: String,
        #[command(flatten)]
        form: OrderForm,
    },
    /// Delete an order and its line items
    Delete {
        /// Order ID (e.g. "3" or "ord-3")
        order: String,
    },
}

/// Order fields given on the command line or as a JSON file
#[derive(clap::Args, Debug)]
pub struct OrderForm {
    /// Customer name
    #[arg(short, long)]
    customer: Option<String>,
    /// Order date (YYYY-MM-DD, defaults to today)
    #[arg(short, long)]
    date: Option<String>,
    /// Line item as NAME:QTY:PRICE; prefix with #ID: to edit an existing line
    #[arg(short, long = "item")]
    items: Vec<String>,
    /// Read the order from a JSON file instead
    #[arg(short, long, conflicts_with_all = ["customer", "date", "items"])]
    file: Option<PathBuf>,
}

impl OrderForm {
    fn into_input(self) -> OrderResult<OrderInput> {
        if let Some(path) = self.file {
            return read_order_file(&path);
        }

        let customer = self
            .customer
            .ok_or_else(|| OrderError::Validation("--customer is required".into()))?;
        let date = match self.date {
            Some(date) => parse_date(&date)?,
            None => Local::now().date_naive(),
        };

        let mut input = OrderInput::new(customer, date);
        for spec in &self.items {
            input = input.with_item(parse_item(spec)?);
        }
        Ok(input)
    }
}

/// Handle an order command
pub fn handle_order_command(
    storage: &Storage,
    settings: &Settings,
    cmd: OrderCommands,
) -> OrderResult<()> {
    let service = OrderTransactionService::from_settings(storage, settings);

    match cmd {
        OrderCommands::List {
            page,
            per_page,
            search,
            from,
            to,
            latest_first,
        } => {
            let mut query = OrderQuery::new()
                .page(page)
                .search(search.trim())
                .period(parse_optional_date(from)?, parse_optional_date(to)?);
            if let Some(per_page) = per_page {
                query = query.per_page(per_page);
            }
            if latest_first {
                query = query.latest_first();
            }

            let page = service.list(&query)?;
            print!("{}", format_order_page(&page));
        }

        OrderCommands::Show { order } => {
            let detail = service.find(parse_order_id(&order)?)?;
            print!("{}", format_order_details(&detail));
        }

        OrderCommands::Create { form } => {
            let order = service.create(&form.into_input()?)?;
            print_saved("Created", &order);
        }

        OrderCommands::Update { order, form } => {
            let order = service.update(parse_order_id(&order)?, &form.into_input()?)?;
            print_saved("Updated", &order);
        }

        OrderCommands::Delete { order } => {
            let id = parse_order_id(&order)?;
            service.delete(id)?;
            println!("Deleted order {}", id);
        }
    }

    Ok(())
}

/// Create `count` demo orders through the normal create path
pub fn handle_seed_command(
    storage: &Storage,
    settings: &Settings,
    count: usize,
    date: Option<String>,
) -> OrderResult<()> {
    const CUSTOMERS: [&str; 5] = [
        "Ada Lovelace",
        "Grace Hopper",
        "Alan Turing",
        "Edsger Dijkstra",
        "Barbara Liskov",
    ];
    const PRODUCTS: [(&str, i64); 4] = [
        ("Keyboard", 4_999),
        ("Monitor", 18_950),
        ("USB Cable", 799),
        ("Desk Lamp", 2_450),
    ];

    let service = OrderTransactionService::from_settings(storage, settings);
    let date = parse_optional_date(date)?.unwrap_or_else(|| Local::now().date_naive());

    for n in 0..count {
        let mut input = OrderInput::new(CUSTOMERS[n % CUSTOMERS.len()], date);
        for offset in 0..=(n % 3) {
            let (name, cents) = PRODUCTS[(n + offset) % PRODUCTS.len()];
            let qty = (offset + 1) as i64;
            input = input.with_item(LineItemInput::new(name, qty, Money::from_cents(cents)));
        }
        service.create(&input)?;
    }

    println!("Seeded {} orders dated {}", count, date.format("%Y-%m-%d"));
    Ok(())
}

fn print_saved(action: &str, order: &Order) {
    println!("{} order: {}", action, order.order_no);
    println!("  Customer: {}", order.customer_name);
    println!("  Date: {}", order.order_date.format("%Y-%m-%d"));
    println!("  Grand Total: {}", order.grand_total);
    println!("  ID: {}", order.id);
}

/// Parse an order ID with or without its prefix
pub fn parse_order_id(s: &str) -> OrderResult<OrderId> {
    s.trim()
        .parse()
        .map_err(|_| OrderError::Validation(format!("Invalid order ID: '{}'", s)))
}

fn parse_date(s: &str) -> OrderResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        OrderError::Validation(format!("Invalid date format: '{}'. Use YYYY-MM-DD", s))
    })
}

fn parse_optional_date(s: Option<String>) -> OrderResult<Option<NaiveDate>> {
    s.as_deref().map(parse_date).transpose()
}

/// Parse a `[#ID:]NAME:QTY:PRICE` line item.
///
/// Quantity and price are taken from the right, so product names may contain
/// colons.
pub fn parse_item(spec: &str) -> OrderResult<LineItemInput> {
    let invalid = || {
        OrderError::Validation(format!(
            "Invalid line item '{}'. Use NAME:QTY:PRICE or #ID:NAME:QTY:PRICE",
            spec
        ))
    };

    let mut parts = spec.rsplitn(3, ':');
    let price = parts.next().ok_or_else(invalid)?;
    let qty = parts.next().ok_or_else(invalid)?;
    let rest = parts.next().ok_or_else(invalid)?;

    let (id, name) = match rest.strip_prefix('#') {
        Some(tagged) => {
            let (id, name) = tagged.split_once(':').ok_or_else(invalid)?;
            let id: LineItemId = id.trim().parse().map_err(|_| invalid())?;
            (Some(id), name)
        }
        None => (None, rest),
    };

    let qty: i64 = qty.trim().parse().map_err(|_| invalid())?;
    let price = Money::parse(price.trim())
        .map_err(|e| OrderError::Validation(format!("Invalid price in '{}': {}", spec, e)))?;

    let mut item = LineItemInput::new(name, qty, price);
    item.id = id;
    Ok(item)
}

fn read_order_file(path: &Path) -> OrderResult<OrderInput> {
    let file = File::open(path)
        .map_err(|e| OrderError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        OrderError::Validation(format!("Invalid order file {}: {}", path.display(), e))
    })
}
