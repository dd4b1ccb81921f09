use anyhow::Result;
use clap::{Parser, Subcommand};

use orderdesk::cli::{handle_export_command, handle_order_command, handle_seed_command};
use orderdesk::config::{paths::OrderdeskPaths, settings::Settings};
use orderdesk::storage::{FsArtifactStore, Storage};

#[derive(Parser)]
#[command(
    name = "orderdesk",
    version,
    about = "Order management with invoice numbering and spreadsheet export",
    long_about = "OrderDesk keeps sales orders and their line items, numbers \
                  invoices sequentially per day, and exports everything to an \
                  .xlsx workbook for download."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Order management commands
    #[command(subcommand)]
    Order(orderdesk::cli::OrderCommands),

    /// Spreadsheet export commands
    #[command(subcommand)]
    Export(orderdesk::cli::ExportCommands),

    /// Create demo orders
    Seed {
        /// Number of orders to create
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
        /// Order date for the demo orders (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Initialize the data directory and settings file
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = OrderdeskPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    orderdesk::logging::init(&settings.log_filter);

    // Initialize storage
    let storage = Storage::new(paths.clone())?;
    let artifacts = FsArtifactStore::new(paths.exports_dir());

    match cli.command {
        Some(Commands::Order(cmd)) => {
            handle_order_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Export(cmd)) => {
            handle_export_command(&storage, &artifacts, &settings, cmd)?;
        }
        Some(Commands::Seed { count, date }) => {
            handle_seed_command(&storage, &settings, count, date)?;
        }
        Some(Commands::Init) => {
            println!("Initializing OrderDesk at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Add an order with:");
            println!("  orderdesk order create --customer NAME --item NAME:QTY:PRICE");
        }
        Some(Commands::Config) => {
            println!("OrderDesk Configuration");
            println!("=======================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Order store:       {}", paths.store_file().display());
            println!("Exports directory: {}", paths.exports_dir().display());
            println!();
            println!("Settings:");
            println!("  Page size:             {}", settings.default_page_size);
            println!("  Order number attempts: {}", settings.order_number_attempts);
            println!("  Log filter:            {}", settings.log_filter);
            println!("  Export batch size:     {}", settings.export.batch_size);
            println!(
                "  Export retention:      {} files, {} days",
                settings.export.retention.max_files, settings.export.retention.max_age_days
            );
        }
        None => {
            println!("OrderDesk - order management from the command line");
            println!();
            println!("Run 'orderdesk --help' for usage information.");
        }
    }

    Ok(())
}
