//! # tienda: Command Line for the Shop Spreadsheet
//!
//! Reads the dataset through the spreadsheet web app and prints the
//! inventory and sales views; records sales and stock entries.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Startup                                         │
//! │                                                                         │
//! │  1. init_tracing()            RUST_LOG or "info,tienda=debug"           │
//! │  2. SyncConfig::load()        defaults → sync.toml → TIENDA_* env       │
//! │  3. DataSynchronizer::load()  three sheets, read concurrently           │
//! │  4. run the subcommand        tienda-core does the figures              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tienda_core::inventory::{SortField, StockLevel};
use tienda_core::report::SortOrder;
use tienda_core::{Category, PaymentMethod};
use tienda_sync::{DataSynchronizer, SyncConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tienda", about = "Inventory and sales over the shop spreadsheet", version)]
struct Cli {
    /// Config file (defaults to the platform config dir's sync.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inventory table with derived stock.
    Stock(StockArgs),
    /// Sales grouped by local day.
    Sales(SalesArgs),
    /// Individual sales, newest first, paginated.
    Transactions(TransactionsArgs),
    /// The SKU the next product would get.
    NextSku,
    /// Record a single-line sale.
    Sell(SellArgs),
    /// Record received stock.
    Restock(RestockArgs),
    /// Print the effective configuration.
    Config,
}

#[derive(Args)]
struct StockArgs {
    /// Matches name, SKU, model or color.
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, value_enum)]
    category: Vec<CategoryArg>,
    #[arg(long, value_enum)]
    level: Vec<LevelArg>,
    #[arg(long, value_enum, default_value_t = SortArg::Stock)]
    sort: SortArg,
    #[arg(long, action = ArgAction::SetTrue)]
    desc: bool,
}

#[derive(Args)]
struct SalesArgs {
    /// Days back from today.
    #[arg(long, default_value_t = tienda_core::report::DEFAULT_REPORT_DAYS)]
    days: i64,
    /// Every recorded day instead of the last `--days`.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "days")]
    all: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    desc: bool,
}

#[derive(Args)]
struct TransactionsArgs {
    #[arg(long, default_value_t = tienda_core::report::DEFAULT_REPORT_DAYS)]
    days: i64,
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[derive(Args)]
struct SellArgs {
    /// Product id.
    product: String,
    quantity: i64,
    /// Unit price in pesos. Defaults to the product's price.
    #[arg(long)]
    price: Option<f64>,
    #[arg(long, value_enum, default_value_t = PaymentArg::Efectivo)]
    payment: PaymentArg,
    /// Sale day (YYYY-MM-DD). Defaults to now.
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args)]
struct RestockArgs {
    /// Product id.
    product: String,
    quantity: i64,
    /// Entry day (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<String>,
}

// =============================================================================
// Argument Enums
// =============================================================================

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Funda,
    Accesorio,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Funda => Category::Funda,
            CategoryArg::Accesorio => Category::Accesorio,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Negative,
    Empty,
    Critical,
    Low,
    Normal,
}

impl From<LevelArg> for StockLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Negative => StockLevel::Negative,
            LevelArg::Empty => StockLevel::Empty,
            LevelArg::Critical => StockLevel::Critical,
            LevelArg::Low => StockLevel::Low,
            LevelArg::Normal => StockLevel::Normal,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Name,
    Stock,
    Model,
    Price,
    Color,
    Sold,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortField::Name,
            SortArg::Stock => SortField::Stock,
            SortArg::Model => SortField::Model,
            SortArg::Price => SortField::UnitPrice,
            SortArg::Color => SortField::Color,
            SortArg::Sold => SortField::TotalSold,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PaymentArg {
    Efectivo,
    Tarjeta,
    Transferencia,
    Qr,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(arg: PaymentArg) -> Self {
        match arg {
            PaymentArg::Efectivo => PaymentMethod::Efectivo,
            PaymentArg::Tarjeta => PaymentMethod::Tarjeta,
            PaymentArg::Transferencia => PaymentMethod::Transferencia,
            PaymentArg::Qr => PaymentMethod::Qr,
        }
    }
}

fn order(desc: bool) -> SortOrder {
    if desc {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = SyncConfig::load(cli.config.clone()).context("failed to load sync configuration")?;

    if let Commands::Config = cli.command {
        return commands::show_config(&config, cli.json);
    }

    let sync = DataSynchronizer::from_config(&config)
        .context("failed to set up the web app client")?;
    if let Err(e) = sync.load().await {
        warn!(error = %e, "Could not load the spreadsheet, showing an empty dataset");
    }
    info!(persistent = sync.is_persistent(), "Dataset ready");

    match cli.command {
        Commands::Stock(args) => commands::stock(&sync, args, cli.json).await,
        Commands::Sales(args) => commands::sales(&sync, args, cli.json).await,
        Commands::Transactions(args) => commands::transactions(&sync, args, cli.json).await,
        Commands::NextSku => commands::next_sku(&sync, cli.json).await,
        Commands::Sell(args) => commands::sell(&sync, args).await,
        Commands::Restock(args) => commands::restock(&sync, args).await,
        Commands::Config => Ok(()),
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug logs
/// - `RUST_LOG=tienda_sync=trace` - Trace the web app client only
/// - Default: INFO, DEBUG for tienda crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tienda=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
