//! Rinse command line
//!
//! Use `rinse quote <path>` to price a scenario file and print its receipt.
//! Use `rinse place <path>` to commit the scenario as an order against an in-memory store.
//! Use `--code` to enter a discount code and `--redeem` to spend loyalty points.

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rinse::{
    fixtures::Scenario,
    notifications::LogNotifier,
    orders::{
        OrdersService, RepositoryOrdersService,
        models::{Actor, NewOrder},
        repository::InMemoryRepository,
    },
    receipt::Receipt,
};

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Garment-care pricing and order tools
#[derive(Debug, Parser)]
#[command(name = "rinse", version, about)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Price a scenario file and print the receipt
    Quote(ScenarioArgs),

    /// Place a scenario as an order and print its readable id
    Place(ScenarioArgs),
}

#[derive(Debug, Args)]
struct ScenarioArgs {
    /// Scenario file
    path: PathBuf,

    /// Discount code to enter at checkout
    #[arg(short, long)]
    code: Option<String>,

    /// Redeem the customer's loyalty points
    #[arg(short, long)]
    redeem: bool,
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true);

    match cli.log_format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().with_current_span(true).init(),
    }
}

fn quote(args: &ScenarioArgs) -> Result<()> {
    let scenario = Scenario::from_path(&args.path)
        .with_context(|| format!("loading scenario {}", args.path.display()))?;

    let breakdown = scenario.price(args.code.as_deref(), args.redeem)?;

    info!(
        path = %args.path.display(),
        grand_total = breakdown.grand_total.to_minor_units(),
        "scenario quoted"
    );

    Receipt::new(scenario.cart(), &breakdown).write_to(io::stdout().lock())?;

    Ok(())
}

async fn place(args: &ScenarioArgs) -> Result<()> {
    let scenario = Scenario::from_path(&args.path)
        .with_context(|| format!("loading scenario {}", args.path.display()))?;

    let repository = Arc::new(InMemoryRepository::new());
    let customer = scenario.seed(&repository).await?;

    let service = RepositoryOrdersService::new(repository, Arc::new(LogNotifier));

    let order = service
        .place_order(
            Actor::Customer(customer),
            NewOrder {
                store: scenario.store(),
                customer,
                cart: scenario.cart().clone(),
                code: args.code.clone(),
                redeem_points: args.redeem,
                kind: scenario.kind(),
            },
        )
        .await?;

    writeln!(
        io::stdout().lock(),
        "Placed order {} ({}), total {}",
        order.readable_id,
        order.status,
        order.pricing.grand_total
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    match &cli.command {
        Command::Quote(args) => quote(args),
        Command::Place(args) => place(args).await,
    }
}
