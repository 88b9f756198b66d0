//! bantay-smoke - exercise a running Bantay service from the command line
//!
//! Covers the read-only surface: the liveness probe, the aggregate metrics,
//! the listings, and the public pages. Useful against a local replica before
//! pointing a browser at it.

use anyhow::{bail, Context};
use bantay_client::{BantayClient, Config, SessionState};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bantay-smoke", about = "Smoke-test a Bantay ledger service")]
struct Args {
    /// Network to target: "local" or "main". Unset sniffs the host.
    #[arg(long, env = "BANTAY_NETWORK")]
    network: Option<String>,

    /// Base URL of the local replica.
    #[arg(long, env = "BANTAY_LOCAL_URL")]
    local_url: Option<String>,

    /// Base URL of the main service.
    #[arg(long, env = "BANTAY_MAIN_URL")]
    main_url: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the service and print whether it answers.
    Liveness,
    /// Fetch the system, security, and service aggregates.
    Metrics,
    /// List budget allocations.
    Allocations,
    /// Fetch one page of the transaction listing.
    Transactions {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Render the public budget summary for a fiscal year.
    Public {
        #[arg(long)]
        fiscal_year: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bantay_client={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if args.network.is_some() {
        config.network = args.network.clone();
    }
    if let Some(url) = &args.local_url {
        config.local_url = url.clone();
    }
    if let Some(url) = &args.main_url {
        config.main_url = url.clone();
    }

    let client = BantayClient::connect(&config)
        .await
        .context("could not build the client")?;
    info!("target resolved, dispatching");

    // The read catalogue runs over the session; browse it anonymously.
    if matches!(
        args.command,
        Command::Metrics | Command::Allocations | Command::Transactions { .. }
    ) {
        match client.session().attach(client.public_handle()).await {
            SessionState::Connected { actor } => info!(%actor, "anonymous session open"),
            SessionState::Error { message } => bail!("could not open a session: {message}"),
            other => bail!("unexpected session state: {other:?}"),
        }
    }

    match args.command {
        Command::Liveness => {
            let alive = client.liveness().await?;
            println!("service answers: {alive}");
        }
        Command::Metrics => {
            let system = client.system_metrics().await?;
            let security = client.security_metrics().await?;
            let service = client.service_metrics().await?;
            println!("allocated : {}", system.total_allocated);
            println!("spent     : {}", system.total_spent);
            println!("txns      : {}", system.transaction_count);
            println!("wallets   : {}", system.wallet_count);
            println!("bodies    : {}", system.civic_body_count);
            println!("hv thresh : {}", security.high_value_threshold);
            println!("hv pending: {}", security.pending_high_value);
            println!("recoveries: {}", security.pending_recoveries);
            println!("uptime    : {}s", service.uptime_secs);
        }
        Command::Allocations => {
            for a in client.allocations().await? {
                println!(
                    "{} [{}] {} / {} ({})",
                    a.id,
                    a.status.tag(),
                    a.spent,
                    a.allocated,
                    a.category
                );
            }
        }
        Command::Transactions { page, limit } => {
            let listing = client.transactions_page(page, limit).await?;
            for t in &listing.items {
                println!("{} [{}] {} -> {} {}", t.id, t.status.tag(), t.from_address, t.to_address, t.amount);
            }
            println!(
                "page {} of {} total, more: {}",
                listing.page, listing.total, listing.has_more
            );
        }
        Command::Public { fiscal_year } => {
            let summary = client.public_budget_summary(fiscal_year).await?;
            println!(
                "FY{}: {} allocated, {} spent",
                summary.fiscal_year, summary.total_allocated, summary.total_spent
            );
            for share in &summary.categories {
                println!("  {:<24} {} / {}", share.category, share.spent, share.allocated);
            }
        }
    }

    Ok(())
}
