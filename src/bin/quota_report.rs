use anyhow::Context;
use auction_rules::domain::ports::ListingDirectory;
use auction_rules::utils::{logger, validation::Validate};
use auction_rules::{MarketSnapshot, MarketplaceEngine, MemoryMarket, TomlThresholds};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "quota-report")]
#[command(about = "Per-seller reputation and quota report over a market snapshot")]
struct Args {
    /// Path to the market snapshot JSON
    #[arg(short, long, default_value = "./market.json")]
    snapshot: String,

    /// Optional TOML threshold file
    #[arg(short, long)]
    thresholds: Option<String>,

    /// Emit one JSON object per seller instead of a table
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct ReportRow {
    seller: i64,
    score: f64,
    limit: i64,
    active: u64,
    headroom: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Building quota report from: {}", args.snapshot);

    let snapshot = MarketSnapshot::from_file(&args.snapshot)
        .with_context(|| format!("failed to load market snapshot '{}'", args.snapshot))?;

    let thresholds = match &args.thresholds {
        Some(path) => {
            let file = TomlThresholds::from_file(path)
                .with_context(|| format!("failed to load threshold file '{}'", path))?;
            file.validate().context("threshold file failed validation")?;
            tracing::info!("📁 Using ruleset '{}' from {}", file.ruleset.name, path);
            Some(file)
        }
        None => None,
    };

    let sellers = snapshot.sellers();
    if sellers.is_empty() {
        println!("No sellers in the snapshot.");
        return Ok(());
    }

    let market = MemoryMarket::from_snapshot(snapshot);
    let engine = MarketplaceEngine::new(market.clone(), thresholds);

    let now = Utc::now();
    let mut rows = Vec::with_capacity(sellers.len());
    for seller in sellers {
        let standing = engine
            .seller_standing(seller)
            .await
            .with_context(|| format!("failed to evaluate seller {}", seller))?;
        let active = market
            .active_and_future_count(seller, now)
            .await
            .context("failed to count active listings")?;

        rows.push(ReportRow {
            seller: seller.0,
            score: standing.score,
            limit: standing.limit,
            active,
            headroom: (standing.limit - active as i64).max(0),
        });
    }

    if args.json {
        for row in &rows {
            println!("{}", serde_json::to_string(row)?);
        }
    } else {
        print_table(&rows);
    }

    Ok(())
}

fn print_table(rows: &[ReportRow]) {
    println!("📋 Seller standings ({} sellers):", rows.len());
    println!(
        "  {:<10} {:>7} {:>7} {:>8} {:>10}",
        "Seller", "Score", "Limit", "Active", "Headroom"
    );
    for row in rows {
        println!(
            "  {:<10} {:>7.2} {:>7} {:>8} {:>10}",
            row.seller, row.score, row.limit, row.active, row.headroom
        );
    }
}
