use clap::Parser;
use pmclient::{Config, MarketFilters, TradingClient};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "pmclient",
    about = "Order lifecycle and market data client for Polymarket"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// List active markets sorted by volume
    #[arg(long)]
    markets: bool,

    /// Search markets by keyword
    #[arg(long)]
    search: Option<String>,

    /// Maximum number of markets to show
    #[arg(long, default_value = "10")]
    limit: usize,

    /// Run a health check against the venue
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .compact()
        .init();

    info!("pmclient starting...");

    let mut config = Config::from_env()?;
    config.validate()?;
    info!("Configuration loaded");
    info!("  CLOB URL: {}", config.clob_url);
    info!("  Gamma URL: {}", config.gamma_url);
    info!("  Chain ID: {}", config.chain_id);
    info!("  Dry run: {}", config.dry_run);

    let client = TradingClient::from_config(config)?;
    let cancel = CancellationToken::new();

    if args.health {
        let report = client.health_check(&cancel).await;
        info!("Gateway reachable: {}", report.gateway_reachable);
        info!("Signer address: {}", report.signer_address);
        info!("Session: {:?}", report.session);
        return Ok(());
    }

    if let Some(query) = &args.search {
        let markets = client.search_markets(query, args.limit, &cancel).await?;
        info!("Found {} markets matching '{}'", markets.len(), query);
        for market in &markets {
            info!("  [{}] {}", market.id, market.question);
        }
        return Ok(());
    }

    if args.markets {
        let filters = MarketFilters {
            limit: args.limit,
            ..MarketFilters::default()
        };
        let markets = client.get_markets(&filters, true, &cancel).await?;
        for market in &markets {
            info!(
                "  [{}] {} (volume: {})",
                market.id,
                market.question,
                market
                    .volume
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "n/a".to_string())
            );
        }
        return Ok(());
    }

    info!("Nothing to do. Try --markets, --search <query>, or --health.");
    Ok(())
}
