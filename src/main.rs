use clap::{Parser, Subcommand};
use order_book_engine::config::EngineConfig;
use order_book_engine::engine::OrderBookEngine;
use order_book_engine::order::{Order, Side};
use order_book_engine::simulate::{self, SimConfig};
use order_book_engine::utils::shutdown_token;
use rust_decimal::Decimal;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(version = "0.1", about = "A demo of a limit order book engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the noisy order-flow simulator against an in-process engine.
    Simulate {
        /// Stop after this many seconds; 0 runs until ctrl-c.
        #[arg(default_value_t = 0)]
        secs: u64,
    },
    /// Seed a resting bid and ask, then print a snapshot.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = EngineConfig::load().unwrap_or_else(|err| {
        tracing::warn!(%err, "failed to load engine config, using defaults");
        EngineConfig::default()
    });

    let engine = OrderBookEngine::new();
    let token = shutdown_token();

    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate { secs } => {
            simulate::run_simulation(
                SimConfig {
                    run_secs: if secs == 0 { None } else { Some(secs) },
                    attack_rate_hz: config.attack_rate_hz,
                    noise_sigma: config.noise_sigma,
                    mean_qty: config.mean_qty,
                    starting_mid: config.starting_mid,
                },
                &engine,
                token,
            )
            .await?;
        }
        Commands::Seed => {
            let bid = engine.post(Order::new(Side::Bid, Decimal::new(48, 0), 10));
            let ask = engine.post(Order::new(Side::Ask, Decimal::new(52, 0), 10));
            tracing::info!(%bid, %ask, "seeded resting orders");
            // give the worker a moment to settle both before printing
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let snapshot = engine.get_snapshot();
            println!("bids: {:?}", snapshot.bids);
            println!("asks: {:?}", snapshot.asks);
        }
    }
    Ok(())
}
