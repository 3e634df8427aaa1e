//! Datafall CLI - Acquire market candles or generated text from the CLI
//!
//! # Usage
//! ```sh
//! cargo run --bin fetch -- series --symbol BTC/USDT --timeframe 1h
//! cargo run --bin fetch -- generate --prompt "Summarize BTC price action"
//! ```
//!
//! Provider credentials and ordering come from the environment, see
//! `Config::from_env`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use datafall::config::Config;
use datafall::domain::generation::GenerationRequest;
use datafall::domain::market::Timeframe;
use datafall::infrastructure::EngineFactory;
use std::str::FromStr;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Resilient multi-provider data acquisition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a candle series for a symbol
    Series {
        /// Symbol to fetch (e.g. BTC/USDT, EUR/USD)
        #[arg(short, long, default_value = "BTC/USDT")]
        symbol: String,

        /// Timeframe (1m, 5m, 15m, 1h, 4h, 1d)
        #[arg(short, long, default_value = "1h")]
        timeframe: String,
    },
    /// Generate text from the configured chat providers
    Generate {
        /// User prompt
        #[arg(short, long)]
        prompt: String,

        /// Optional system prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Maximum tokens in the response
        #[arg(short, long, default_value = "1024")]
        max_tokens: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Datafall {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let (series_service, text_service) = EngineFactory::build(&config).await?;

    match cli.command {
        Commands::Series { symbol, timeframe } => {
            let timeframe = Timeframe::from_str(&timeframe)?;

            let result = series_service.get_series(&symbol, timeframe).await?;
            info!(
                "Fetched {} candles for {} {} (source: {:?}, quality: {:?})",
                result.series.len(),
                symbol,
                timeframe,
                result.source,
                result.quality
            );

            for candle in result.series.candles() {
                println!(
                    "{}  O:{} H:{} L:{} C:{} V:{}",
                    candle.timestamp,
                    candle.open,
                    candle.high,
                    candle.low,
                    candle.close,
                    candle
                        .volume
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        Commands::Generate {
            prompt,
            system,
            max_tokens,
        } => {
            let mut request = GenerationRequest::new(prompt).with_max_tokens(max_tokens);
            if let Some(system) = system {
                request = request.with_system(system);
            }

            let result = text_service.generate(&request, None).await?;
            info!("Generated {} chars via {}", result.text.len(), result.provider);
            println!("{}", result.text);
        }
    }

    Ok(())
}
