//! Binance candle adapter.
//!
//! Uses the public klines endpoint (no signing required). Serves crypto
//! pairs quoted in USDT/USDC/BTC, written as `BASE/QUOTE`.

use crate::domain::market::candle::{Candle, CandleSeries};
use crate::domain::market::series::SeriesRequest;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::MarketProvider;
use crate::infrastructure::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

const CRYPTO_QUOTES: [&str; 3] = ["USDT", "USDC", "BTC"];

pub struct BinanceProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl BinanceProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url,
        }
    }

    fn interval(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// `BTC/USDT` -> `BTCUSDT`
    fn api_symbol(symbol: &str) -> String {
        symbol.replace('/', "").to_uppercase()
    }
}

#[async_trait]
impl MarketProvider for BinanceProvider {
    fn id(&self) -> &str {
        "binance"
    }

    fn supports(&self, request: &SeriesRequest) -> bool {
        request
            .symbol
            .split('/')
            .nth(1)
            .map(|quote| CRYPTO_QUOTES.contains(&quote.to_uppercase().as_str()))
            .unwrap_or(false)
    }

    async fn fetch(&self, request: &SeriesRequest) -> Result<CandleSeries> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = request.limit.min(1000).to_string();
        let url_with_query = build_url_with_query(
            &url,
            &[
                ("symbol", Self::api_symbol(&request.symbol).as_str()),
                ("interval", Self::interval(request.timeframe)),
                ("limit", limit.as_str()),
            ],
        );

        let response = self
            .client
            .get(&url_with_query)
            .send()
            .await
            .context("Failed to fetch klines from Binance")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance klines fetch failed: {}", error_text);
        }

        // Kline format: [open_time, open, high, low, close, volume, ...]
        let klines: Vec<serde_json::Value> = response
            .json()
            .await
            .context("Failed to parse Binance klines response")?;

        let candles: Vec<Candle> = klines
            .into_iter()
            .filter_map(|k| {
                let arr = k.as_array()?;
                if arr.len() < 6 {
                    return None;
                }
                Some(Candle {
                    timestamp: arr[0].as_i64()?,
                    open: Decimal::from_str(arr[1].as_str()?).ok()?,
                    high: Decimal::from_str(arr[2].as_str()?).ok()?,
                    low: Decimal::from_str(arr[3].as_str()?).ok()?,
                    close: Decimal::from_str(arr[4].as_str()?).ok()?,
                    volume: Some(Decimal::from_str(arr[5].as_str()?).ok()?),
                })
            })
            .collect();

        debug!(
            "BinanceProvider: fetched {} candles for {}",
            candles.len(),
            request.symbol
        );

        Ok(CandleSeries::normalized(candles))
    }
}
