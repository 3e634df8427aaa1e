//! Twelve Data candle adapter.
//!
//! Keyed REST API covering FX, metals and equities. Multiple API keys can be
//! configured; one is picked per request seed so load spreads across keys
//! while retries inside a time bucket stay on the same key.

use crate::application::rotation::{KeyPool, request_seed, time_bucket};
use crate::domain::market::candle::{Candle, CandleSeries};
use crate::domain::market::series::SeriesRequest;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::MarketProvider;
use crate::infrastructure::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

pub struct TwelveDataProvider {
    client: ClientWithMiddleware,
    base_url: String,
    keys: KeyPool,
    key_bucket: std::time::Duration,
}

impl TwelveDataProvider {
    pub fn new(base_url: String, keys: KeyPool, key_bucket: std::time::Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url,
            keys,
            key_bucket,
        }
    }

    fn interval(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::M1 => "1min",
            Timeframe::M5 => "5min",
            Timeframe::M15 => "15min",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1day",
        }
    }

    fn pick_key(&self, symbol: &str) -> Option<&str> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let bucket = time_bucket(now_ms, self.key_bucket.as_millis() as i64);
        self.keys.pick(&request_seed(symbol, bucket))
    }
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    values: Vec<TimeSeriesValue>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

#[async_trait]
impl MarketProvider for TwelveDataProvider {
    fn id(&self) -> &str {
        "twelvedata"
    }

    /// Serves any symbol, but only with at least one key configured
    fn supports(&self, _request: &SeriesRequest) -> bool {
        !self.keys.is_empty()
    }

    async fn fetch(&self, request: &SeriesRequest) -> Result<CandleSeries> {
        let api_key = self
            .pick_key(&request.symbol)
            .ok_or_else(|| anyhow!("no Twelve Data API key configured"))?;

        let url = format!("{}/time_series", self.base_url);
        let limit = request.limit.min(5000).to_string();
        let url_with_query = build_url_with_query(
            &url,
            &[
                ("symbol", request.symbol.as_str()),
                ("interval", Self::interval(request.timeframe)),
                ("outputsize", limit.as_str()),
                ("apikey", api_key),
            ],
        );

        let response = self
            .client
            .get(&url_with_query)
            .send()
            .await
            .context("Failed to fetch time series from Twelve Data")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Twelve Data fetch failed: {}", error_text);
        }

        let payload: TimeSeriesResponse = response
            .json()
            .await
            .context("Failed to parse Twelve Data response")?;

        if payload.status.as_deref() == Some("error") {
            anyhow::bail!(
                "Twelve Data error: {}",
                payload.message.unwrap_or_else(|| "unknown".to_string())
            );
        }

        let candles: Vec<Candle> = payload
            .values
            .into_iter()
            .filter_map(|v| {
                let timestamp = parse_datetime_ms(&v.datetime)?;
                Some(Candle {
                    timestamp,
                    open: Decimal::from_str(&v.open).ok()?,
                    high: Decimal::from_str(&v.high).ok()?,
                    low: Decimal::from_str(&v.low).ok()?,
                    close: Decimal::from_str(&v.close).ok()?,
                    volume: v.volume.and_then(|raw| Decimal::from_str(&raw).ok()),
                })
            })
            .collect();

        debug!(
            "TwelveDataProvider: fetched {} candles for {}",
            candles.len(),
            request.symbol
        );

        // API returns newest-first; normalization fixes the order
        Ok(CandleSeries::normalized(candles))
    }
}

/// Parse the API's `YYYY-MM-DD[ HH:MM:SS]` local-naive datetime as UTC millis
fn parse_datetime_ms(raw: &str) -> Option<i64> {
    use chrono::{NaiveDate, NaiveDateTime};

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider(keys: &str) -> TwelveDataProvider {
        TwelveDataProvider::new(
            "https://api.twelvedata.com".to_string(),
            KeyPool::from_csv(keys),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_requires_a_key() {
        let request = SeriesRequest::new("XAU/USD", Timeframe::H1, 100);
        assert!(!provider("").supports(&request));
        assert!(provider("k1").supports(&request));
    }

    #[test]
    fn test_key_pick_is_stable_within_bucket() {
        let p = provider("k1,k2,k3");
        assert_eq!(p.pick_key("EUR/USD"), p.pick_key("EUR/USD"));
    }

    #[test]
    fn test_datetime_parsing() {
        assert_eq!(
            parse_datetime_ms("2024-01-01 00:00:00"),
            Some(1704067200000)
        );
        assert_eq!(parse_datetime_ms("2024-01-01"), Some(1704067200000));
        assert_eq!(parse_datetime_ms("not a date"), None);
    }
}
