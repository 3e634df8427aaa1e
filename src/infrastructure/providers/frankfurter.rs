//! Frankfurter FX adapter, the lowest-common-denominator market provider.
//!
//! Keyless daily ECB reference rates. Only daily granularity exists
//! upstream, and one rate per day, so candles come back with equal OHLC and
//! no volume. Good enough to keep a chain non-empty when everything keyed
//! is down; the quality flag tells callers what they got.

use crate::domain::market::candle::{Candle, CandleSeries};
use crate::domain::market::series::SeriesRequest;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::MarketProvider;
use crate::infrastructure::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

pub struct FrankfurterProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url,
        }
    }

    /// `EUR/USD` -> `("EUR", "USD")` when both legs are ISO currency codes
    fn currency_pair(symbol: &str) -> Option<(&str, &str)> {
        let (base, quote) = symbol.split_once('/')?;
        let is_iso = |s: &str| s.len() == 3 && s.chars().all(|c| c.is_ascii_uppercase());
        (is_iso(base) && is_iso(quote)).then_some((base, quote))
    }
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    rates: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

#[async_trait]
impl MarketProvider for FrankfurterProvider {
    fn id(&self) -> &str {
        "frankfurter"
    }

    /// ISO currency pairs only; sub-daily granularities cannot be served
    fn supports(&self, request: &SeriesRequest) -> bool {
        request.timeframe == Timeframe::D1 && Self::currency_pair(&request.symbol).is_some()
    }

    async fn fetch(&self, request: &SeriesRequest) -> Result<CandleSeries> {
        let (base, quote) = Self::currency_pair(&request.symbol)
            .ok_or_else(|| anyhow::anyhow!("not a currency pair: {}", request.symbol))?;

        // Daily data: limit candles back from today, padded for weekends
        let end = Utc::now().date_naive();
        let span_days = (request.limit as i64).saturating_mul(7) / 5 + 3;
        let start = end - ChronoDuration::days(span_days);

        let url = format!("{}/{}..{}", self.base_url, start, end);
        let url_with_query =
            build_url_with_query(&url, &[("base", base), ("symbols", quote)]);

        let response = self
            .client
            .get(&url_with_query)
            .send()
            .await
            .context("Failed to fetch rates from Frankfurter")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Frankfurter fetch failed: {}", error_text);
        }

        let payload: TimeseriesResponse = response
            .json()
            .await
            .context("Failed to parse Frankfurter response")?;

        let candles: Vec<Candle> = payload
            .rates
            .into_iter()
            .filter_map(|(date, rates)| {
                let rate = Decimal::from_f64_retain(*rates.get(quote)?)?;
                let timestamp = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
                Some(Candle {
                    timestamp,
                    open: rate,
                    high: rate,
                    low: rate,
                    close: rate,
                    volume: None,
                })
            })
            .collect();

        debug!(
            "FrankfurterProvider: fetched {} daily rates for {}",
            candles.len(),
            request.symbol
        );

        let mut series = CandleSeries::normalized(candles).into_candles();
        if series.len() > request.limit {
            series.drain(..series.len() - request.limit);
        }
        Ok(CandleSeries::normalized(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_pair_detection() {
        assert_eq!(
            FrankfurterProvider::currency_pair("EUR/USD"),
            Some(("EUR", "USD"))
        );
        assert_eq!(FrankfurterProvider::currency_pair("BTC/USDT"), None);
        assert_eq!(FrankfurterProvider::currency_pair("AAPL"), None);
    }

    #[test]
    fn test_supports_daily_fx_only() {
        let provider = FrankfurterProvider::new("https://api.frankfurter.dev/v1".to_string());

        assert!(provider.supports(&SeriesRequest::new("EUR/USD", Timeframe::D1, 30)));
        assert!(!provider.supports(&SeriesRequest::new("EUR/USD", Timeframe::H1, 30)));
        assert!(!provider.supports(&SeriesRequest::new("BTC/USDT", Timeframe::D1, 30)));
    }
}
