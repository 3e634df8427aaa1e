use crate::domain::market::candle::CandleSeries;
use crate::domain::market::timeframe::Timeframe;
use serde::{Deserialize, Serialize};

/// A request for one candle series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Maximum number of candles wanted (providers may return fewer)
    pub limit: usize,
}

impl SeriesRequest {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, limit: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            limit,
        }
    }

    /// Same request re-targeted at another granularity, with the limit
    /// scaled so the finer fetch still covers the original time span.
    pub fn at_timeframe(&self, timeframe: Timeframe) -> Self {
        let factor = (self.timeframe.minutes() / timeframe.minutes()).max(1);
        Self {
            symbol: self.symbol.clone(),
            timeframe,
            limit: self.limit.saturating_mul(factor),
        }
    }

    /// Logical cache key shared by both cache tiers
    pub fn cache_key(&self) -> String {
        format!("market:{}:{}", self.symbol, self.timeframe.code())
    }
}

/// Confidence attached to a returned series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    /// Sample count met the configured minimum
    Full,
    /// Below the minimum bar, or served past its freshness window
    Limited,
}

/// Where the returned series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesSource {
    /// Fetched from a provider during this request
    Live,
    /// Served from a fresh cache tier
    Cached,
    /// Served from the durable tier past its TTL
    Stale,
    /// Rebuilt by downsampling a finer granularity
    Aggregated,
}

/// A resolved series plus the quality/provenance flags callers key off
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesResult {
    pub series: CandleSeries,
    pub quality: Quality,
    pub source: SeriesSource,
}

impl SeriesResult {
    pub fn new(series: CandleSeries, quality: Quality, source: SeriesSource) -> Self {
        Self {
            series,
            quality,
            source,
        }
    }
}
