//! Scripted providers and an in-memory cache store for tests.
//!
//! Each scripted provider plays back a fixed list of outcomes, one per call,
//! repeating the last entry once the script runs out. Call counts are
//! observable so tests can assert how far a chain walked.

use crate::domain::generation::GenerationRequest;
use crate::domain::market::candle::{Candle, CandleSeries};
use crate::domain::market::series::SeriesRequest;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{CacheStore, MarketProvider, TextProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What one scripted call should do
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Return this many synthetic candles (0 = empty result)
    Candles(usize),
    /// Return this text (may be blank)
    Text(String),
    /// Fail with an error
    Fail(String),
    /// Never complete (the executor's timeout must fire)
    Hang,
}

fn synthetic_series(count: usize, timeframe_minutes: i64) -> CandleSeries {
    // Deterministic series ending at a fixed anchor so tests are stable
    let anchor = 1704067200000i64; // 2024-01-01 00:00:00 UTC
    let step = timeframe_minutes * 60_000;
    let candles = (0..count)
        .map(|i| {
            let price = Decimal::from(100 + (i % 10) as i64);
            Candle {
                timestamp: anchor + (i as i64) * step,
                open: price,
                high: price + Decimal::ONE,
                low: price - Decimal::ONE,
                close: price,
                volume: Some(Decimal::from(1000)),
            }
        })
        .collect();
    CandleSeries::normalized(candles)
}

pub struct ScriptedMarketProvider {
    id: String,
    script: Mutex<Vec<ScriptedOutcome>>,
    calls: AtomicUsize,
    supports_all: bool,
    only_timeframe: Option<Timeframe>,
}

impl ScriptedMarketProvider {
    pub fn new(id: impl Into<String>, script: Vec<ScriptedOutcome>) -> Self {
        Self {
            id: id.into(),
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            supports_all: true,
            only_timeframe: None,
        }
    }

    /// A provider whose capability predicate rejects everything
    pub fn unsupported(id: impl Into<String>) -> Self {
        let mut provider = Self::new(id, vec![]);
        provider.supports_all = false;
        provider
    }

    /// A provider that only serves one granularity
    pub fn for_timeframe(
        id: impl Into<String>,
        timeframe: Timeframe,
        script: Vec<ScriptedOutcome>,
    ) -> Self {
        let mut provider = Self::new(id, script);
        provider.only_timeframe = Some(timeframe);
        provider
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> ScriptedOutcome {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script
                .first()
                .cloned()
                .unwrap_or(ScriptedOutcome::Fail("script exhausted".to_string()))
        }
    }
}

#[async_trait]
impl MarketProvider for ScriptedMarketProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn supports(&self, request: &SeriesRequest) -> bool {
        if !self.supports_all {
            return false;
        }
        self.only_timeframe
            .is_none_or(|tf| request.timeframe == tf)
    }

    async fn fetch(&self, request: &SeriesRequest) -> Result<CandleSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_outcome() {
            ScriptedOutcome::Candles(n) => {
                Ok(synthetic_series(n, request.timeframe.minutes() as i64))
            }
            ScriptedOutcome::Fail(msg) => Err(anyhow!(msg)),
            ScriptedOutcome::Hang => {
                futures_never().await;
                unreachable!()
            }
            ScriptedOutcome::Text(_) => Err(anyhow!("text outcome on a market provider")),
        }
    }
}

pub struct ScriptedTextProvider {
    id: String,
    script: Mutex<Vec<ScriptedOutcome>>,
    calls: AtomicUsize,
    ready: bool,
}

impl ScriptedTextProvider {
    pub fn new(id: impl Into<String>, script: Vec<ScriptedOutcome>) -> Self {
        Self {
            id: id.into(),
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            ready: true,
        }
    }

    pub fn not_ready(id: impl Into<String>) -> Self {
        let mut provider = Self::new(id, vec![]);
        provider.ready = false;
        provider
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> ScriptedOutcome {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script
                .first()
                .cloned()
                .unwrap_or(ScriptedOutcome::Fail("script exhausted".to_string()))
        }
    }
}

#[async_trait]
impl TextProvider for ScriptedTextProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn ready(&self) -> bool {
        self.ready
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_outcome() {
            ScriptedOutcome::Text(text) => Ok(text),
            ScriptedOutcome::Fail(msg) => Err(anyhow!(msg)),
            ScriptedOutcome::Hang => {
                futures_never().await;
                unreachable!()
            }
            ScriptedOutcome::Candles(_) => Err(anyhow!("candle outcome on a text provider")),
        }
    }
}

async fn futures_never() {
    // Pending forever; dropped when the executor's timeout fires
    std::future::pending::<()>().await
}

/// In-memory `CacheStore` with real TTL semantics, for tests that should
/// not touch SQLite
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, (String, i64)>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Insert an entry that expired in the past, for stale-read tests
    pub fn put_expired(&self, key: &str, value: &str, expired_ms_ago: i64) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            (value.to_string(), Self::now_ms() - expired_ms_ago),
        );
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Self::now_ms())
            .map(|(value, _)| value.clone()))
    }

    async fn get_stale(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            (value.to_string(), Self::now_ms() + ttl.as_millis() as i64),
        );
        Ok(())
    }
}
