//! Cache tiers.
//!
//! The fast tier is process-local with short TTLs and a bounded capacity
//! (oldest-inserted eviction). The durable tier is an external TTL-stamped
//! blob store reached through the `CacheStore` port. Invariants:
//! a durable write always refreshes the fast tier, and a fast-tier hit never
//! triggers a durable read.

use crate::domain::market::candle::{CachedSeries, CandleSeries};
use crate::domain::ports::CacheStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct FastEntry {
    value: String,
    expires_at: Instant,
    seq: u64,
}

/// Process-local ephemeral tier
pub struct FastCache {
    entries: RwLock<HashMap<String, FastEntry>>,
    capacity: usize,
    seq: RwLock<u64>,
}

impl FastCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            seq: RwLock::new(0),
        }
    }

    /// Fresh value for the key, if present
    pub fn get(&self, key: &str) -> Option<String> {
        let guard = match self.entries.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone())
    }

    pub fn put(&self, key: &str, value: String, ttl: Duration) {
        let seq = {
            let mut counter = match self.seq.write() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            *counter += 1;
            *counter
        };

        let mut guard = match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("FastCache: lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };

        guard.insert(
            key.to_string(),
            FastEntry {
                value,
                expires_at: Instant::now() + ttl,
                seq,
            },
        );

        // Bounded growth: drop the oldest-inserted entry when over capacity
        while guard.len() > self.capacity {
            if let Some(oldest) = guard
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone())
            {
                guard.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which tier satisfied a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierHit {
    Fast,
    Durable,
}

/// Fast tier backed by the durable tier, with write-through and promotion
pub struct TieredCache {
    fast: FastCache,
    durable: Arc<dyn CacheStore>,
    fast_ttl: Duration,
}

impl TieredCache {
    pub fn new(durable: Arc<dyn CacheStore>, fast_capacity: usize, fast_ttl: Duration) -> Self {
        Self {
            fast: FastCache::new(fast_capacity),
            durable,
            fast_ttl,
        }
    }

    /// Fast tier first; on a miss, the durable tier, promoting any hit.
    /// A fast hit short-circuits without touching the durable backend.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.get_with_tier(key).await.map(|(value, _)| value)
    }

    /// Same as `get`, reporting which tier answered
    pub async fn get_with_tier(&self, key: &str) -> Option<(String, TierHit)> {
        if let Some(value) = self.fast.get(key) {
            debug!("TieredCache: fast hit for {}", key);
            return Some((value, TierHit::Fast));
        }

        match self.durable.get(key).await {
            Ok(Some(value)) => {
                debug!("TieredCache: durable hit for {}, promoting", key);
                self.fast.put(key, value.clone(), self.fast_ttl);
                Some((value, TierHit::Durable))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("TieredCache: durable read failed for {}: {:#}", key, e);
                None
            }
        }
    }

    /// Durable-tier read ignoring expiry. No fast-tier promotion: a stale
    /// value must not mask a fresher one that a provider could still return
    /// to a concurrent request.
    pub async fn get_stale(&self, key: &str) -> Option<String> {
        match self.durable.get_stale(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!("TieredCache: stale read failed for {}: {:#}", key, e);
                None
            }
        }
    }

    /// Write-through: durable first, then the fast tier, so a durable write
    /// always results in a subsequent fast hit within the fast TTL.
    pub async fn put(&self, key: &str, value: String, durable_ttl: Duration) {
        if let Err(e) = self.durable.put(key, &value, durable_ttl).await {
            warn!("TieredCache: durable write failed for {}: {:#}", key, e);
        }
        self.fast.put(key, value, self.fast_ttl);
    }

    // Typed helpers for the candle-series payloads both orchestrator paths use

    pub async fn get_series(&self, key: &str) -> Option<CandleSeries> {
        self.get(key).await.and_then(|raw| decode_series(key, &raw))
    }

    pub async fn get_series_with_tier(&self, key: &str) -> Option<(CandleSeries, TierHit)> {
        let (raw, tier) = self.get_with_tier(key).await?;
        decode_series(key, &raw).map(|series| (series, tier))
    }

    pub async fn get_series_stale(&self, key: &str) -> Option<CandleSeries> {
        self.get_stale(key)
            .await
            .and_then(|raw| decode_series(key, &raw))
    }

    pub async fn put_series(&self, key: &str, series: &CandleSeries, durable_ttl: Duration) {
        match serde_json::to_string(&CachedSeries::new(series)) {
            Ok(encoded) => self.put(key, encoded, durable_ttl).await,
            Err(e) => warn!("TieredCache: failed to encode series for {}: {}", key, e),
        }
    }
}

/// Decode a cached payload, skipping corrupt or unknown-version records
fn decode_series(key: &str, raw: &str) -> Option<CandleSeries> {
    match serde_json::from_str::<CachedSeries>(raw) {
        Ok(record) if record.version == CachedSeries::CURRENT_VERSION => {
            Some(record.into_series())
        }
        Ok(record) => {
            warn!(
                "TieredCache: version {} payload for {} not understood, ignoring",
                record.version, key
            );
            None
        }
        Err(e) => {
            warn!("TieredCache: corrupt payload for {}: {}", key, e);
            None
        }
    }
}
