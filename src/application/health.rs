//! Per-provider circuit breaking.
//!
//! Each provider has a failure counter and an optional cooldown deadline.
//! A provider with a live deadline is Open and skipped by the chain walk;
//! once the deadline elapses it is Closed again (lazy expiry on read, no
//! background sweeping). Any success fully resets the counter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
struct ProviderHealth {
    failure_count: u32,
    cooldown_until: Option<Instant>,
}

/// Shared health state for all providers of one domain.
///
/// Readers and writers race freely; last-write-wins on the counter is
/// acceptable since the cost of an occasional extra attempt is low.
pub struct ProviderHealthRegistry {
    entries: Arc<RwLock<HashMap<String, ProviderHealth>>>,
    base_cooldown: Duration,
    max_cooldown: Duration,
}

impl ProviderHealthRegistry {
    pub fn new(base_cooldown: Duration, max_cooldown: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            base_cooldown,
            max_cooldown,
        }
    }

    /// Clears failure count and cooldown (-> Closed)
    pub async fn record_success(&self, provider: &str) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(provider.to_string()).or_default();

        if entry.failure_count > 0 || entry.cooldown_until.is_some() {
            info!(
                "ProviderHealth [{}]: recovered after {} failures",
                provider, entry.failure_count
            );
        }
        entry.failure_count = 0;
        entry.cooldown_until = None;
    }

    /// Increments the failure count and extends the cooldown deadline with
    /// capped exponential backoff (-> Open)
    pub async fn record_failure(&self, provider: &str) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(provider.to_string()).or_default();

        entry.failure_count = entry.failure_count.saturating_add(1);
        let cooldown = self.cooldown_for(entry.failure_count);
        entry.cooldown_until = Some(Instant::now() + cooldown);

        warn!(
            "ProviderHealth [{}]: failure #{}, cooling down for {:?}",
            provider, entry.failure_count, cooldown
        );
    }

    /// Is this provider currently Open (excluded from chains)?
    ///
    /// An elapsed deadline is cleared here on read and reports Closed.
    pub async fn in_cooldown(&self, provider: &str) -> bool {
        {
            let entries = self.entries.read().await;
            match entries.get(provider).and_then(|e| e.cooldown_until) {
                None => return false,
                Some(until) if until > Instant::now() => return true,
                Some(_) => {} // elapsed, clear below
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(provider)
            && let Some(until) = entry.cooldown_until
            && until <= Instant::now()
        {
            debug!("ProviderHealth [{}]: cooldown elapsed, closing", provider);
            entry.cooldown_until = None;
        }
        false
    }

    /// Consecutive failure count (0 if unknown)
    pub async fn failure_count(&self, provider: &str) -> u32 {
        let entries = self.entries.read().await;
        entries.get(provider).map(|e| e.failure_count).unwrap_or(0)
    }

    /// base * 2^(failures-1), capped at max_cooldown
    fn cooldown_for(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(16);
        let scaled = self.base_cooldown.saturating_mul(1u32 << exp);
        scaled.min(self.max_cooldown)
    }
}
