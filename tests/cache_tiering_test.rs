//! Tiered cache semantics against the real SQLite durable store.

use datafall::application::cache::{TierHit, TieredCache};
use datafall::domain::market::{Candle, CandleSeries};
use datafall::domain::ports::CacheStore;
use datafall::infrastructure::persistence::SqliteCacheStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

async fn memory_store() -> Arc<SqliteCacheStore> {
    Arc::new(
        SqliteCacheStore::new("sqlite::memory:")
            .await
            .expect("in-memory sqlite"),
    )
}

fn sample_series(count: usize) -> CandleSeries {
    let candles = (0..count)
        .map(|i| {
            let price = Decimal::from(50 + i as i64);
            Candle {
                timestamp: 1704067200000 + (i as i64) * 3_600_000,
                open: price,
                high: price,
                low: price,
                close: price,
                volume: None,
            }
        })
        .collect();
    CandleSeries::normalized(candles)
}

/// A put lands in both tiers: the durable store can be read directly, and
/// the next lookup is a fast-tier hit.
#[tokio::test]
async fn test_write_through_lands_in_both_tiers() {
    let store = memory_store().await;
    let cache = TieredCache::new(store.clone(), 16, Duration::from_secs(300));

    cache
        .put("k1", "v1".to_string(), Duration::from_secs(300))
        .await;

    let durable = store.get("k1").await.expect("sqlite read");
    assert_eq!(durable.as_deref(), Some("v1"));

    let (value, tier) = cache.get_with_tier("k1").await.expect("hit");
    assert_eq!(value, "v1");
    assert_eq!(tier, TierHit::Fast);
}

/// A value written behind the cache's back is found in the durable tier
/// and promoted, so the second lookup hits the fast tier.
#[tokio::test]
async fn test_durable_hit_promotes_to_fast() {
    let store = memory_store().await;
    store
        .put("k2", "v2", Duration::from_secs(300))
        .await
        .expect("sqlite write");

    let cache = TieredCache::new(store, 16, Duration::from_secs(300));

    let (value, tier) = cache.get_with_tier("k2").await.expect("hit");
    assert_eq!(value, "v2");
    assert_eq!(tier, TierHit::Durable);

    let (_, tier) = cache.get_with_tier("k2").await.expect("hit");
    assert_eq!(tier, TierHit::Fast);
}

/// Expired entries are invisible to normal reads but visible to the stale
/// accessor, which never promotes.
#[tokio::test]
async fn test_stale_read_does_not_promote() {
    let store = memory_store().await;
    store
        .put("k3", "old", Duration::ZERO)
        .await
        .expect("sqlite write");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let cache = TieredCache::new(store, 16, Duration::from_secs(300));

    assert!(cache.get("k3").await.is_none());
    assert_eq!(cache.get_stale("k3").await.as_deref(), Some("old"));
    // Still a miss on the normal path afterwards
    assert!(cache.get("k3").await.is_none());
}

/// Series round through the codec; corrupt and unknown-version payloads are
/// treated as misses instead of errors.
#[tokio::test]
async fn test_series_codec_skips_bad_payloads() {
    let store = memory_store().await;
    let cache = TieredCache::new(store.clone(), 16, Duration::from_secs(300));

    let series = sample_series(10);
    cache
        .put_series("good", &series, Duration::from_secs(300))
        .await;
    let read = cache.get_series("good").await.expect("decoded");
    assert_eq!(read, series);

    store
        .put("corrupt", "definitely not json", Duration::from_secs(300))
        .await
        .expect("sqlite write");
    assert!(cache.get_series("corrupt").await.is_none());

    store
        .put(
            "future",
            r#"{"version":99,"candles":[]}"#,
            Duration::from_secs(300),
        )
        .await
        .expect("sqlite write");
    assert!(cache.get_series("future").await.is_none());
}

/// Overwriting a key refreshes both tiers with the new value.
#[tokio::test]
async fn test_overwrite_replaces_both_tiers() {
    let store = memory_store().await;
    let cache = TieredCache::new(store.clone(), 16, Duration::from_secs(300));

    cache.put("k4", "first".to_string(), Duration::from_secs(300)).await;
    cache.put("k4", "second".to_string(), Duration::from_secs(300)).await;

    assert_eq!(cache.get("k4").await.as_deref(), Some("second"));
    let durable = store.get("k4").await.expect("sqlite read");
    assert_eq!(durable.as_deref(), Some("second"));
}
