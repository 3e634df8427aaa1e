//! Boundary traits between the engine and its collaborators.
//!
//! Provider adapters encapsulate one external source each (URL scheme,
//! parameter mapping, response parsing); the engine is agnostic to their
//! internals. The durable cache backend is an external key/value store with
//! its own timeout semantics.

use crate::domain::generation::GenerationRequest;
use crate::domain::market::candle::CandleSeries;
use crate::domain::market::series::SeriesRequest;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One external candle source
#[async_trait]
pub trait MarketProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Capability predicate: can this provider serve this request shape?
    /// Typically checks the symbol's asset class and credential presence.
    fn supports(&self, request: &SeriesRequest) -> bool;

    async fn fetch(&self, request: &SeriesRequest) -> Result<CandleSeries>;
}

/// One external text generation source
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Capability predicate: credentials configured, endpoint known
    fn ready(&self) -> bool;

    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Durable cache tier: TTL-stamped opaque blobs keyed by logical cache key.
///
/// `get` respects expiry; `get_stale` is the explicit stale-allow read used
/// by the fallback ladder. No schema is imposed on values beyond being
/// serialized strings.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn get_stale(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}
