//! Market-data acquisition orchestrator.
//!
//! One request walks a fixed ladder, each step attempted at most once:
//! fast cache, durable cache, the rotated provider chain, best partial seen,
//! stale durable read, cross-resolution rebuild from a finer granularity,
//! and finally a stale scan across all finer granularities. Only when every
//! rung is empty does the caller see `DataUnavailable`.

use crate::application::cache::{TierHit, TieredCache};
use crate::application::chain::resolve_chain;
use crate::application::executor::Executor;
use crate::application::market_data::downsample::downsample;
use crate::application::rotation::{request_seed, time_bucket};
use crate::domain::errors::AcquireError;
use crate::domain::market::candle::CandleSeries;
use crate::domain::market::series::{Quality, SeriesRequest, SeriesResult, SeriesSource};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::MarketProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Operator-tunable knobs for the market orchestrator
#[derive(Debug, Clone)]
pub struct SeriesSettings {
    /// Budget for one provider attempt
    pub provider_timeout: Duration,
    /// Sample count below which a result is quality-Limited
    pub min_samples: usize,
    /// Candle count requested from providers
    pub fetch_limit: usize,
    /// TTL for durable-tier writes
    pub durable_ttl: Duration,
    /// Soft overall budget for the whole ladder; checked between steps
    pub ladder_deadline: Duration,
    /// Width of the rotation time bucket
    pub rotation_bucket: Duration,
    /// Lowest-common-denominator provider id used when the capability
    /// filter leaves nothing
    pub default_provider: String,
}

impl Default for SeriesSettings {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(8),
            min_samples: 30,
            fetch_limit: 200,
            durable_ttl: Duration::from_secs(900),
            ladder_deadline: Duration::from_secs(30),
            rotation_bucket: Duration::from_secs(60),
            default_provider: String::new(),
        }
    }
}

/// Outcome of walking one provider chain
struct ChainWalkOutcome {
    full: Option<CandleSeries>,
    best_partial: Option<CandleSeries>,
}

pub struct SeriesService {
    providers: Vec<Arc<dyn MarketProvider>>,
    executor: Arc<Executor>,
    cache: Arc<TieredCache>,
    settings: SeriesSettings,
}

impl SeriesService {
    pub fn new(
        providers: Vec<Arc<dyn MarketProvider>>,
        executor: Arc<Executor>,
        cache: Arc<TieredCache>,
        settings: SeriesSettings,
    ) -> Self {
        Self {
            providers,
            executor,
            cache,
            settings,
        }
    }

    /// Resolve one candle series, degrading through the fallback ladder.
    pub async fn get_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<SeriesResult, AcquireError> {
        let request = SeriesRequest::new(symbol, timeframe, self.settings.fetch_limit);
        let deadline = Instant::now() + self.settings.ladder_deadline;
        let key = request.cache_key();

        // Steps 1-2: cache tiers. A fast hit returns whatever is there;
        // a durable hit must meet the size bar to end the request.
        // Partials kept for step 4 carry the source they actually came from.
        let mut best_partial: Option<(CandleSeries, SeriesSource)> = None;
        if let Some((series, tier)) = self.cache.get_series_with_tier(&key).await {
            let quality = self.quality_of(&series);
            match tier {
                TierHit::Fast => {
                    return Ok(SeriesResult::new(series, quality, SeriesSource::Cached));
                }
                TierHit::Durable if quality == Quality::Full => {
                    return Ok(SeriesResult::new(series, quality, SeriesSource::Cached));
                }
                TierHit::Durable => {
                    debug!(
                        "SeriesService: durable entry for {} below size bar ({} candles), continuing",
                        key,
                        series.len()
                    );
                    best_partial = Some((series, SeriesSource::Cached));
                }
            }
        }

        // Step 3: walk the provider chain
        let walk = self.chain_walk(&request, deadline).await;
        if let Some(series) = walk.full {
            self.cache
                .put_series(&key, &series, self.settings.durable_ttl)
                .await;
            return Ok(SeriesResult::new(series, Quality::Full, SeriesSource::Live));
        }
        if let Some(partial) = walk.best_partial {
            let keep = match &best_partial {
                Some((existing, _)) => partial.len() > existing.len(),
                None => true,
            };
            if keep {
                best_partial = Some((partial, SeriesSource::Live));
            }
        }

        // Step 4: best partial, only after the whole chain was given a chance
        if let Some((series, source)) = best_partial {
            info!(
                "SeriesService: serving best partial for {} ({} candles, {:?})",
                key,
                series.len(),
                source
            );
            return Ok(SeriesResult::new(series, Quality::Limited, source));
        }

        // Step 5: stale durable read for the same key
        if let Some(series) = self.cache.get_series_stale(&key).await {
            info!("SeriesService: serving stale cache for {}", key);
            return Ok(SeriesResult::new(
                series,
                Quality::Limited,
                SeriesSource::Stale,
            ));
        }

        // Step 6: rebuild from a finer granularity through the same chain
        if let Some(result) = self.cross_resolution(&request, deadline).await {
            return Ok(result);
        }

        // Step 7: stale scan across all finer granularities
        if let Some(result) = self.stale_scan(&request).await {
            return Ok(result);
        }

        Err(AcquireError::DataUnavailable {
            symbol: request.symbol,
            timeframe,
        })
    }

    /// Try each provider in the resolved chain once. Stops at the first
    /// full-quality result; partials are persisted and the best one kept.
    async fn chain_walk(&self, request: &SeriesRequest, deadline: Instant) -> ChainWalkOutcome {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let bucket = time_bucket(now_ms, self.settings.rotation_bucket.as_millis() as i64);
        let subject = format!("{}:{}", request.symbol, request.timeframe.code());
        let seed = request_seed(&subject, bucket);

        let chain = resolve_chain(
            &self.providers,
            |p| p.supports(request),
            &seed,
            &self.settings.default_provider,
            |p| p.id(),
        );

        debug!(
            "SeriesService: chain for {} = [{}]",
            subject,
            chain
                .iter()
                .map(|p| p.id())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut best_partial: Option<CandleSeries> = None;
        let key = request.cache_key();

        for provider in chain {
            if Instant::now() >= deadline {
                warn!(
                    "SeriesService: ladder deadline reached while walking chain for {}",
                    key
                );
                break;
            }
            if self.executor.health().in_cooldown(provider.id()).await {
                debug!("SeriesService: skipping {} (cooldown)", provider.id());
                continue;
            }

            match self
                .executor
                .fetch_series(provider.as_ref(), request, self.settings.provider_timeout)
                .await
            {
                Ok(series) if series.len() >= self.settings.min_samples => {
                    return ChainWalkOutcome {
                        full: Some(series),
                        best_partial,
                    };
                }
                Ok(series) => {
                    // Below the bar: persist anyway, keep the best, seek better
                    info!(
                        "SeriesService: {} returned {} candles for {} (min {}), continuing chain",
                        provider.id(),
                        series.len(),
                        key,
                        self.settings.min_samples
                    );
                    self.cache
                        .put_series(&key, &series, self.settings.durable_ttl)
                        .await;
                    let better = best_partial
                        .as_ref()
                        .map(|b| series.len() > b.len())
                        .unwrap_or(true);
                    if better {
                        best_partial = Some(series);
                    }
                }
                Err(_) => {
                    // Logged and health-recorded by the executor; move on
                }
            }
        }

        ChainWalkOutcome {
            full: None,
            best_partial,
        }
    }

    /// Step 6: source a finer granularity (cache, then chain; depth 1) and
    /// downsample it into the requested one.
    async fn cross_resolution(
        &self,
        request: &SeriesRequest,
        deadline: Instant,
    ) -> Option<SeriesResult> {
        for finer in request.timeframe.finer_sources() {
            if Instant::now() >= deadline {
                warn!(
                    "SeriesService: ladder deadline reached before trying {} source",
                    finer
                );
                break;
            }

            let sub_request = request.at_timeframe(finer);
            let sub_key = sub_request.cache_key();

            let source = if let Some((series, _)) =
                self.cache.get_series_with_tier(&sub_key).await
            {
                Some(series)
            } else {
                let walk = self.chain_walk(&sub_request, deadline).await;
                if let Some(series) = &walk.full {
                    self.cache
                        .put_series(&sub_key, series, self.settings.durable_ttl)
                        .await;
                }
                walk.full.or(walk.best_partial)
            };

            let Some(fine_series) = source else {
                continue;
            };

            let rebuilt = downsample(&fine_series, finer, request.timeframe);
            if rebuilt.is_empty() {
                continue;
            }

            info!(
                "SeriesService: rebuilt {} {} candles from {} {} candles",
                rebuilt.len(),
                request.timeframe,
                fine_series.len(),
                finer
            );

            let quality = self.quality_of(&rebuilt);
            if quality == Quality::Full {
                self.cache
                    .put_series(&request.cache_key(), &rebuilt, self.settings.durable_ttl)
                    .await;
            }
            return Some(SeriesResult::new(rebuilt, quality, SeriesSource::Aggregated));
        }

        None
    }

    /// Step 7: last resort. Stale reads across every finer granularity,
    /// remapped with the same bucketing rule.
    async fn stale_scan(&self, request: &SeriesRequest) -> Option<SeriesResult> {
        for candidate in Timeframe::all() {
            let usable = candidate.minutes() < request.timeframe.minutes()
                && request.timeframe.minutes() % candidate.minutes() == 0;
            if !usable {
                continue;
            }

            let key = request.at_timeframe(candidate).cache_key();
            let Some(series) = self.cache.get_series_stale(&key).await else {
                continue;
            };

            let rebuilt = downsample(&series, candidate, request.timeframe);
            if rebuilt.is_empty() {
                continue;
            }

            info!(
                "SeriesService: stale scan rebuilt {} from expired {} entry",
                request.cache_key(),
                candidate
            );
            return Some(SeriesResult::new(
                rebuilt,
                Quality::Limited,
                SeriesSource::Aggregated,
            ));
        }

        None
    }

    fn quality_of(&self, series: &CandleSeries) -> Quality {
        if series.len() >= self.settings.min_samples {
            Quality::Full
        } else {
            Quality::Limited
        }
    }
}
