//! Timeout-bounded provider execution.
//!
//! Each attempt races the adapter call against its own timer; a timeout
//! abandons the in-flight future without touching sibling attempts. Health
//! state is updated here, from actually observed outcomes only, never
//! speculatively. A syntactically valid but empty result (zero candles,
//! blank text) does not satisfy the contract and is recorded as a failure.

use crate::application::health::ProviderHealthRegistry;
use crate::domain::errors::AcquireError;
use crate::domain::generation::GenerationRequest;
use crate::domain::market::candle::CandleSeries;
use crate::domain::market::series::SeriesRequest;
use crate::domain::ports::{MarketProvider, TextProvider};
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct Executor {
    health: Arc<ProviderHealthRegistry>,
}

impl Executor {
    pub fn new(health: Arc<ProviderHealthRegistry>) -> Self {
        Self { health }
    }

    pub fn health(&self) -> &Arc<ProviderHealthRegistry> {
        &self.health
    }

    /// One candle fetch attempt against one provider
    pub async fn fetch_series(
        &self,
        provider: &dyn MarketProvider,
        request: &SeriesRequest,
        timeout: Duration,
    ) -> Result<CandleSeries, AcquireError> {
        let id = provider.id().to_string();

        let outcome = match tokio::time::timeout(timeout, provider.fetch(request)).await {
            Err(_elapsed) => Err(AcquireError::Timeout {
                provider: id.clone(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            Ok(Err(cause)) => Err(AcquireError::ProviderFailure {
                provider: id.clone(),
                cause,
            }),
            Ok(Ok(series)) if series.is_empty() => Err(AcquireError::ProviderFailure {
                provider: id.clone(),
                cause: anyhow!("provider returned an empty series"),
            }),
            Ok(Ok(series)) => Ok(series),
        };

        match &outcome {
            Ok(series) => {
                debug!(
                    "Executor: {} returned {} candles for {}",
                    id,
                    series.len(),
                    request.symbol
                );
                self.health.record_success(&id).await;
            }
            Err(e) => {
                warn!("Executor: {} attempt failed: {}", id, e);
                self.health.record_failure(&id).await;
            }
        }

        outcome
    }

    /// One generation attempt against one provider
    pub async fn generate_text(
        &self,
        provider: &dyn TextProvider,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<String, AcquireError> {
        let id = provider.id().to_string();

        let outcome = match tokio::time::timeout(timeout, provider.generate(request)).await {
            Err(_elapsed) => Err(AcquireError::Timeout {
                provider: id.clone(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            Ok(Err(cause)) => Err(AcquireError::ProviderFailure {
                provider: id.clone(),
                cause,
            }),
            Ok(Ok(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Err(AcquireError::ProviderFailure {
                        provider: id.clone(),
                        cause: anyhow!("provider returned blank text"),
                    })
                } else {
                    Ok(trimmed.to_string())
                }
            }
        };

        match &outcome {
            Ok(text) => {
                debug!("Executor: {} produced {} chars", id, text.len());
                self.health.record_success(&id).await;
            }
            Err(e) => {
                warn!("Executor: {} attempt failed: {}", id, e);
                self.health.record_failure(&id).await;
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::timeframe::Timeframe;
    use crate::infrastructure::mock::{ScriptedMarketProvider, ScriptedOutcome};

    fn executor() -> Executor {
        Executor::new(Arc::new(ProviderHealthRegistry::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
        )))
    }

    fn request() -> SeriesRequest {
        SeriesRequest::new("BTC/USDT", Timeframe::M15, 30)
    }

    #[tokio::test]
    async fn test_success_records_health() {
        let exec = executor();
        let provider = ScriptedMarketProvider::new("p", vec![ScriptedOutcome::Candles(5)]);

        let series = exec
            .fetch_series(&provider, &request(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(series.len(), 5);
        assert_eq!(exec.health().failure_count("p").await, 0);
        assert!(!exec.health().in_cooldown("p").await);
    }

    #[tokio::test]
    async fn test_timeout_is_typed_and_bounded() {
        let exec = executor();
        let provider = ScriptedMarketProvider::new("slow", vec![ScriptedOutcome::Hang]);

        let started = std::time::Instant::now();
        let err = exec
            .fetch_series(&provider, &request(), Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(matches!(err, AcquireError::Timeout { .. }));
        assert!(exec.health().in_cooldown("slow").await);
    }

    #[tokio::test]
    async fn test_empty_series_is_a_failure() {
        let exec = executor();
        let provider = ScriptedMarketProvider::new("empty", vec![ScriptedOutcome::Candles(0)]);

        let err = exec
            .fetch_series(&provider, &request(), Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::ProviderFailure { .. }));
        assert_eq!(exec.health().failure_count("empty").await, 1);
    }
}
