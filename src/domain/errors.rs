use crate::domain::market::timeframe::Timeframe;
use thiserror::Error;

/// Failure taxonomy of the acquisition engine.
///
/// Individual provider failures (`Timeout`, `ProviderFailure`) are always
/// recovered inside the orchestrators: logged, fed into the health registry,
/// and the chain continues. Only total exhaustion (`DataUnavailable`,
/// `AllProvidersFailed`) surfaces to callers, who are expected to substitute
/// their own degraded response.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("provider {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("provider {provider} failed: {cause}")]
    ProviderFailure {
        provider: String,
        cause: anyhow::Error,
    },

    #[error("no data available for {symbol} at {timeframe} after exhausting all fallbacks")]
    DataUnavailable { symbol: String, timeframe: Timeframe },

    #[error("all {attempted} generation providers failed")]
    AllProvidersFailed { attempted: usize },
}

impl AcquireError {
    /// Provider id this failure is attributed to, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            AcquireError::Timeout { provider, .. } => Some(provider),
            AcquireError::ProviderFailure { provider, .. } => Some(provider),
            _ => None,
        }
    }
}
