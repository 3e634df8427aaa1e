//! Text-generation orchestrator.
//!
//! Lighter ladder than the market variant: walk the rotated chain once under
//! a shared remaining-time budget, then one reduced-size pass through the
//! same chain, then `AllProvidersFailed`. The engine never synthesizes a
//! local fallback response; that stays with the caller, which has the
//! structured inputs to build a deterministic degraded answer.

use crate::application::chain::resolve_chain;
use crate::application::executor::Executor;
use crate::application::rotation::{request_seed, time_bucket};
use crate::domain::errors::AcquireError;
use crate::domain::generation::{GenerationRequest, TextResult};
use crate::domain::ports::TextProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Operator-tunable knobs for the generative orchestrator
#[derive(Debug, Clone)]
pub struct TextSettings {
    /// Budget for one provider attempt
    pub provider_timeout: Duration,
    /// Shared budget across the whole request (both passes)
    pub overall_budget: Duration,
    /// Attempts are skipped once the remaining budget drops below this
    pub min_attempt_budget: Duration,
    /// Width of the rotation time bucket
    pub rotation_bucket: Duration,
    /// Provider used when no configured provider is ready
    pub default_provider: String,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(20),
            overall_budget: Duration::from_secs(45),
            min_attempt_budget: Duration::from_millis(750),
            rotation_bucket: Duration::from_secs(60),
            default_provider: String::new(),
        }
    }
}

pub struct TextService {
    providers: Vec<Arc<dyn TextProvider>>,
    executor: Arc<Executor>,
    settings: TextSettings,
}

impl TextService {
    pub fn new(
        providers: Vec<Arc<dyn TextProvider>>,
        executor: Arc<Executor>,
        settings: TextSettings,
    ) -> Self {
        Self {
            providers,
            executor,
            settings,
        }
    }

    /// Run the chain for one request; first non-empty trimmed result wins.
    ///
    /// `order_override` replaces the configured provider order for this
    /// request only (still filtered by readiness and rotated).
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        order_override: Option<&[String]>,
    ) -> Result<TextResult, AcquireError> {
        let deadline = Instant::now() + self.settings.overall_budget;
        let chain = self.resolve(request, order_override);

        if chain.is_empty() {
            warn!("TextService: no generation providers available");
            return Err(AcquireError::AllProvidersFailed { attempted: 0 });
        }

        let mut attempted = 0usize;

        if let Some(result) = self
            .walk(&chain, request, deadline, true, &mut attempted)
            .await
        {
            return Ok(result);
        }

        // Whole chain failed once: a single cheaper pass within what is
        // left of the budget, then concede. The pass ignores cooldowns,
        // since every provider that just failed is now in one.
        let reduced = request.reduced();
        info!(
            "TextService: chain exhausted, retrying once with reduced request ({} chars)",
            reduced.prompt.len()
        );
        if let Some(result) = self
            .walk(&chain, &reduced, deadline, false, &mut attempted)
            .await
        {
            return Ok(result);
        }

        Err(AcquireError::AllProvidersFailed { attempted })
    }

    fn resolve(
        &self,
        request: &GenerationRequest,
        order_override: Option<&[String]>,
    ) -> Vec<Arc<dyn TextProvider>> {
        let ordered: Vec<Arc<dyn TextProvider>> = match order_override {
            Some(order) => order
                .iter()
                .filter_map(|id| {
                    self.providers
                        .iter()
                        .find(|p| p.id() == id.as_str())
                        .cloned()
                })
                .collect(),
            None => self.providers.clone(),
        };

        let now_ms = chrono::Utc::now().timestamp_millis();
        let bucket = time_bucket(now_ms, self.settings.rotation_bucket.as_millis() as i64);
        let seed = request_seed(&request.fingerprint(), bucket);

        resolve_chain(
            &ordered,
            |p| p.ready(),
            &seed,
            &self.settings.default_provider,
            |p| p.id(),
        )
    }

    /// One pass over the chain under the shared deadline
    async fn walk(
        &self,
        chain: &[Arc<dyn TextProvider>],
        request: &GenerationRequest,
        deadline: Instant,
        respect_cooldown: bool,
        attempted: &mut usize,
    ) -> Option<TextResult> {
        for provider in chain {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining < self.settings.min_attempt_budget {
                warn!(
                    "TextService: {:?} left in budget, skipping remaining providers",
                    remaining
                );
                break;
            }
            if respect_cooldown && self.executor.health().in_cooldown(provider.id()).await {
                debug!("TextService: skipping {} (cooldown)", provider.id());
                continue;
            }

            *attempted += 1;
            let timeout = self.settings.provider_timeout.min(remaining);
            match self
                .executor
                .generate_text(provider.as_ref(), request, timeout)
                .await
            {
                Ok(text) => {
                    return Some(TextResult {
                        text,
                        provider: provider.id().to_string(),
                    });
                }
                Err(_) => {
                    // Logged and health-recorded by the executor; next provider
                }
            }
        }

        None
    }
}
