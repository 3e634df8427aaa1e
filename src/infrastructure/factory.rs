//! Wires configuration into the two engine services.

use crate::application::cache::TieredCache;
use crate::application::executor::Executor;
use crate::application::generation::{TextService, TextSettings};
use crate::application::health::ProviderHealthRegistry;
use crate::application::market_data::{SeriesService, SeriesSettings};
use crate::application::rotation::KeyPool;
use crate::config::Config;
use crate::domain::ports::{CacheStore, MarketProvider, TextProvider};
use crate::infrastructure::persistence::SqliteCacheStore;
use crate::infrastructure::providers::{
    BinanceProvider, FrankfurterProvider, OpenAiChatProvider, TwelveDataProvider,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct EngineFactory;

impl EngineFactory {
    /// Build both orchestrators on the durable cache named in config
    pub async fn build(config: &Config) -> Result<(Arc<SeriesService>, Arc<TextService>)> {
        let store = SqliteCacheStore::new(&config.engine.cache_db_url).await?;
        Ok(Self::build_with_store(config, Arc::new(store)))
    }

    /// Build on an injected durable tier (tests pass an in-memory store)
    pub fn build_with_store(
        config: &Config,
        store: Arc<dyn CacheStore>,
    ) -> (Arc<SeriesService>, Arc<TextService>) {
        let health = Arc::new(ProviderHealthRegistry::new(
            config.engine.cooldown_base,
            config.engine.cooldown_max,
        ));
        let executor = Arc::new(Executor::new(health));

        let cache = Arc::new(TieredCache::new(
            store,
            config.engine.fast_cache_capacity,
            config.engine.fast_cache_ttl,
        ));

        let market_providers = Self::market_providers(config);
        let text_providers = Self::text_providers(config);

        info!(
            "EngineFactory: {} market providers [{}], {} generation providers [{}]",
            market_providers.len(),
            market_providers
                .iter()
                .map(|p| p.id())
                .collect::<Vec<_>>()
                .join(", "),
            text_providers.len(),
            text_providers
                .iter()
                .map(|p| p.id())
                .collect::<Vec<_>>()
                .join(", "),
        );

        let series = Arc::new(SeriesService::new(
            market_providers,
            executor.clone(),
            cache,
            SeriesSettings {
                provider_timeout: config.engine.market_provider_timeout,
                min_samples: config.engine.min_samples,
                fetch_limit: config.engine.fetch_limit,
                durable_ttl: config.engine.durable_cache_ttl,
                ladder_deadline: config.engine.market_ladder_deadline,
                rotation_bucket: config.engine.rotation_bucket,
                default_provider: config.engine.market_default_provider.clone(),
            },
        ));

        let text = Arc::new(TextService::new(
            text_providers,
            executor,
            TextSettings {
                provider_timeout: config.engine.gen_provider_timeout,
                overall_budget: config.engine.gen_overall_budget,
                min_attempt_budget: config.engine.gen_min_attempt_budget,
                rotation_bucket: config.engine.rotation_bucket,
                default_provider: config.engine.gen_default_provider.clone(),
            },
        ));

        (series, text)
    }

    /// Instantiate registered market adapters in the configured order
    fn market_providers(config: &Config) -> Vec<Arc<dyn MarketProvider>> {
        let mut providers: Vec<Arc<dyn MarketProvider>> = Vec::new();

        for id in &config.engine.market_provider_order {
            match id.as_str() {
                "binance" => providers.push(Arc::new(BinanceProvider::new(
                    config.providers.binance.base_url.clone(),
                ))),
                "twelvedata" => providers.push(Arc::new(TwelveDataProvider::new(
                    config.providers.twelvedata.base_url.clone(),
                    KeyPool::from_csv(&config.providers.twelvedata.api_keys),
                    config.engine.rotation_bucket,
                ))),
                "frankfurter" => providers.push(Arc::new(FrankfurterProvider::new(
                    config.providers.frankfurter.base_url.clone(),
                ))),
                other => {
                    tracing::warn!("EngineFactory: unknown market provider '{}', skipping", other)
                }
            }
        }

        providers
    }

    /// Instantiate chat endpoints in the configured order
    fn text_providers(config: &Config) -> Vec<Arc<dyn TextProvider>> {
        let mut providers: Vec<Arc<dyn TextProvider>> = Vec::new();

        for id in &config.engine.gen_provider_order {
            let Some(endpoint) = config
                .providers
                .chat_endpoints
                .iter()
                .find(|e| &e.id == id)
            else {
                tracing::warn!("EngineFactory: unknown chat endpoint '{}', skipping", id);
                continue;
            };

            providers.push(Arc::new(OpenAiChatProvider::new(
                endpoint.id.clone(),
                endpoint.base_url.clone(),
                endpoint.model.clone(),
                KeyPool::from_csv(&endpoint.api_keys),
                config.engine.rotation_bucket,
            )));
        }

        providers
    }
}
