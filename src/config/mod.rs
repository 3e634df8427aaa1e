//! Configuration module for datafall.
//!
//! Structured configuration loading from environment variables, organized
//! by concern: provider endpoints/credentials and engine tuning.

mod engine_env_config;
mod provider_env_config;

pub use engine_env_config::EngineEnvConfig;
pub use provider_env_config::{
    BinanceEnvConfig, ChatEndpointEnvConfig, FrankfurterEnvConfig, ProviderEnvConfig,
    TwelveDataEnvConfig,
};

use anyhow::{Context, Result};

/// Aggregated application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub providers: ProviderEnvConfig,
    pub engine: EngineEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            providers: ProviderEnvConfig::from_env(),
            engine: EngineEnvConfig::from_env().context("Failed to load engine config")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_defaults() {
        let config = Config::from_env().expect("Should parse with defaults");
        assert_eq!(config.engine.fetch_limit, 200);
        assert!(!config.providers.chat_endpoints.is_empty());
    }
}
