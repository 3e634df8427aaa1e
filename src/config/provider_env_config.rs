//! Provider endpoint and credential configuration.
//!
//! Credential lists are comma-separated so a single env var can hold a
//! whole key pool.

use std::env;

#[derive(Debug, Clone)]
pub struct BinanceEnvConfig {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct TwelveDataEnvConfig {
    pub base_url: String,
    /// Comma-separated API keys; empty disables the provider
    pub api_keys: String,
}

#[derive(Debug, Clone)]
pub struct FrankfurterEnvConfig {
    pub base_url: String,
}

/// One OpenAI-compatible chat endpoint
#[derive(Debug, Clone)]
pub struct ChatEndpointEnvConfig {
    pub id: String,
    pub base_url: String,
    pub model: String,
    /// Comma-separated API keys; empty disables the endpoint
    pub api_keys: String,
}

#[derive(Debug, Clone)]
pub struct ProviderEnvConfig {
    pub binance: BinanceEnvConfig,
    pub twelvedata: TwelveDataEnvConfig,
    pub frankfurter: FrankfurterEnvConfig,
    pub chat_endpoints: Vec<ChatEndpointEnvConfig>,
}

impl ProviderEnvConfig {
    pub fn from_env() -> Self {
        let binance = BinanceEnvConfig {
            base_url: env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
        };

        let twelvedata = TwelveDataEnvConfig {
            base_url: env::var("TWELVEDATA_BASE_URL")
                .unwrap_or_else(|_| "https://api.twelvedata.com".to_string()),
            api_keys: env::var("TWELVEDATA_API_KEYS").unwrap_or_default(),
        };

        let frankfurter = FrankfurterEnvConfig {
            base_url: env::var("FRANKFURTER_BASE_URL")
                .unwrap_or_else(|_| "https://api.frankfurter.dev/v1".to_string()),
        };

        // Two chat endpoint slots; an endpoint without keys is simply not ready
        let chat_endpoints = vec![
            ChatEndpointEnvConfig {
                id: env::var("CHAT_PRIMARY_ID").unwrap_or_else(|_| "openai".to_string()),
                base_url: env::var("CHAT_PRIMARY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("CHAT_PRIMARY_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                api_keys: env::var("CHAT_PRIMARY_API_KEYS").unwrap_or_default(),
            },
            ChatEndpointEnvConfig {
                id: env::var("CHAT_SECONDARY_ID").unwrap_or_else(|_| "groq".to_string()),
                base_url: env::var("CHAT_SECONDARY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
                model: env::var("CHAT_SECONDARY_MODEL")
                    .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
                api_keys: env::var("CHAT_SECONDARY_API_KEYS").unwrap_or_default(),
            },
        ];

        Self {
            binance,
            twelvedata,
            frankfurter,
            chat_endpoints,
        }
    }
}
