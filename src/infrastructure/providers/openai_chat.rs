//! Generic OpenAI-compatible chat-completions adapter.
//!
//! One instance per configured endpoint (OpenAI, Groq, a local gateway,
//! anything speaking the same wire shape). The endpoint name becomes the
//! provider id, so several instances can sit in one chain.

use crate::application::rotation::{KeyPool, request_seed, time_bucket};
use crate::domain::generation::GenerationRequest;
use crate::domain::ports::TextProvider;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct OpenAiChatProvider {
    id: String,
    client: ClientWithMiddleware,
    base_url: String,
    model: String,
    keys: KeyPool,
    key_bucket: std::time::Duration,
}

impl OpenAiChatProvider {
    pub fn new(
        id: String,
        base_url: String,
        model: String,
        keys: KeyPool,
        key_bucket: std::time::Duration,
    ) -> Self {
        Self {
            id,
            client: HttpClientFactory::create_client(),
            base_url,
            model,
            keys,
            key_bucket,
        }
    }

    fn pick_key(&self, request: &GenerationRequest) -> Option<&str> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let bucket = time_bucket(now_ms, self.key_bucket.as_millis() as i64);
        self.keys.pick(&request_seed(&request.fingerprint(), bucket))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextProvider for OpenAiChatProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn ready(&self) -> bool {
        !self.keys.is_empty()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let api_key = self
            .pick_key(request)
            .ok_or_else(|| anyhow!("no API key configured for {}", self.id))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatCompletionBody {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.id))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("{} returned {}: {}", self.id, status, error_text);
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", self.id))?;

        let text = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!("OpenAiChatProvider [{}]: {} chars returned", self.id, text.len());
        Ok(text)
    }
}
