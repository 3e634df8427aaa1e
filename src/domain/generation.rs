use serde::{Deserialize, Serialize};

/// Inputs for one text generation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            max_tokens: 1024,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Cheaper variant used for the single retry pass after the whole chain
    /// has failed once: the prompt is cut down and the output budget halved.
    pub fn reduced(&self) -> Self {
        const REDUCED_PROMPT_CHARS: usize = 2000;

        let prompt = if self.prompt.chars().count() > REDUCED_PROMPT_CHARS {
            self.prompt.chars().take(REDUCED_PROMPT_CHARS).collect()
        } else {
            self.prompt.clone()
        };

        Self {
            prompt,
            system: self.system.clone(),
            max_tokens: (self.max_tokens / 2).max(64),
        }
    }

    /// Stable fingerprint of the prompt used for rotation seeding.
    /// Only a prefix matters; two requests with the same opening context
    /// should land on the same provider within one time bucket.
    pub fn fingerprint(&self) -> String {
        self.prompt.chars().take(64).collect()
    }
}

/// A successful generation and the provider that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResult {
    pub text: String,
    pub provider: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_truncates_long_prompts() {
        let long = "x".repeat(5000);
        let req = GenerationRequest::new(long).with_max_tokens(1000);
        let reduced = req.reduced();

        assert_eq!(reduced.prompt.chars().count(), 2000);
        assert_eq!(reduced.max_tokens, 500);
    }

    #[test]
    fn test_reduced_keeps_short_prompts() {
        let req = GenerationRequest::new("short prompt").with_max_tokens(100);
        let reduced = req.reduced();

        assert_eq!(reduced.prompt, "short prompt");
        assert_eq!(reduced.max_tokens, 64); // floor
    }
}
