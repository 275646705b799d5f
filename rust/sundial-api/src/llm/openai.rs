//! OpenAI-compatible chat-completions driver.
//!
//! Works against any OpenAI-compatible API (OpenAI, Groq, xAI, local
//! gateways). One blocking round-trip per execution; streaming is not
//! needed for scheduled runs.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::GenerationClient;
use crate::config::GenerationConfig;

/// Generation driver for OpenAI-compatible `chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    config: GenerationConfig,
}

impl ChatCompletionsClient {
    /// Create a new driver from configuration.
    #[must_use]
    pub fn new(config: GenerationConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl GenerationClient for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let Some(ref api_key) = self.config.api_key else {
            anyhow::bail!("generation API key not configured");
        };

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": self.config.system_prompt },
                { "role": "user", "content": prompt }
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens
        });

        let response = self
            .client
            .post(self.api_url())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("generation API error ({status}): {text}");
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_else(|| "No response generated".to_string());

        Ok(content)
    }
}

/// Chat-completions response body (the fields we read).
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_tolerates_trailing_slashes() {
        let client = ChatCompletionsClient::new(GenerationConfig {
            base_url: "https://api.groq.com/openai/v1/".to_string(),
            ..GenerationConfig::default()
        });
        assert_eq!(
            client.api_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn completion_parsing_handles_missing_content() {
        let completion: ChatCompletion =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(completion.choices[0].message.content.is_none());

        let empty: ChatCompletion = serde_json::from_str(r"{}").unwrap();
        assert!(empty.choices.is_empty());
    }
}
