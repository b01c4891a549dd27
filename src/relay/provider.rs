//! Hosted chat-completion providers.

use super::{RelayError, EMPTY_COMPLETION_ANSWER};
use crate::config::RelaySettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Something that turns one user prompt into one answer.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging/identification
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, RelayError>;
}

/// Any OpenAI-compatible `/chat/completions` endpoint (Groq by default).
pub struct OpenAiCompatProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatProvider {
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, RelayError> {
        let api_key = std::env::var(&settings.api_key_env).ok();
        Self::new(settings, api_key)
    }

    pub fn new(settings: &RelaySettings, api_key: Option<String>) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_key_env: settings.api_key_env.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessageResponse>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessageResponse {
    content: Option<String>,
}

/// First choice's text, or the stock fallback when the model said nothing.
pub(crate) fn extract_answer(response: CompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_else(|| EMPTY_COMPLETION_ANSWER.to_string())
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, RelayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RelayError::MissingApiKey(self.api_key_env.clone()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![CompletionMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let completion: CompletionResponse = response.json().await?;
        tracing::debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "completion received"
        );

        Ok(extract_answer(completion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> CompletionResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn takes_first_choice_content() {
        let raw = r#"{
            "id": "x",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Hola mundo" } },
                { "index": 1, "message": { "role": "assistant", "content": "otra" } }
            ],
            "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 }
        }"#;
        assert_eq!(extract_answer(parse(raw)), "Hola mundo");
    }

    #[test]
    fn missing_content_falls_back() {
        assert_eq!(extract_answer(parse(r#"{"choices": []}"#)), EMPTY_COMPLETION_ANSWER);
        assert_eq!(extract_answer(parse(r#"{}"#)), EMPTY_COMPLETION_ANSWER);
        assert_eq!(
            extract_answer(parse(r#"{"choices": [{"message": {"content": null}}]}"#)),
            EMPTY_COMPLETION_ANSWER
        );
    }

    #[test]
    fn request_body_has_openai_shape() {
        let request = CompletionRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![CompletionMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.5,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama-3.1-8b-instant");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["temperature"], 0.5);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let provider = OpenAiCompatProvider::new(&RelaySettings::default(), None).unwrap();
        assert!(!provider.has_api_key());
        let err = provider.complete("hola").await.unwrap_err();
        assert!(matches!(err, RelayError::MissingApiKey(ref var) if var == "GROQ_API_KEY"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let settings = RelaySettings {
            base_url: "http://localhost:9999/v1/".to_string(),
            ..RelaySettings::default()
        };
        let provider = OpenAiCompatProvider::new(&settings, Some("k".into())).unwrap();
        assert_eq!(provider.base_url, "http://localhost:9999/v1");
        assert_eq!(provider.model(), "llama-3.1-8b-instant");
    }
}
