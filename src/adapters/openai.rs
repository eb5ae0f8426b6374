//! OpenAI-compatible chat completions backend.
//!
//! Endpoint: POST {base_url}/chat/completions
//! Auth: Bearer token (optional, for local servers)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Generator, GeneratorOutput};
use crate::prompts::Prompt;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Chat completions client
pub struct OpenAiGenerator {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u64,
}

impl OpenAiGenerator {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

fn build_request<'a>(model: &'a str, prompt: &'a Prompt) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: &prompt.system,
            },
            ChatMessage {
                role: "user",
                content: &prompt.user,
            },
        ],
    }
}

fn extract_output(response: ChatResponse) -> Result<GeneratorOutput> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .context("Chat completion returned no message content")?;

    Ok(GeneratorOutput {
        content,
        tokens_used: response.usage.map(|usage| usage.total_tokens),
    })
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &Prompt, timeout: Duration) -> Result<GeneratorOutput> {
        let body = build_request(&self.model, prompt);
        debug!(model = %self.model, kind = %prompt.kind, "Sending chat completion request");

        let response = self
            .authorize(self.client.post(self.endpoint("chat/completions")))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Chat completion request for '{}' failed", prompt.kind))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat completion error ({}): {}", status, text.trim());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to decode chat completion response")?;

        extract_output(parsed)
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .authorize(self.client.get(self.endpoint("models")))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("Failed to reach chat completions server")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Model listing failed ({})", status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptKind;

    #[test]
    fn test_request_body() {
        let prompt = Prompt {
            kind: PromptKind::AlignAnchors,
            system: "You are a robotic alignment tool.".to_string(),
            user: "Align these.".to_string(),
        };
        let json = serde_json::to_value(build_request("gpt-test", &prompt)).unwrap();
        assert_eq!(json["model"], "gpt-test");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Align these.");
    }

    #[test]
    fn test_extract_output() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Topic: Term;"}}],"usage":{"total_tokens":42}}"#,
        )
        .unwrap();
        let output = extract_output(response).unwrap();
        assert_eq!(output.content, "Topic: Term;");
        assert_eq!(output.tokens_used, Some(42));
    }

    #[test]
    fn test_extract_output_without_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_output(response).is_err());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let generator = OpenAiGenerator::new("http://localhost:8080/v1/", "local", None);
        assert_eq!(generator.endpoint("models"), "http://localhost:8080/v1/models");
        assert_eq!(generator.model(), "local");
    }
}
