use crate::llm::types::{Oracle, OracleError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";

/// Chat-completions client for the Together API. One blocking round-trip per
/// call; no timeout beyond what the transport enforces, no retries.
#[derive(Clone)]
pub struct TogetherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TogetherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: TOGETHER_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl Oracle for TogetherClient {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let text = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(OracleError::EmptyCompletion)?;

        Ok(text.to_string())
    }
}
