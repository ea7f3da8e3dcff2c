//! Scoring oracle — the single point of entry for all LLM calls.
//!
//! Wraps the Groq chat-completions API. The oracle is treated as
//! unreliable everywhere: callers never propagate its failures to the
//! end user, they substitute the neutral fallback defined in `matching`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::BotError;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const MAX_RETRIES: u32 = 2;

/// Free-text completion seam: prompt + sampling temperature → completion.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, BotError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Oracle for GroqClient {
    /// Retries once on 429/5xx with a short backoff; every other failure
    /// maps to `BotError::Oracle`.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, BotError> {
        let request_body = ChatRequest {
            model: &self.model,
            temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error = String::new();

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Oracle call attempt {attempt} failed ({last_error}), retrying after {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(GROQ_API_URL)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = format!("status {status}");
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(BotError::Oracle(format!("API error (status {status}): {body}")));
            }

            let completion: ChatResponse = response
                .json()
                .await
                .map_err(|e| BotError::Oracle(format!("malformed completion body: {e}")))?;

            let content = completion
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| BotError::Oracle("completion had no choices".to_string()))?;

            debug!("Oracle call succeeded ({} chars)", content.len());
            return Ok(content);
        }

        Err(BotError::Oracle(format!(
            "gave up after {MAX_RETRIES} retries: {last_error}"
        )))
    }
}
