//! Telegram Bot API client — the messaging transport.
//!
//! All channel traffic goes through this module: outbound sends via the
//! [`Messenger`] trait (so the pipeline and router stay mockable) and
//! the inbound long-poll, which only the supervisor drives.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::BotError;

const TELEGRAM_API: &str = "https://api.telegram.org";
/// Long-poll wait passed to getUpdates, seconds.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Outbound messaging seam. `chat_id` is the opaque user id.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), BotError>;
    async fn send_markdown(&self, chat_id: &str, text: &str) -> Result<(), BotError>;
    /// Fetches a document's bytes given its transport reference.
    async fn fetch_document(&self, file_id: &str) -> Result<Bytes, BotError>;
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
    pub document: Option<Document>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Document {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    token: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(POLL_TIMEOUT_SECS + 10))
                .build()
                .expect("Failed to build HTTP client"),
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{TELEGRAM_API}/bot{}/{method}", self.token)
    }

    async fn send(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<(), BotError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest {
                chat_id,
                text,
                parse_mode,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("sendMessage to {chat_id} failed: {body}");
        }
        Ok(())
    }

    /// Long-polls for new updates past `offset`. Returns the raw batch;
    /// the caller owns offset advancement (not advanced here, so a
    /// transport failure retries the same batch).
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, BotError> {
        let mut request = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("timeout", POLL_TIMEOUT_SECS)])
            .query(&[("allowed_updates", r#"["message"]"#)]);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response: ApiResponse<Vec<Update>> = request.send().await?.json().await?;
        if !response.ok {
            return Err(BotError::Channel(format!(
                "getUpdates rejected: {}",
                response.description.unwrap_or_default()
            )));
        }
        let updates = response.result.unwrap_or_default();
        if !updates.is_empty() {
            debug!("Received {} update(s)", updates.len());
        }
        Ok(updates)
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        self.send(chat_id, text, None).await
    }

    async fn send_markdown(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        self.send(chat_id, text, Some("Markdown")).await
    }

    async fn fetch_document(&self, file_id: &str) -> Result<Bytes, BotError> {
        let info: ApiResponse<FileInfo> = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await?
            .json()
            .await?;

        let file_path = info
            .result
            .and_then(|f| f.file_path)
            .ok_or_else(|| BotError::Extraction("file reference not resolvable".to_string()))?;

        let url = format!("{TELEGRAM_API}/file/bot{}/{file_path}", self.token);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BotError::Extraction(format!(
                "document download failed with status {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?)
    }
}
