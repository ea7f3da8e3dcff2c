use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::BotError;

/// Document-text extraction seam: binary document bytes → plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, data: Bytes) -> Result<String, BotError>;
}

/// PDF extraction via `pdf-extract`. The parse is CPU-bound so it runs
/// on the blocking pool.
pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, data: Bytes) -> Result<String, BotError> {
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(|e| BotError::Extraction(format!("extraction task failed: {e}")))?
            .map_err(|e| BotError::Extraction(format!("unreadable PDF: {e}")))?;

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(BotError::Extraction("PDF contained no extractable text".to_string()));
        }
        Ok(text)
    }
}
