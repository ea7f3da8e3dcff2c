//! Job-source connectors and the aggregator that fans out across them.
//!
//! Connectors are pluggable behind [`JobSource`]; the aggregator owns
//! source ordering (declared priority), the per-source result cap, and
//! failure isolation. Identity dedup across sources is intentionally not
//! done here: posting ids are source-qualified.

pub mod arbeitnow;
pub mod remotive;

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use crate::errors::BotError;
use crate::models::Posting;

/// Cap on postings taken from a single source per run, to bound run cost.
pub const PER_SOURCE_LIMIT: usize = 10;

/// One job board. Must return `Ok(vec![])` on an empty result set;
/// errors are reserved for transport/deserialize failure.
#[async_trait]
pub trait JobSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, query: &str, location: &str) -> Result<Vec<Posting>, BotError>;
}

pub struct SourceAggregator {
    sources: Vec<Arc<dyn JobSource>>,
}

impl SourceAggregator {
    pub fn new(sources: Vec<Arc<dyn JobSource>>) -> Self {
        Self { sources }
    }

    /// Queries every configured source in priority order. A failure in
    /// one source is logged and excluded, never aborts the aggregate
    /// call. Each connector call is preceded by a randomized 1–3 s delay
    /// to avoid throttling.
    pub async fn fetch(&self, keywords: &[String], location: &str) -> Vec<Posting> {
        let query = keywords.first().map(String::as_str).unwrap_or_default();
        let mut postings = Vec::new();

        for source in &self.sources {
            let jitter_ms: u64 = rand::thread_rng().gen_range(1000..=3000);
            tokio::time::sleep(std::time::Duration::from_millis(jitter_ms)).await;

            match source.fetch(query, location).await {
                Ok(found) => {
                    info!("{}: {} posting(s) for '{query}'", source.name(), found.len());
                    postings.extend(found.into_iter().take(PER_SOURCE_LIMIT));
                }
                Err(e) => {
                    warn!("{} fetch failed, skipping: {e}", source.name());
                }
            }
        }

        postings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource {
        name: &'static str,
        postings: Vec<Posting>,
        fail: bool,
    }

    #[async_trait]
    impl JobSource for StaticSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _query: &str, _location: &str) -> Result<Vec<Posting>, BotError> {
            if self.fail {
                return Err(BotError::Channel("boom".to_string()));
            }
            Ok(self.postings.clone())
        }
    }

    fn posting(source: &str, n: usize) -> Posting {
        Posting {
            source: source.to_string(),
            title: format!("Job {n}"),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            link: format!("https://example.com/{source}/{n}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_source_is_skipped_not_fatal() {
        let aggregator = SourceAggregator::new(vec![
            Arc::new(StaticSource {
                name: "first",
                postings: vec![],
                fail: true,
            }),
            Arc::new(StaticSource {
                name: "second",
                postings: vec![posting("second", 1)],
                fail: false,
            }),
        ]);

        let postings = aggregator.fetch(&["rust".to_string()], "Remote").await;
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].source, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_source_cap_applied() {
        let many: Vec<Posting> = (0..25).map(|n| posting("big", n)).collect();
        let aggregator = SourceAggregator::new(vec![Arc::new(StaticSource {
            name: "big",
            postings: many,
            fail: false,
        })]);

        let postings = aggregator.fetch(&["rust".to_string()], "Remote").await;
        assert_eq!(postings.len(), PER_SOURCE_LIMIT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_order_is_stable() {
        let aggregator = SourceAggregator::new(vec![
            Arc::new(StaticSource {
                name: "a",
                postings: vec![posting("a", 1)],
                fail: false,
            }),
            Arc::new(StaticSource {
                name: "b",
                postings: vec![posting("b", 1)],
                fail: false,
            }),
        ]);

        let postings = aggregator.fetch(&["rust".to_string()], "Remote").await;
        assert_eq!(postings[0].source, "a");
        assert_eq!(postings[1].source, "b");
    }
}
