use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::BotError;
use crate::models::Posting;
use crate::sources::{JobSource, PER_SOURCE_LIMIT};

const REMOTIVE_API: &str = "https://remotive.com/api/remote-jobs";

#[derive(Debug, Deserialize)]
struct RemotiveResponse {
    jobs: Vec<RemotiveJob>,
}

#[derive(Debug, Deserialize)]
struct RemotiveJob {
    url: String,
    title: String,
    company_name: String,
    candidate_required_location: String,
}

pub struct RemotiveSource {
    client: Client,
}

impl RemotiveSource {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for RemotiveSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobSource for RemotiveSource {
    fn name(&self) -> &str {
        "Remotive"
    }

    async fn fetch(&self, query: &str, location: &str) -> Result<Vec<Posting>, BotError> {
        let response: RemotiveResponse = self
            .client
            .get(REMOTIVE_API)
            .query(&[("search", query), ("limit", &PER_SOURCE_LIMIT.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // The API has no location parameter; filter client-side, keeping
        // postings whose advertised location mentions the user's one.
        // Remotive is remote-first, so an empty filter result falls back
        // to the unfiltered set rather than returning nothing.
        let location_lower = location.to_lowercase();
        let all: Vec<Posting> = response
            .jobs
            .into_iter()
            .map(|job| Posting {
                source: "Remotive".to_string(),
                title: job.title,
                company: job.company_name,
                location: job.candidate_required_location,
                link: job.url,
            })
            .collect();

        let filtered: Vec<Posting> = all
            .iter()
            .filter(|p| p.location.to_lowercase().contains(&location_lower))
            .cloned()
            .collect();

        Ok(if filtered.is_empty() { all } else { filtered })
    }
}
