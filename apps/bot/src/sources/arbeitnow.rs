use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::BotError;
use crate::models::Posting;
use crate::sources::JobSource;

const ARBEITNOW_API: &str = "https://www.arbeitnow.com/api/job-board-api";

#[derive(Debug, Deserialize)]
struct ArbeitnowResponse {
    data: Vec<ArbeitnowJob>,
}

#[derive(Debug, Deserialize)]
struct ArbeitnowJob {
    url: String,
    title: String,
    company_name: String,
    location: String,
}

pub struct ArbeitnowSource {
    client: Client,
}

impl ArbeitnowSource {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for ArbeitnowSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobSource for ArbeitnowSource {
    fn name(&self) -> &str {
        "Arbeitnow"
    }

    async fn fetch(&self, query: &str, location: &str) -> Result<Vec<Posting>, BotError> {
        let response: ArbeitnowResponse = self
            .client
            .get(ARBEITNOW_API)
            .query(&[("search", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // The board returns a single feed; match the query against the
        // title and prefer the user's location when it appears.
        let query_lower = query.to_lowercase();
        let location_lower = location.to_lowercase();

        let mut postings: Vec<Posting> = response
            .data
            .into_iter()
            .filter(|job| {
                query_lower.is_empty()
                    || query_lower
                        .split_whitespace()
                        .any(|word| job.title.to_lowercase().contains(word))
            })
            .map(|job| Posting {
                source: "Arbeitnow".to_string(),
                title: job.title,
                company: job.company_name,
                location: job.location,
                link: job.url,
            })
            .collect();

        postings.sort_by_key(|p| !p.location.to_lowercase().contains(&location_lower));
        Ok(postings)
    }
}
