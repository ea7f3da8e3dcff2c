//! MatchEngine — scores one (posting, resume) pair via the oracle and
//! applies the fallback policy: a scoring failure never aborts a user's
//! run, it degrades to a neutral result.

pub mod prompts;

use std::sync::Arc;

use tracing::warn;

use crate::models::{MatchResult, Posting};
use crate::oracle::Oracle;

/// Score substituted when the oracle fails or its output is unparseable.
pub const NEUTRAL_SCORE: u8 = 50;

const MATCH_TEMPERATURE: f32 = 0.2;
const ANALYSIS_TEMPERATURE: f32 = 0.3;

#[derive(Clone)]
pub struct MatchEngine {
    oracle: Arc<dyn Oracle>,
}

impl MatchEngine {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Never fails: oracle errors and unparseable output both yield the
    /// neutral fallback so the pipeline keeps moving.
    pub async fn score(&self, posting: &Posting, resume_text: &str) -> MatchResult {
        let prompt = prompts::match_prompt(posting, resume_text);

        let completion = match self.oracle.complete(&prompt, MATCH_TEMPERATURE).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Scoring '{}' failed: {e}", posting.title);
                return MatchResult {
                    score: NEUTRAL_SCORE,
                    analysis: "Error in analysis".to_string(),
                };
            }
        };

        match parse_score(&completion) {
            Some(score) => MatchResult {
                score,
                analysis: completion,
            },
            None => {
                warn!("Oracle output for '{}' had no score line", posting.title);
                MatchResult {
                    score: NEUTRAL_SCORE,
                    analysis: completion,
                }
            }
        }
    }

    /// Resume-improvement report for `/analyze`. Failure yields a fixed
    /// apology string rather than an error.
    pub async fn analyze_resume(&self, resume_text: &str, keywords: &[String]) -> String {
        let prompt = prompts::analysis_prompt(resume_text, keywords);
        match self.oracle.complete(&prompt, ANALYSIS_TEMPERATURE).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Resume analysis failed: {e}");
                "Error generating resume improvement suggestions.".to_string()
            }
        }
    }
}

/// Finds the first line containing a `Score:` label and parses the first
/// integer after it, clamped to [0,100].
fn parse_score(text: &str) -> Option<u8> {
    let line = text.lines().find(|line| line.contains("Score:"))?;
    let after_label = &line[line.find("Score:")? + "Score:".len()..];

    let digits: String = after_label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    let value: u32 = digits.parse().ok()?;
    Some(value.min(100) as u8)
}
