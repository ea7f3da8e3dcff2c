//! The per-user run: fetch → filter → mark-seen → score → maybe-deliver →
//! summarize. One invocation per user per trigger (scheduled, `/jobs`, or
//! `/analyze`), always on its own spawned task.

use tracing::{info, warn};

use crate::models::Posting;
use crate::router::replies;
use crate::state::AppState;

/// Fixed inter-message delay, a rate-limit courtesy to the channel.
const DELIVERY_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

/// Spawns a supervised run task for one user. The inner task is joined
/// from a wrapper so a panic is logged instead of vanishing, and no
/// sibling task is affected.
pub fn spawn_run(state: AppState, user_id: String) {
    let id = user_id.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::spawn(run_for_user(state, user_id)).await {
            tracing::error!("Run task for user {id} panicked: {e}");
        }
    });
}

/// Supervised counterpart of [`spawn_run`] for `/analyze`.
pub fn spawn_analysis(state: AppState, user_id: String) {
    let id = user_id.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::spawn(run_analysis(state, user_id)).await {
            tracing::error!("Analysis task for user {id} panicked: {e}");
        }
    });
}

/// Runs the full matching pipeline for one user.
///
/// Posting ids are recorded as delivered BEFORE scoring: a transient
/// scoring failure must not cause the same posting to be re-sent on the
/// next run. The cost is that a posting which failed to score is never
/// retried — no-duplicate wins over no-miss.
pub async fn run_for_user(state: AppState, user_id: String) {
    if let Err(e) = run_inner(&state, &user_id).await {
        warn!("Run for user {user_id} aborted: {e}");
    }
}

async fn run_inner(state: &AppState, user_id: &str) -> Result<(), crate::errors::BotError> {
    let Some(profile) = state.store.get(user_id) else {
        return Ok(());
    };
    if !profile.is_active {
        return Ok(());
    }
    if !profile.has_resume() {
        state
            .messenger
            .send_text(user_id, replies::RESUME_REQUEST)
            .await?;
        return Ok(());
    }

    let postings = state
        .sources
        .fetch(&profile.search_keywords, &profile.search_location)
        .await;

    let new_postings: Vec<Posting> = postings
        .into_iter()
        .filter(|p| !profile.already_delivered(&p.id()))
        .collect();

    if new_postings.is_empty() {
        state.messenger.send_text(user_id, replies::NO_NEW_JOBS).await?;
        return Ok(());
    }

    info!("{} new posting(s) for user {user_id}", new_postings.len());
    let mut matches_sent = 0usize;

    for posting in &new_postings {
        // Mark seen first, then score.
        state.store.record_delivered(user_id, &posting.id());

        let result = state.engine.score(posting, &profile.resume).await;
        if result.score < profile.min_match_score {
            continue;
        }

        matches_sent += 1;
        // A failed send abandons that delivery only; the remaining
        // postings still get marked, scored and attempted.
        if let Err(e) = state
            .messenger
            .send_markdown(user_id, &format_match(posting, result.score, &result.analysis))
            .await
        {
            warn!("Delivering '{}' to {user_id} failed: {e}", posting.title);
        }
        tokio::time::sleep(DELIVERY_DELAY).await;
    }

    let summary = if matches_sent == 0 {
        format!(
            "🔍 I found {} new jobs, but none met your minimum match score of {}%. I'll keep searching!",
            new_postings.len(),
            profile.min_match_score
        )
    } else {
        format!("✅ Sent you {matches_sent} job matches today! I'll send more when I find them.")
    };
    if let Err(e) = state.messenger.send_text(user_id, &summary).await {
        warn!("Summary for {user_id} failed to send: {e}");
    }

    Ok(())
}

/// Resume-improvement report for `/analyze`, independent of job postings.
pub async fn run_analysis(state: AppState, user_id: String) {
    if let Err(e) = analysis_inner(&state, &user_id).await {
        warn!("Resume analysis for user {user_id} aborted: {e}");
    }
}

async fn analysis_inner(state: &AppState, user_id: &str) -> Result<(), crate::errors::BotError> {
    let Some(profile) = state.store.get(user_id) else {
        return Ok(());
    };
    if !profile.has_resume() {
        state
            .messenger
            .send_text(user_id, replies::RESUME_REQUEST)
            .await?;
        return Ok(());
    }

    let suggestions = state
        .engine
        .analyze_resume(&profile.resume, &profile.search_keywords)
        .await;

    let message = format!(
        "📋 *Resume Analysis*\n\n{suggestions}\n\n\
         Would you like me to help you implement these suggestions? Reply with /improve to get started."
    );
    state.messenger.send_markdown(user_id, &message).await?;
    Ok(())
}

fn format_match(posting: &Posting, score: u8, analysis: &str) -> String {
    format!(
        "🚀 *New Job Match!*\n\n\
         📌 *{title}*\n\
         🏢 {company}\n\
         📍 {location}\n\
         🌐 Source: {source}\n\
         📊 *AI Match Score:* {score}%\n\n\
         *Analysis:*\n{analysis}\n\n\
         🔗 [Apply Here]({link})",
        title = posting.title,
        company = posting.company,
        location = posting.location,
        source = posting.source,
        link = posting.link,
    )
}

#[cfg(test)]
pub(crate) mod testkit {
    //! Mock collaborators shared by pipeline and router tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::config::Config;
    use crate::errors::BotError;
    use crate::extract::TextExtractor;
    use crate::matching::MatchEngine;
    use crate::models::Posting;
    use crate::oracle::Oracle;
    use crate::sources::{JobSource, SourceAggregator};
    use crate::state::AppState;
    use crate::store::UserStore;
    use crate::telegram::Messenger;

    /// Records every outbound message.
    #[derive(Default)]
    pub struct RecordingMessenger {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMessenger {
        pub fn texts(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
            self.sent.lock().unwrap().push((chat_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn send_markdown(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
            self.send_text(chat_id, text).await
        }

        async fn fetch_document(&self, _file_id: &str) -> Result<Bytes, BotError> {
            Ok(Bytes::from_static(b"%PDF-stub"))
        }
    }

    /// Every outbound call fails, as with a dead messaging channel.
    pub struct FailingMessenger;

    #[async_trait]
    impl Messenger for FailingMessenger {
        async fn send_text(&self, _chat_id: &str, _text: &str) -> Result<(), BotError> {
            Err(BotError::Channel("send failed".to_string()))
        }

        async fn send_markdown(&self, _chat_id: &str, _text: &str) -> Result<(), BotError> {
            Err(BotError::Channel("send failed".to_string()))
        }

        async fn fetch_document(&self, _file_id: &str) -> Result<Bytes, BotError> {
            Err(BotError::Channel("download failed".to_string()))
        }
    }

    /// Serves a fixed posting list and counts fetches.
    pub struct FixedSource {
        pub postings: Vec<Posting>,
        pub fetches: AtomicUsize,
    }

    impl FixedSource {
        pub fn new(postings: Vec<Posting>) -> Self {
            Self {
                postings,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JobSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(&self, _query: &str, _location: &str) -> Result<Vec<Posting>, BotError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.postings.clone())
        }
    }

    /// Scores by posting title: the completion embeds the score named in
    /// the title suffix, e.g. "Engineer [80]".
    pub struct TitleScoreOracle;

    #[async_trait]
    impl Oracle for TitleScoreOracle {
        async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, BotError> {
            let score = prompt
                .split('[')
                .nth(1)
                .and_then(|rest| rest.split(']').next())
                .unwrap_or("50");
            Ok(format!("Score: {score}\nStrengths:\n- canned"))
        }
    }

    pub struct StubExtractor;

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract(&self, _data: Bytes) -> Result<String, BotError> {
            Ok("extracted resume text".to_string())
        }
    }

    pub struct FailingExtractor;

    #[async_trait]
    impl TextExtractor for FailingExtractor {
        async fn extract(&self, _data: Bytes) -> Result<String, BotError> {
            Err(BotError::Extraction("unreadable PDF".to_string()))
        }
    }

    pub fn test_config() -> Config {
        Config {
            telegram_bot_token: "test-token".to_string(),
            groq_api_key: "test-key".to_string(),
            groq_model: "test-model".to_string(),
            users_file: "unused".to_string(),
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    pub fn posting(source: &str, title: &str, n: usize) -> Posting {
        Posting {
            source: source.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            link: format!("https://example.com/{source}/{n}"),
        }
    }

    pub struct Harness {
        pub state: AppState,
        pub messenger: Arc<RecordingMessenger>,
        pub source: Arc<FixedSource>,
        pub _dir: tempfile::TempDir,
    }

    pub fn harness(postings: Vec<Posting>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(UserStore::load(dir.path().join("users.json")));
        let messenger = Arc::new(RecordingMessenger::default());
        let source = Arc::new(FixedSource::new(postings));
        let state = AppState {
            store,
            messenger: messenger.clone(),
            sources: Arc::new(SourceAggregator::new(vec![source.clone()])),
            engine: MatchEngine::new(Arc::new(TitleScoreOracle)),
            extractor: Arc::new(StubExtractor),
            config: test_config(),
        };
        Harness {
            state,
            messenger,
            source,
            _dir: dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testkit::{harness, posting};
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_no_resume_prompts_and_skips_fetch() {
        let h = harness(vec![posting("fixed", "Engineer [90]", 1)]);
        h.state.store.register("7");

        run_for_user(h.state.clone(), "7".to_string()).await;

        assert_eq!(h.messenger.texts(), vec![replies::RESUME_REQUEST.to_string()]);
        assert_eq!(h.source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_user_is_noop() {
        let h = harness(vec![posting("fixed", "Engineer [90]", 1)]);
        h.state.store.register("7");
        h.state.store.set_resume("7", "resume");
        h.state.store.set_active("7", false);

        run_for_user(h.state.clone(), "7".to_string()).await;

        assert!(h.messenger.texts().is_empty());
        assert_eq!(h.source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_filters_and_summary_counts() {
        let above = posting("fixed", "Engineer [80]", 1);
        let below = posting("fixed", "Analyst [40]", 2);
        let h = harness(vec![above.clone(), below.clone()]);
        h.state.store.register("7");
        h.state.store.set_resume("7", "resume");

        run_for_user(h.state.clone(), "7".to_string()).await;

        let texts = h.messenger.texts();
        // One match notification plus one summary.
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("Engineer [80]"));
        assert!(texts[0].contains("80%"));
        assert!(texts[1].contains("Sent you 1 job matches"));

        // Both ids recorded regardless of score.
        let profile = h.state.store.get("7").unwrap();
        assert!(profile.already_delivered(&above.id()));
        assert!(profile.already_delivered(&below.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rerun_with_same_postings_sends_nothing_new() {
        let h = harness(vec![
            posting("fixed", "Engineer [80]", 1),
            posting("fixed", "Analyst [40]", 2),
        ]);
        h.state.store.register("7");
        h.state.store.set_resume("7", "resume");

        run_for_user(h.state.clone(), "7".to_string()).await;
        h.messenger.sent.lock().unwrap().clear();

        run_for_user(h.state.clone(), "7".to_string()).await;

        assert_eq!(h.messenger.texts(), vec![replies::NO_NEW_JOBS.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_below_threshold_reports_zero_matches() {
        let h = harness(vec![posting("fixed", "Analyst [40]", 1)]);
        h.state.store.register("7");
        h.state.store.set_resume("7", "resume");

        run_for_user(h.state.clone(), "7".to_string()).await;

        let texts = h.messenger.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("none met your minimum match score of 70%"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delivery_does_not_abort_run() {
        use std::sync::Arc;

        let first = posting("fixed", "Engineer [80]", 1);
        let second = posting("fixed", "Architect [90]", 2);
        let mut h = harness(vec![first.clone(), second.clone()]);
        h.state.messenger = Arc::new(super::testkit::FailingMessenger);
        h.state.store.register("7");
        h.state.store.set_resume("7", "resume");

        run_for_user(h.state.clone(), "7".to_string()).await;

        // Both postings were processed despite every send failing.
        let profile = h.state.store.get("7").unwrap();
        assert!(profile.already_delivered(&first.id()));
        assert!(profile.already_delivered(&second.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_without_resume_prompts() {
        let h = harness(vec![]);
        h.state.store.register("7");

        run_analysis(h.state.clone(), "7".to_string()).await;

        assert_eq!(h.messenger.texts(), vec![replies::RESUME_REQUEST.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_sends_report() {
        let h = harness(vec![]);
        h.state.store.register("7");
        h.state.store.set_resume("7", "resume [0]");

        run_analysis(h.state.clone(), "7".to_string()).await;

        let texts = h.messenger.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Resume Analysis"));
    }
}
