//! ConversationRouter — turns inbound messages into state changes and
//! replies.
//!
//! Parsing is a pure function producing a [`Command`] tagged union;
//! dispatch is a pattern match over it. Malformed arguments become
//! `Command::Invalid` carrying the corrective reply, so bad input can
//! never reach the store.

pub mod replies;

use tracing::{info, warn};

use crate::errors::BotError;
use crate::models::UserProfile;
use crate::pipeline;
use crate::state::AppState;
use crate::store::PreferenceUpdate;
use crate::telegram::Update;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    /// Combined, atomic preference update (all four parts validated).
    Preferences(PreferenceSet),
    /// Bare `/preferences`: show the format prompt.
    PreferencesHelp,
    Keywords(Vec<String>),
    Location(String),
    Score(u8),
    Time(String),
    Jobs,
    Analyze,
    Pause,
    Resume,
    Status,
    /// Arguments failed validation; reply correctively, touch nothing.
    Invalid(String),
    /// Free text or an unrecognized command; ignored.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceSet {
    pub keywords: Vec<String>,
    pub location: String,
    pub min_score: u8,
    pub notify_time: String,
}

/// Parses one inbound text into a command. Pure; no side effects.
pub fn parse_command(text: &str) -> Command {
    let text = text.trim();
    let (word, args) = match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    };

    match word {
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/preferences" => parse_preferences(args),
        "/keywords" => parse_keywords(args),
        "/location" => {
            if args.is_empty() {
                Command::Invalid("❌ Please provide a location.".to_string())
            } else {
                Command::Location(args.to_string())
            }
        }
        "/score" => parse_score_arg(args),
        "/time" => parse_time_arg(args),
        "/jobs" => Command::Jobs,
        "/analyze" => Command::Analyze,
        "/pause" => Command::Pause,
        "/resume" => Command::Resume,
        "/status" => Command::Status,
        _ => Command::Unknown,
    }
}

fn parse_preferences(args: &str) -> Command {
    if args.is_empty() {
        return Command::PreferencesHelp;
    }
    let parts: Vec<&str> = args.split('|').map(str::trim).collect();
    if parts.len() < 4 {
        return Command::Invalid(
            "❌ Invalid format. Please use: /preferences [keywords] | [location] | [score] | [time]"
                .to_string(),
        );
    }

    let keywords: Vec<String> = parts[0]
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();

    let (Command::Score(min_score), Command::Time(notify_time)) =
        (parse_score_arg(parts[2]), parse_time_arg(parts[3]))
    else {
        return Command::Invalid(
            "❌ Invalid format. Please use: /preferences [keywords] | [location] | [score] | [time]"
                .to_string(),
        );
    };

    if keywords.is_empty() || parts[1].is_empty() {
        return Command::Invalid(
            "❌ Invalid format. Please use: /preferences [keywords] | [location] | [score] | [time]"
                .to_string(),
        );
    }

    Command::Preferences(PreferenceSet {
        keywords,
        location: parts[1].to_string(),
        min_score,
        notify_time,
    })
}

fn parse_keywords(args: &str) -> Command {
    let keywords: Vec<String> = args
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();
    if keywords.is_empty() {
        Command::Invalid("❌ Please provide at least one keyword.".to_string())
    } else {
        Command::Keywords(keywords)
    }
}

fn parse_score_arg(args: &str) -> Command {
    match args.parse::<i64>() {
        Ok(score) if (0..=100).contains(&score) => Command::Score(score as u8),
        Ok(_) => Command::Invalid("❌ Score must be between 0 and 100.".to_string()),
        Err(_) => Command::Invalid("❌ Please enter a valid number.".to_string()),
    }
}

/// Accepts exactly "HH:MM": 5 characters, colon at index 2, digits
/// elsewhere. No calendar or timezone validation by design.
fn parse_time_arg(args: &str) -> Command {
    let bytes = args.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4]
            .iter()
            .all(|&i| bytes[i].is_ascii_digit());
    if well_formed {
        Command::Time(args.to_string())
    } else {
        Command::Invalid("❌ Please enter time in HH:MM format.".to_string())
    }
}

/// Entry point for one inbound update. Registers the sender (idempotent),
/// then routes documents and commands. The "already registered" check
/// happens here, before registration is reapplied, so `/start` from a
/// known user skips the welcome text.
pub async fn handle_update(state: &AppState, update: Update) -> Result<(), BotError> {
    let Some(message) = update.message else {
        return Ok(());
    };
    let chat_id = message.chat.id.to_string();
    let is_new = state.store.register(&chat_id);
    if is_new {
        info!("Registered new user {chat_id}");
    }

    if let Some(document) = message.document {
        return handle_document(state, &chat_id, &document.file_id).await;
    }
    if let Some(text) = message.text {
        let skip_welcome = !is_new;
        return dispatch(state, &chat_id, parse_command(&text), skip_welcome).await;
    }
    Ok(())
}

/// Executes one parsed command for one user.
pub async fn dispatch(
    state: &AppState,
    chat_id: &str,
    command: Command,
    skip_welcome: bool,
) -> Result<(), BotError> {
    let messenger = &state.messenger;

    match command {
        Command::Start => {
            state.store.register(chat_id);
            if !skip_welcome {
                messenger.send_text(chat_id, replies::WELCOME).await?;
                messenger.send_text(chat_id, replies::RESUME_REQUEST).await?;
            }
        }
        Command::Help => {
            messenger.send_markdown(chat_id, replies::HELP).await?;
        }
        Command::Preferences(set) => {
            state.store.set_preferences(
                chat_id,
                PreferenceUpdate {
                    keywords: Some(set.keywords),
                    location: Some(set.location),
                    min_score: Some(set.min_score),
                    notify_time: Some(set.notify_time),
                },
            );
            messenger
                .send_text(chat_id, "✅ Your job search preferences have been updated!")
                .await?;
        }
        Command::PreferencesHelp => {
            messenger.send_text(chat_id, replies::PREFERENCES_PROMPT).await?;
        }
        Command::Keywords(keywords) => {
            let joined = keywords.join(", ");
            state.store.set_preferences(
                chat_id,
                PreferenceUpdate {
                    keywords: Some(keywords),
                    ..Default::default()
                },
            );
            messenger
                .send_text(chat_id, &format!("✅ Job search keywords updated to: {joined}"))
                .await?;
        }
        Command::Location(location) => {
            state.store.set_preferences(
                chat_id,
                PreferenceUpdate {
                    location: Some(location.clone()),
                    ..Default::default()
                },
            );
            messenger
                .send_text(chat_id, &format!("✅ Job search location updated to: {location}"))
                .await?;
        }
        Command::Score(score) => {
            state.store.set_preferences(
                chat_id,
                PreferenceUpdate {
                    min_score: Some(score),
                    ..Default::default()
                },
            );
            messenger
                .send_text(chat_id, &format!("✅ Minimum match score updated to: {score}%"))
                .await?;
        }
        Command::Time(time) => {
            state.store.set_preferences(
                chat_id,
                PreferenceUpdate {
                    notify_time: Some(time.clone()),
                    ..Default::default()
                },
            );
            messenger
                .send_text(chat_id, &format!("✅ Daily notification time updated to: {time}"))
                .await?;
        }
        Command::Jobs => {
            messenger
                .send_text(
                    chat_id,
                    "🔍 Searching for jobs matching your profile... This may take a minute.",
                )
                .await?;
            pipeline::spawn_run(state.clone(), chat_id.to_string());
        }
        Command::Analyze => {
            messenger
                .send_text(chat_id, "📋 Analyzing your resume... This may take a minute.")
                .await?;
            pipeline::spawn_analysis(state.clone(), chat_id.to_string());
        }
        Command::Pause => {
            if state.store.set_active(chat_id, false) {
                messenger
                    .send_text(chat_id, "⏸️ Job notifications paused. Type /resume to restart.")
                    .await?;
            }
        }
        Command::Resume => {
            if state.store.set_active(chat_id, true) {
                messenger.send_text(chat_id, "▶️ Job notifications resumed!").await?;
            }
        }
        Command::Status => {
            if let Some(profile) = state.store.get(chat_id) {
                messenger.send_markdown(chat_id, &status_text(&profile)).await?;
            }
        }
        Command::Invalid(reply) => {
            messenger.send_text(chat_id, &reply).await?;
        }
        Command::Unknown => {}
    }

    Ok(())
}

/// Document upload: download, extract, store as the resume, then walk the
/// user into preference setup. Extraction failure is user-visible and
/// mutates nothing.
async fn handle_document(state: &AppState, chat_id: &str, file_id: &str) -> Result<(), BotError> {
    let data = match state.messenger.fetch_document(file_id).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Document download for {chat_id} failed: {e}");
            state
                .messenger
                .send_text(chat_id, "❌ Failed to download the PDF.")
                .await?;
            return Ok(());
        }
    };

    let resume_text = match state.extractor.extract(data).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Document extraction for {chat_id} failed: {e}");
            state
                .messenger
                .send_text(chat_id, "❌ Unable to read your document. Please send a valid PDF.")
                .await?;
            return Ok(());
        }
    };

    if state.store.set_resume(chat_id, &resume_text) {
        state.messenger.send_text(chat_id, replies::RESUME_SAVED).await?;
        state
            .messenger
            .send_text(chat_id, replies::PREFERENCES_PROMPT)
            .await?;
    } else {
        state
            .messenger
            .send_text(chat_id, "❌ Failed to save your resume. Please try again.")
            .await?;
    }
    Ok(())
}

fn status_text(profile: &UserProfile) -> String {
    format!(
        "⚙️ *Your Settings*\n\n\
         🔑 Keywords: {keywords}\n\
         📍 Location: {location}\n\
         📊 Minimum match score: {score}%\n\
         ⏰ Notification time: {time}\n\
         📄 Resume: {resume}\n\
         🔔 Notifications: {active}",
        keywords = profile.search_keywords.join(", "),
        location = profile.search_location,
        score = profile.min_match_score,
        time = profile.notification_time,
        resume = if profile.has_resume() { "on file" } else { "not uploaded" },
        active = if profile.is_active { "active" } else { "paused" },
    )
}
