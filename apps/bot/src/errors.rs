#![allow(dead_code)]

use thiserror::Error;

/// Application-level error taxonomy.
///
/// Every external collaborator call returns one of these; callers pick
/// fallback vs propagate per variant. No variant is allowed to take the
/// process down — the supervisor loop is the last line of defense.
#[derive(Debug, Error)]
pub enum BotError {
    /// Messaging-channel / network failure. Logged, the affected call is
    /// abandoned, the outer loop continues.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Messaging API accepted the connection but rejected the call.
    /// Treated like a transport failure by callers.
    #[error("Channel API error: {0}")]
    Channel(String),

    /// Document could not be read. Surfaced to the user; no state mutated.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Malformed command arguments. Surfaced as a corrective reply naming
    /// the expected format; no state mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Oracle call failed or returned unusable output. Never surfaced to
    /// the end user; callers substitute the neutral fallback result.
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// State file unwritable. In-memory state remains authoritative for
    /// the running process; risks loss on restart, not fatal.
    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),
}
