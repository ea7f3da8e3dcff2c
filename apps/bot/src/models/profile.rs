use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum number of delivered posting ids remembered per user.
/// Oldest entries are evicted first once the bound is reached.
pub const DELIVERED_CAP: usize = 100;

/// Per-user profile, preferences and delivery history.
///
/// This is the record persisted in the user snapshot file; field names
/// are the snapshot's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Extracted resume text. Empty until the user uploads a document.
    pub resume: String,
    pub search_keywords: Vec<String>,
    pub search_location: String,
    /// Minimum match score for a posting to be delivered. Always in [0,100].
    pub min_match_score: u8,
    /// Posting ids already sent to this user, oldest first. Bounded at
    /// [`DELIVERED_CAP`].
    pub jobs_sent: VecDeque<String>,
    /// Daily notification time as a timezone-free "HH:MM" string.
    pub notification_time: String,
    pub is_active: bool,
    /// ISO-8601 UTC timestamp of the last user-initiated mutation.
    pub last_activity: String,
    /// Whether the welcome message has been sent.
    pub welcomed: bool,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            resume: String::new(),
            search_keywords: vec!["AI Engineer".to_string()],
            search_location: "India".to_string(),
            min_match_score: 70,
            jobs_sent: VecDeque::new(),
            notification_time: "09:00".to_string(),
            is_active: true,
            last_activity: Utc::now().to_rfc3339(),
            welcomed: true,
        }
    }
}

impl UserProfile {
    pub fn has_resume(&self) -> bool {
        !self.resume.trim().is_empty()
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now().to_rfc3339();
    }

    /// Records a delivered posting id, evicting the oldest entries once
    /// the set exceeds [`DELIVERED_CAP`]. Idempotent for ids already
    /// present.
    pub fn record_delivered(&mut self, posting_id: &str) {
        if self.jobs_sent.iter().any(|id| id == posting_id) {
            return;
        }
        self.jobs_sent.push_back(posting_id.to_string());
        while self.jobs_sent.len() > DELIVERED_CAP {
            self.jobs_sent.pop_front();
        }
    }

    pub fn already_delivered(&self, posting_id: &str) -> bool {
        self.jobs_sent.iter().any(|id| id == posting_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_matches_onboarding_contract() {
        let p = UserProfile::default();
        assert_eq!(p.search_keywords, vec!["AI Engineer".to_string()]);
        assert_eq!(p.search_location, "India");
        assert_eq!(p.min_match_score, 70);
        assert_eq!(p.notification_time, "09:00");
        assert!(p.is_active);
        assert!(!p.has_resume());
    }

    #[test]
    fn test_delivered_set_bounded_fifo() {
        let mut p = UserProfile::default();
        for i in 0..150 {
            p.record_delivered(&format!("src_{i}"));
        }
        assert_eq!(p.jobs_sent.len(), DELIVERED_CAP);
        // Oldest 50 evicted; id 50 is now the front.
        assert_eq!(p.jobs_sent.front().map(String::as_str), Some("src_50"));
        assert!(!p.already_delivered("src_49"));
        assert!(p.already_delivered("src_149"));
    }

    #[test]
    fn test_record_delivered_is_idempotent() {
        let mut p = UserProfile::default();
        p.record_delivered("a");
        p.record_delivered("a");
        assert_eq!(p.jobs_sent.len(), 1);
    }
}
