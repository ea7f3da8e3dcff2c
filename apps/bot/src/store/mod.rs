//! UserStore — the single writable source of truth for profile state.
//!
//! An in-memory map guarded by a mutex, snapshotted to a flat JSON file
//! on every mutation. The snapshot is replaced atomically (write to a
//! temp file in the same directory, then rename), so a crash mid-write
//! leaves the prior version intact. The lock is never held across an
//! await point; callers get cloned profiles, never references into the
//! map.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{error, info, warn};

use crate::models::UserProfile;

/// Partial preference update applied atomically by [`UserStore::set_preferences`].
#[derive(Debug, Default, Clone)]
pub struct PreferenceUpdate {
    pub keywords: Option<Vec<String>>,
    pub location: Option<String>,
    pub min_score: Option<u8>,
    pub notify_time: Option<String>,
}

pub struct UserStore {
    path: PathBuf,
    users: Mutex<HashMap<String, UserProfile>>,
}

impl UserStore {
    /// Loads the snapshot at `path`, starting empty if it is missing or
    /// unreadable (logged, not fatal).
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, UserProfile>>(&raw) {
                Ok(users) => {
                    info!("Loaded {} user(s) from {}", users.len(), path.display());
                    users
                }
                Err(e) => {
                    error!("User snapshot {} is corrupt, starting empty: {e}", path.display());
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No user snapshot at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => {
                error!("Failed to read {}: {e}, starting empty", path.display());
                HashMap::new()
            }
        };
        UserStore {
            path,
            users: Mutex::new(users),
        }
    }

    /// Registers a user if not already present. Returns true for a new user.
    pub fn register(&self, id: &str) -> bool {
        let mut users = self.users.lock().expect("user store poisoned");
        if users.contains_key(id) {
            return false;
        }
        users.insert(id.to_string(), UserProfile::default());
        self.persist(&users);
        true
    }

    pub fn get(&self, id: &str) -> Option<UserProfile> {
        let users = self.users.lock().expect("user store poisoned");
        users.get(id).cloned()
    }

    pub fn set_resume(&self, id: &str, resume_text: &str) -> bool {
        self.mutate(id, |p| p.resume = resume_text.to_string())
    }

    /// Applies all present fields of `update` as one atomic change.
    /// The min-score invariant (0–100) is enforced here unconditionally.
    pub fn set_preferences(&self, id: &str, update: PreferenceUpdate) -> bool {
        self.mutate(id, |p| {
            if let Some(keywords) = update.keywords {
                p.search_keywords = keywords;
            }
            if let Some(location) = update.location {
                p.search_location = location;
            }
            if let Some(min_score) = update.min_score {
                p.min_match_score = min_score.min(100);
            }
            if let Some(notify_time) = update.notify_time {
                p.notification_time = notify_time;
            }
        })
    }

    pub fn record_delivered(&self, id: &str, posting_id: &str) {
        self.mutate(id, |p| p.record_delivered(posting_id));
    }

    pub fn set_active(&self, id: &str, active: bool) -> bool {
        self.mutate(id, |p| p.is_active = active)
    }

    /// Point-in-time copy of all profiles, for schedule rebuilds.
    pub fn snapshot_all(&self) -> Vec<(String, UserProfile)> {
        let users = self.users.lock().expect("user store poisoned");
        users.iter().map(|(id, p)| (id.clone(), p.clone())).collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().expect("user store poisoned").len()
    }

    /// Read-modify-write under the lock; persists before returning.
    /// Returns false if the user is unknown.
    fn mutate(&self, id: &str, f: impl FnOnce(&mut UserProfile)) -> bool {
        let mut users = self.users.lock().expect("user store poisoned");
        let Some(profile) = users.get_mut(id) else {
            return false;
        };
        f(profile);
        profile.touch();
        self.persist(&users);
        true
    }

    /// Full-file atomic replace. A persistence failure is logged and the
    /// in-memory state stays authoritative for the running process.
    fn persist(&self, users: &HashMap<String, UserProfile>) {
        if let Err(e) = write_snapshot(&self.path, users) {
            warn!("Failed to persist user snapshot to {}: {e}", self.path.display());
        }
    }
}

fn write_snapshot(path: &Path, users: &HashMap<String, UserProfile>) -> std::io::Result<()> {
    let json = serde_json::to_vec_pretty(users)?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(dir.path().join("users.json"));
        (dir, store)
    }

    #[test]
    fn test_register_is_idempotent() {
        let (_dir, store) = temp_store();
        assert!(store.register("42"));
        assert!(!store.register("42"));
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_mutations_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        {
            let store = UserStore::load(&path);
            store.register("42");
            store.set_resume("42", "Systems engineer, 6 years Rust");
            store.record_delivered("42", "remotive_abc");
        }
        let store = UserStore::load(&path);
        let profile = store.get("42").unwrap();
        assert_eq!(profile.resume, "Systems engineer, 6 years Rust");
        assert!(profile.already_delivered("remotive_abc"));
    }

    #[test]
    fn test_min_score_invariant_enforced() {
        let (_dir, store) = temp_store();
        store.register("42");
        store.set_preferences(
            "42",
            PreferenceUpdate {
                min_score: Some(250),
                ..Default::default()
            },
        );
        assert!(store.get("42").unwrap().min_match_score <= 100);

        store.set_preferences(
            "42",
            PreferenceUpdate {
                min_score: Some(100),
                ..Default::default()
            },
        );
        assert_eq!(store.get("42").unwrap().min_match_score, 100);
    }

    #[test]
    fn test_combined_preference_update_is_atomic() {
        let (_dir, store) = temp_store();
        store.register("42");
        store.set_preferences(
            "42",
            PreferenceUpdate {
                keywords: Some(vec!["Data Scientist".into(), "ML Engineer".into()]),
                location: Some("Remote".into()),
                min_score: Some(80),
                notify_time: Some("08:30".into()),
            },
        );
        let p = store.get("42").unwrap();
        assert_eq!(p.search_keywords, vec!["Data Scientist", "ML Engineer"]);
        assert_eq!(p.search_location, "Remote");
        assert_eq!(p.min_match_score, 80);
        assert_eq!(p.notification_time, "08:30");
    }

    #[test]
    fn test_mutate_unknown_user_is_noop() {
        let (_dir, store) = temp_store();
        assert!(!store.set_resume("missing", "text"));
        assert!(!store.set_active("missing", false));
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = UserStore::load(&path);
        assert_eq!(store.user_count(), 0);
    }
}
