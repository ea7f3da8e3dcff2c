//! DispatchScheduler — fires one aggregate run per HH:MM slot per day.
//!
//! The slot bookkeeping lives in [`Schedule`], a pure state machine fed
//! an injected clock so it is fully testable. The [`Scheduler`] driver is
//! polled from the supervisor loop and spawns one isolated task per due
//! user; it never waits for run completion.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use tracing::info;

use crate::models::UserProfile;
use crate::pipeline;
use crate::state::AppState;

/// Liveness heartbeat interval, minutes.
const HEARTBEAT_MINUTES: i64 = 15;
/// Daily instant after which the slot grouping is rebuilt from the store.
/// This is the only way new users or changed notification times take
/// effect for future days within one process lifetime.
const REBUILD_HOUR: u32 = 0;
const REBUILD_MINUTE: u32 = 1;

/// What the driver should do after one tick.
#[derive(Debug, Default, PartialEq)]
pub struct TickAction {
    pub due_users: Vec<String>,
    pub rebuild_due: bool,
    pub heartbeat_due: bool,
}

/// Slot grouping plus fired-today tracking. Idle → due happens when the
/// wall clock reaches a registered slot not yet fired on the current
/// date; the fired set resets when the date changes.
pub struct Schedule {
    slots: HashMap<String, HashSet<String>>,
    fired: HashSet<String>,
    day: NaiveDate,
    rebuilt_on: NaiveDate,
    last_heartbeat: Option<NaiveDateTime>,
    primed: bool,
}

impl Schedule {
    pub fn new(today: NaiveDate) -> Self {
        Schedule {
            slots: HashMap::new(),
            fired: HashSet::new(),
            day: today,
            rebuilt_on: today,
            last_heartbeat: None,
            primed: false,
        }
    }

    /// Rebuilds the HH:MM → user-set grouping from scratch, discarding
    /// the previous grouping. Inactive users are excluded.
    pub fn rebuild(&mut self, snapshot: &[(String, UserProfile)], today: NaiveDate) {
        self.slots.clear();
        for (id, profile) in snapshot {
            if profile.is_active {
                self.slots
                    .entry(profile.notification_time.clone())
                    .or_default()
                    .insert(id.clone());
            }
        }
        self.rebuilt_on = today;
        info!("Schedule rebuilt: {} slot(s)", self.slots.len());
    }

    pub fn tick(&mut self, now: NaiveDateTime) -> TickAction {
        let today = now.date();
        if today != self.day {
            self.day = today;
            self.fired.clear();
        }

        let mut action = TickAction::default();

        // Zero-padded HH:MM compares lexicographically in chronological
        // order, so slot keys can be ordered against the clock directly.
        let hhmm = format!("{:02}:{:02}", now.time().hour(), now.time().minute());

        // First look at the clock: slots already past are treated as
        // fired, so a mid-day start does not replay the whole morning.
        if !self.primed {
            self.primed = true;
            let past: Vec<String> = self
                .slots
                .keys()
                .filter(|slot| slot.as_str() < hhmm.as_str())
                .cloned()
                .collect();
            self.fired.extend(past);
        }

        // A slot is due once its time has passed and it has not fired
        // today. Ticks are not guaranteed to land inside the slot's exact
        // minute (the long poll alone can stretch an iteration past 60 s),
        // so slots whose minute fell between ticks are caught up here.
        let due_slots: Vec<String> = self
            .slots
            .keys()
            .filter(|slot| slot.as_str() <= hhmm.as_str() && !self.fired.contains(slot.as_str()))
            .cloned()
            .collect();
        for slot in due_slots {
            if let Some(users) = self.slots.get(&slot) {
                action.due_users.extend(users.iter().cloned());
            }
            self.fired.insert(slot);
        }
        action.due_users.sort();

        let past_rebuild_instant = now.time().hour() > REBUILD_HOUR
            || (now.time().hour() == REBUILD_HOUR && now.time().minute() >= REBUILD_MINUTE);
        action.rebuild_due = self.rebuilt_on != today && past_rebuild_instant;

        action.heartbeat_due = match self.last_heartbeat {
            None => true,
            Some(last) => (now - last).num_minutes() >= HEARTBEAT_MINUTES,
        };
        if action.heartbeat_due {
            self.last_heartbeat = Some(now);
        }

        action
    }
}

/// Driver polled by the supervisor. Holds the schedule behind a mutex;
/// the lock is released before any spawn or await.
pub struct Scheduler {
    state: AppState,
    schedule: Mutex<Schedule>,
}

impl Scheduler {
    /// Builds the initial grouping from the current store contents.
    pub fn new(state: AppState) -> Arc<Self> {
        let today = Local::now().date_naive();
        let mut schedule = Schedule::new(today);
        schedule.rebuild(&state.store.snapshot_all(), today);
        Arc::new(Scheduler {
            state,
            schedule: Mutex::new(schedule),
        })
    }

    /// Advances the schedule against the wall clock, spawning one task
    /// per due user. Returns once all runs are STARTED; completion is
    /// asynchronous and only affects each user's own state.
    pub fn tick(&self) {
        let now = Local::now().naive_local();

        let action = {
            let mut schedule = self.schedule.lock().expect("schedule poisoned");
            let action = schedule.tick(now);
            if action.rebuild_due {
                schedule.rebuild(&self.state.store.snapshot_all(), now.date());
            }
            action
        };

        if action.heartbeat_due {
            info!(
                "Health check ping ({} user(s) registered)",
                self.state.store.user_count()
            );
        }

        if !action.due_users.is_empty() {
            info!(
                "Slot fired at {}: dispatching {} user run(s)",
                now.format("%H:%M"),
                action.due_users.len()
            );
        }
        for user_id in action.due_users {
            pipeline::spawn_run(self.state.clone(), user_id);
        }
    }
}
