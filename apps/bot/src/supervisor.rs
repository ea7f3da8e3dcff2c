//! ProcessSupervisor — the single long-lived control loop.
//!
//! Poll inbound messages (long poll), advance due scheduled work, sleep
//! briefly, repeat. No iteration's failure terminates the loop: errors
//! are logged and followed by a longer backoff.

use std::sync::Arc;

use tracing::{error, warn};

use crate::router;
use crate::scheduler::Scheduler;
use crate::state::AppState;
use crate::telegram::TelegramClient;

const IDLE_SLEEP: std::time::Duration = std::time::Duration::from_secs(1);
const ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_secs(5);

pub struct Supervisor {
    state: AppState,
    telegram: TelegramClient,
    scheduler: Arc<Scheduler>,
    /// getUpdates offset. Advanced past a batch only once the whole batch
    /// has been received; a transport failure leaves it alone so the same
    /// batch is retried (at-least-once, idempotent-leaning).
    offset: Option<i64>,
}

impl Supervisor {
    pub fn new(state: AppState, telegram: TelegramClient, scheduler: Arc<Scheduler>) -> Self {
        Supervisor {
            state,
            telegram,
            scheduler,
            offset: None,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            match self.telegram.get_updates(self.offset).await {
                Ok(updates) => {
                    // Commit the offset for the whole batch before
                    // dispatching, so a bad handler cannot wedge the loop
                    // on one poisoned update.
                    if let Some(max_id) = updates.iter().map(|u| u.update_id).max() {
                        self.offset = Some(max_id + 1);
                    }
                    for update in updates {
                        if let Err(e) = router::handle_update(&self.state, update).await {
                            warn!("Update handling failed: {e}");
                        }
                    }
                }
                Err(e) => {
                    error!("Polling for updates failed: {e}");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }

            // Scheduled work advances whether or not polling succeeded;
            // a flaky channel must not starve due slots.
            self.scheduler.tick();
            tokio::time::sleep(IDLE_SLEEP).await;
        }
    }
}
