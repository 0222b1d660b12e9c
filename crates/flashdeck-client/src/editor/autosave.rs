//! Per-card debounced autosave.
//!
//! Each card owns a [`Debouncer`]. When a timer fires the card's draft is compared
//! with its last server copy; only a real difference produces an update. A draft
//! left different by an update that was in flight is saved again.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use flashdeck_api_models::Id;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::editor::state::{EditorState, SaveStatus};
use crate::http::ApiClient;

pub(crate) type SharedState = Arc<Mutex<EditorState>>;
pub(crate) type StatusFeed = Arc<watch::Sender<SaveStatus>>;

#[derive(Debug)]
pub(crate) struct Autosaver {
    client: ApiClient,
    state: SharedState,
    status: StatusFeed,
    delay: Duration,
    timers: Mutex<HashMap<Id, Arc<Debouncer>>>,
}

impl Autosaver {
    pub(crate) fn new(
        client: ApiClient,
        state: SharedState,
        status: StatusFeed,
        delay: Duration,
    ) -> Self {
        Self {
            client,
            state,
            status,
            delay,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Restart the card's timer.
    pub(crate) fn schedule(&self, card_id: Id) {
        let debouncer = Arc::clone(
            self.timers()
                .entry(card_id)
                .or_insert_with(|| Arc::new(Debouncer::new(self.delay))),
        );
        let job = SaveJob {
            client: self.client.clone(),
            state: Arc::clone(&self.state),
            status: Arc::clone(&self.status),
            card_id,
            timer: Arc::downgrade(&debouncer),
        };
        debouncer.schedule(job.run());
    }

    /// Drop the card's pending timer.
    pub(crate) fn cancel(&self, card_id: Id) {
        if let Some(debouncer) = self.timers().remove(&card_id) {
            debouncer.cancel();
        }
    }

    /// Drop every pending timer.
    pub(crate) fn cancel_all(&self) {
        for (_, debouncer) in self.timers().drain() {
            debouncer.cancel();
        }
    }

    /// Whether any card still has a timer or save outstanding.
    pub(crate) fn is_pending(&self) -> bool {
        self.timers().values().any(|debouncer| debouncer.is_pending())
    }

    /// Wait for every scheduled save to run.
    pub(crate) async fn flush(&self) {
        let debouncers: Vec<Arc<Debouncer>> = self.timers().values().cloned().collect();
        for debouncer in debouncers {
            debouncer.settle().await;
        }
    }

    fn timers(&self) -> std::sync::MutexGuard<'_, HashMap<Id, Arc<Debouncer>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One debounced save of a card's draft.
///
/// A draft that changed while its update was in flight no longer matches the new
/// server copy; the job then queues itself again on the card's timer.
struct SaveJob {
    client: ApiClient,
    state: SharedState,
    status: StatusFeed,
    card_id: Id,
    timer: Weak<Debouncer>,
}

impl SaveJob {
    fn run(self) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            if !self.save().await {
                return;
            }
            if let Some(timer) = self.timer.upgrade() {
                debug!(card_id = self.card_id, "draft changed during autosave; rescheduling");
                timer.schedule(self.run());
            }
        })
    }

    /// Send the draft when it differs from the server copy.
    ///
    /// Returns whether the draft still differs once the update has landed.
    async fn save(&self) -> bool {
        let card_id = self.card_id;
        let payload = {
            let mut state = self.lock_state();
            match state.entry_mut(card_id) {
                Some(entry) if entry.is_dirty() => entry.draft.clone(),
                Some(_) => {
                    debug!(card_id, "draft matches saved card; skipping autosave");
                    return false;
                }
                None => return false,
            }
        };

        self.status.send_replace(SaveStatus::Saving);
        match self.client.update_card(card_id, &payload).await {
            Ok(card) => {
                let unsaved = self.lock_state().entry_mut(card_id).is_some_and(|entry| {
                    let order = entry.card.order;
                    entry.card = card;
                    entry.card.order = order;
                    entry.is_dirty()
                });
                self.status.send_replace(SaveStatus::Saved);
                unsaved
            }
            Err(err) => {
                warn!(card_id, error = %err, "autosave failed for card");
                self.status.send_replace(SaveStatus::Idle);
                false
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SaveJob {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SaveJob")
            .field("card_id", &self.card_id)
            .finish_non_exhaustive()
    }
}
