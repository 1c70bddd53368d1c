//! Real-time playback of a bell sequence
//!
//! Playback is a session: one Tokio driver task walks the events in order,
//! sleeping until each deadline relative to the session start. All session
//! state sits behind a single mutex and each note fires while holding it, so a
//! driver that wakes after its session was replaced or stopped sees a
//! different session id and does nothing.

use crate::trigger::NoteTrigger;
use crate::{NoteEvent, NoteId, Sequence};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Delay between the last note firing and the session returning to idle
pub const COMPLETION_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    /// The last note has fired; the session ends after [`COMPLETION_GRACE`]
    Completed,
}

/// Snapshot published on every state or progress change
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    /// Percentage in `[0, 100]`, non-decreasing within a session
    pub progress: f64,
}

impl PlaybackStatus {
    pub const IDLE: PlaybackStatus = PlaybackStatus {
        state: PlaybackState::Idle,
        progress: 0.0,
    };
}

struct Session {
    id: u64,
    started: Instant,
    /// Time of the last event, in ms
    total_duration: u64,
    last_index: usize,
    progress: f64,
    /// Attached right after spawning, outside the lock
    driver: Option<JoinHandle<()>>,
}

impl Session {
    fn progress_at(&self, index: usize, now: Instant) -> f64 {
        if self.total_duration == 0 || index == self.last_index {
            return 100.0;
        }
        let elapsed_ms = now.saturating_duration_since(self.started).as_secs_f64() * 1000.0;
        (elapsed_ms / self.total_duration as f64 * 100.0).min(100.0)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(driver) = &self.driver {
            driver.abort();
        }
    }
}

struct Shared {
    session: Option<Session>,
    next_id: u64,
    status: watch::Sender<PlaybackStatus>,
}

impl Shared {
    fn publish(&self, status: PlaybackStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    /// Drop the session (aborting its driver) and go back to idle
    fn end_session(&mut self) {
        self.session = None;
        self.publish(PlaybackStatus::IDLE);
    }
}

/// Plays sequences against a [`NoteTrigger`]
///
/// `play` and `stop` never block; they only spawn or abort a driver task. `play` must
/// be called from within a Tokio runtime. The trigger is invoked while the
/// scheduler's lock is held and must not call back into the scheduler.
pub struct PlaybackScheduler {
    trigger: Arc<dyn NoteTrigger>,
    shared: Arc<Mutex<Shared>>,
}

impl PlaybackScheduler {
    pub fn new(trigger: Arc<dyn NoteTrigger>) -> Self {
        let (status, _) = watch::channel(PlaybackStatus::IDLE);
        PlaybackScheduler {
            trigger,
            shared: Arc::new(Mutex::new(Shared {
                session: None,
                next_id: 0,
                status,
            })),
        }
    }

    /// Start playing `sequence`, replacing any session in progress
    ///
    /// An empty sequence is ignored and leaves the current session untouched.
    pub fn play(&self, sequence: &Sequence) {
        let Some(last) = sequence.events().last() else {
            tracing::debug!("Ignoring empty sequence");
            return;
        };

        let (id, started) = {
            let mut shared = self.shared.lock();
            if shared.session.take().is_some() {
                tracing::info!("Cancelling previous playback");
            }

            shared.next_id += 1;
            let id = shared.next_id;
            let started = Instant::now();
            shared.session = Some(Session {
                id,
                started,
                total_duration: last.time,
                last_index: sequence.len() - 1,
                progress: 0.0,
                driver: None,
            });
            shared.publish(PlaybackStatus {
                state: PlaybackState::Playing,
                progress: 0.0,
            });
            (id, started)
        };

        let driver = tokio::spawn(drive(
            Arc::clone(&self.shared),
            Arc::clone(&self.trigger),
            id,
            started,
            sequence.events().to_vec(),
        ));

        match self.shared.lock().session.as_mut() {
            Some(session) if session.id == id => session.driver = Some(driver),
            // stopped or replaced in the meantime
            _ => driver.abort(),
        }

        tracing::info!(
            session = id,
            events = sequence.len(),
            duration_ms = last.time,
            "Playback started"
        );
    }

    /// Cancel the current session, if any
    ///
    /// No trigger from the cancelled session fires after this returns.
    pub fn stop(&self) {
        let mut shared = self.shared.lock();
        if let Some(session) = &shared.session {
            tracing::info!(session = session.id, "Playback stopped");
        }
        shared.end_session();
    }

    pub fn status(&self) -> PlaybackStatus {
        *self.shared.lock().status.borrow()
    }

    pub fn state(&self) -> PlaybackState {
        self.status().state
    }

    pub fn progress(&self) -> f64 {
        self.status().progress
    }

    /// True while a session is live, including the completion grace period
    pub fn is_playing(&self) -> bool {
        self.state() != PlaybackState::Idle
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.shared.lock().status.subscribe()
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fire every event of session `id` in order, then end the session after the
/// grace period
async fn drive(
    shared: Arc<Mutex<Shared>>,
    trigger: Arc<dyn NoteTrigger>,
    id: u64,
    started: Instant,
    events: Vec<NoteEvent>,
) {
    let mut fired_at = started;
    for (index, event) in events.iter().enumerate() {
        sleep_until(started + Duration::from_millis(event.time)).await;
        match fire(&shared, trigger.as_ref(), id, index, &event.note) {
            Some(at) => fired_at = at,
            None => return,
        }
    }

    sleep_until(fired_at + COMPLETION_GRACE).await;
    let mut shared = shared.lock();
    if shared.session.as_ref().is_some_and(|s| s.id == id) {
        tracing::info!(session = id, "Playback finished");
        shared.end_session();
    }
}

/// Fire one note if session `id` is still current, returning when it fired
fn fire(
    shared: &Mutex<Shared>,
    trigger: &dyn NoteTrigger,
    id: u64,
    index: usize,
    note: &NoteId,
) -> Option<Instant> {
    let mut guard = shared.lock();
    let state = &mut *guard;
    let session = state.session.as_mut().filter(|s| s.id == id)?;

    trigger.trigger(note);

    let now = Instant::now();
    session.progress = session.progress_at(index, now).max(session.progress);
    tracing::debug!(session = id, %note, index, progress = session.progress, "Note fired");

    let status = PlaybackStatus {
        state: if index == session.last_index {
            PlaybackState::Completed
        } else {
            PlaybackState::Playing
        },
        progress: session.progress,
    };
    state.publish(status);
    Some(now)
}
