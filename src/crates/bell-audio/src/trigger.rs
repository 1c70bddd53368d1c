//! Ringing a bell: the audible and visible effect of one note

use crate::{Bell, NoteId, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How long a bell shows as ringing after it was struck
pub const RING_DURATION: Duration = Duration::from_millis(200);

/// Ringing flag per bell, indexed by [`Bell::index`]
pub type RingFlags = [bool; 5];

/// Capability handed to the scheduler: fire the effect for one note
///
/// Fire-and-forget. Implementations must not block and must not call back
/// into the scheduler that invokes them.
pub trait NoteTrigger: Send + Sync {
    fn trigger(&self, note: &NoteId);
}

/// Restart-capable clip playback, one clip per bell
pub trait ClipPlayer: Send + Sync {
    /// Play the bell's clip from its start, cutting off any playback in
    /// progress for the same bell
    fn restart(&self, bell: Bell) -> Result<()>;
}

struct RingState {
    /// Bumped on every strike; a pending release only applies to its own strike
    strikes: [u64; 5],
    flags: watch::Sender<RingFlags>,
}

/// The bell display: plays clips and keeps the ringing flags
///
/// Flags are released [`RING_DURATION`] after the latest strike of a bell and
/// are independent of any playback session.
pub struct BellBoard {
    clips: Arc<dyn ClipPlayer>,
    state: Arc<Mutex<RingState>>,
}

impl BellBoard {
    pub fn new(clips: Arc<dyn ClipPlayer>) -> Self {
        let (flags, _) = watch::channel([false; 5]);
        BellBoard {
            clips,
            state: Arc::new(Mutex::new(RingState {
                strikes: [0; 5],
                flags,
            })),
        }
    }

    /// Strike a bell directly
    ///
    /// Must be called from within a Tokio runtime, which runs the release timer.
    pub fn strike(&self, bell: Bell) {
        if let Err(e) = self.clips.restart(bell) {
            tracing::error!(%bell, "Failed to play bell clip: {}", e);
        }

        let index = bell.index();
        let strike = {
            let mut state = self.state.lock();
            state.strikes[index] += 1;
            state.flags.send_if_modified(|flags| !std::mem::replace(&mut flags[index], true));
            state.strikes[index]
        };

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(RING_DURATION).await;
            let state = state.lock();
            if state.strikes[index] == strike {
                state.flags.send_modify(|flags| flags[index] = false);
            }
        });
    }

    pub fn is_ringing(&self, bell: Bell) -> bool {
        self.state.lock().flags.borrow()[bell.index()]
    }

    pub fn snapshot(&self) -> RingFlags {
        *self.state.lock().flags.borrow()
    }

    /// Receive every change of the ringing flags
    pub fn subscribe(&self) -> watch::Receiver<RingFlags> {
        self.state.lock().flags.subscribe()
    }
}

impl NoteTrigger for BellBoard {
    fn trigger(&self, note: &NoteId) {
        match note.bell() {
            Some(bell) => self.strike(bell),
            None => tracing::warn!(%note, "Ignoring note outside the bell set"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AudioError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::{sleep_until, Instant};

    /// Records restarts; can be switched to refuse playback
    #[derive(Default)]
    struct FakeClips {
        restarts: Mutex<Vec<Bell>>,
        refuse: AtomicBool,
    }

    impl ClipPlayer for FakeClips {
        fn restart(&self, bell: Bell) -> Result<()> {
            if self.refuse.load(Ordering::SeqCst) {
                return Err(AudioError::DeviceError("playback refused".to_string()));
            }
            self.restarts.lock().push(bell);
            Ok(())
        }
    }

    fn board() -> (BellBoard, Arc<FakeClips>) {
        let clips = Arc::new(FakeClips::default());
        (BellBoard::new(clips.clone()), clips)
    }

    fn at(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[tokio::test(start_paused = true)]
    async fn test_flag_clears_after_ring_duration() {
        let (board, clips) = board();
        let start = Instant::now();

        board.trigger(&NoteId::from("Mi"));
        assert!(board.is_ringing(Bell::Mi));
        assert_eq!(*clips.restarts.lock(), vec![Bell::Mi]);

        sleep_until(at(start, 199)).await;
        assert!(board.is_ringing(Bell::Mi));

        sleep_until(at(start, 201)).await;
        assert!(!board.is_ringing(Bell::Mi));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_keeps_flag_up_and_restarts_clip() {
        let (board, clips) = board();
        let start = Instant::now();

        board.trigger(&NoteId::from("Do"));
        sleep_until(at(start, 100)).await;
        board.trigger(&NoteId::from("Do"));

        // the first strike's release is ignored
        sleep_until(at(start, 250)).await;
        assert!(board.is_ringing(Bell::Do));

        sleep_until(at(start, 301)).await;
        assert!(!board.is_ringing(Bell::Do));
        assert_eq!(*clips.restarts.lock(), vec![Bell::Do, Bell::Do]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flag_set_even_when_audio_fails() {
        let (board, clips) = board();
        clips.refuse.store(true, Ordering::SeqCst);

        board.trigger(&NoteId::from("Sol"));
        assert!(board.is_ringing(Bell::Sol));
        assert!(clips.restarts.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_note_is_ignored() {
        let (board, clips) = board();

        board.trigger(&NoteId::from("La"));
        assert_eq!(board.snapshot(), [false; 5]);
        assert!(clips.restarts.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_changes() {
        let (board, _clips) = board();
        let mut rx = board.subscribe();

        board.trigger(&NoteId::from("Ré"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), [false, true, false, false, false]);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), [false; 5]);
    }
}
