//! Five-bell melody player
//!
//! Ties the pieces together: a MIDI file goes through an [`UploadGateway`]
//! and comes back as a [`Sequence`], which the [`PlaybackScheduler`] plays on
//! the [`BellBoard`].

pub mod config;
pub mod gateway;
pub mod layout;

pub use config::{BellPlayerConfig, ConfigError};
pub use gateway::{
    check_upload, decode_response, HttpGateway, LocalGateway, UploadError, UploadGateway,
    MAX_UPLOAD_BYTES,
};
pub use layout::{BellFrame, BellLayout, MAX_STEP, MIN_BELL_SIZE};

pub use bell_audio::{
    BellBoard, ClipPlayer, PlaybackScheduler, PlaybackState, PlaybackStatus, RingFlags,
};
pub use bell_core::{Bell, NoteEvent, NoteId, Sequence};

use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Pick the gateway the config asks for
pub fn gateway_for(config: &BellPlayerConfig) -> Box<dyn UploadGateway> {
    match &config.extractor_url {
        Some(url) => {
            tracing::info!(%url, "Using remote melody extraction");
            Box::new(HttpGateway::new(url.clone()))
        }
        None => Box::new(LocalGateway),
    }
}

/// Upload, playback and bell display for one user
pub struct BellPlayer {
    gateway: Box<dyn UploadGateway>,
    board: Arc<BellBoard>,
    scheduler: PlaybackScheduler,
    sequence: Option<Sequence>,
    layout: BellLayout,
}

impl BellPlayer {
    pub fn new(gateway: Box<dyn UploadGateway>, clips: Arc<dyn ClipPlayer>) -> Self {
        let board = Arc::new(BellBoard::new(clips));
        let scheduler = PlaybackScheduler::new(board.clone());
        BellPlayer {
            gateway,
            board,
            scheduler,
            sequence: None,
            layout: BellLayout::default(),
        }
    }

    /// Read a MIDI file and turn it into the current sequence
    ///
    /// The previous sequence is kept if anything fails. Loading does not
    /// affect a playback in progress.
    pub async fn load(&mut self, path: impl AsRef<Path>) -> Result<&Sequence, UploadError> {
        let path = path.as_ref();
        let len = tokio::fs::metadata(path).await?.len();
        check_upload(path, len)?;

        let bytes = tokio::fs::read(path).await?;
        let sequence = self.gateway.submit(bytes).await?;
        tracing::info!(
            file = %path.display(),
            notes = sequence.len(),
            duration_ms = sequence.total_duration(),
            "Melody loaded"
        );

        Ok(self.sequence.insert(sequence))
    }

    pub fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = Some(sequence);
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    /// Play the current sequence from the start
    ///
    /// Returns false when nothing has been loaded yet.
    pub fn play(&self) -> bool {
        match &self.sequence {
            Some(sequence) => {
                self.scheduler.play(sequence);
                true
            }
            None => {
                tracing::warn!("Nothing to play, load a MIDI file first");
                false
            }
        }
    }

    pub fn stop(&self) {
        self.scheduler.stop();
    }

    pub fn status(&self) -> PlaybackStatus {
        self.scheduler.status()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.scheduler.subscribe()
    }

    /// Ringing flag of every bell
    pub fn bells(&self) -> RingFlags {
        self.board.snapshot()
    }

    pub fn subscribe_bells(&self) -> watch::Receiver<RingFlags> {
        self.board.subscribe()
    }

    pub fn board(&self) -> &BellBoard {
        &self.board
    }

    pub fn layout(&self) -> &BellLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut BellLayout {
        &mut self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::{sleep_until, Instant};

    #[derive(Default)]
    struct Restarts(Mutex<Vec<Bell>>);

    impl ClipPlayer for Restarts {
        fn restart(&self, bell: Bell) -> bell_audio::Result<()> {
            self.0.lock().unwrap().push(bell);
            Ok(())
        }
    }

    /// Answers every upload with the same sequence
    struct FixedGateway(Sequence);

    #[async_trait]
    impl UploadGateway for FixedGateway {
        async fn submit(&self, _bytes: Vec<u8>) -> Result<Sequence, UploadError> {
            Ok(self.0.clone())
        }
    }

    fn do_mi_sol() -> Sequence {
        Sequence::new(vec![
            NoteEvent::new(Bell::Do, 0),
            NoteEvent::new(Bell::Mi, 500),
            NoteEvent::new(Bell::Sol, 1000),
        ])
    }

    fn scratch_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("bell-player-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_rings_bells_and_stop_resets() {
        let clips = Arc::new(Restarts::default());
        let mut player = BellPlayer::new(Box::new(FixedGateway(do_mi_sol())), clips.clone());
        assert!(!player.play());

        player.set_sequence(do_mi_sol());
        let start = Instant::now();
        assert!(player.play());

        sleep_until(start + Duration::from_millis(1)).await;
        assert_eq!(player.bells(), [true, false, false, false, false]);

        sleep_until(start + Duration::from_millis(501)).await;
        assert!(!player.board().is_ringing(Bell::Do));
        assert!(player.board().is_ringing(Bell::Mi));
        assert!(player.is_playing());

        player.stop();
        assert_eq!(player.status(), PlaybackStatus::IDLE);
        // the ringing flag decays on its own
        assert!(player.board().is_ringing(Bell::Mi));

        sleep_until(start + Duration::from_millis(2000)).await;
        assert_eq!(player.bells(), [false; 5]);
        assert_eq!(*clips.0.lock().unwrap(), vec![Bell::Do, Bell::Mi]);
    }

    #[tokio::test]
    async fn test_load_checks_extension_before_submitting() {
        let mut player = BellPlayer::new(Box::new(FixedGateway(do_mi_sol())), Arc::new(Restarts::default()));
        let path = scratch_file("notes.txt", b"MThd");

        let err = player.load(&path).await.unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
        assert!(player.sequence().is_none());
    }

    #[tokio::test]
    async fn test_load_stores_sequence() {
        let mut player = BellPlayer::new(Box::new(FixedGateway(do_mi_sol())), Arc::new(Restarts::default()));
        let path = scratch_file("song.mid", b"MThd");

        let loaded = player.load(&path).await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(player.sequence(), Some(&do_mi_sol()));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let mut player = BellPlayer::new(Box::new(LocalGateway), Arc::new(Restarts::default()));
        let err = player.load("/no/such/song.mid").await.unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }

    #[test]
    fn test_layout_is_editable() {
        let mut player = BellPlayer::new(Box::new(LocalGateway), Arc::new(Restarts::default()));
        player.layout_mut().drag(Bell::Fa, 10.0, 0.0);
        assert_eq!(
            player.layout().frame(Bell::Fa).left,
            BellLayout::default().frame(Bell::Fa).left + 10.0
        );
    }
}
