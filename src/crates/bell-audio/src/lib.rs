//! Timed bell playback
//!
//! This crate plays a bell [`Sequence`] in real time:
//! - [`PlaybackScheduler`] fires the note events in order from one driver task and tracks progress
//! - [`BellBoard`] rings a bell: restarts its clip and raises its visual flag
//! - [`Carillon`] holds one clip per bell and mixes them into the output
//! - [`AudioEngine`] drives the output device
//!
//! The scheduler only knows the [`NoteTrigger`] capability; everything audible
//! or visible happens behind it.

pub mod carillon;
pub mod engine;
pub mod samples;
pub mod scheduler;
pub mod trigger;
pub mod voice;


pub use carillon::{Carillon, Mixer};
pub use engine::AudioEngine;
pub use samples::{BellClips, Sample};
pub use scheduler::{PlaybackScheduler, PlaybackState, PlaybackStatus, COMPLETION_GRACE};
pub use trigger::{BellBoard, ClipPlayer, NoteTrigger, RingFlags, RING_DURATION};
pub use voice::Voice;

pub use bell_core::{Bell, NoteEvent, NoteId, Sequence};

/// Audio playback errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Audio device error: {0}")]
    DeviceError(String),

    #[error("Sample not found: {0}")]
    SampleNotFound(String),

    #[error("Failed to decode audio: {0}")]
    DecodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;
