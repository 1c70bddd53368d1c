//! MIDI to bell melody extraction
//!
//! Reads a Standard MIDI File, finds the tracks that most likely carry the
//! melody, reduces them to a single voice and maps every note onto one of the
//! five bells. The result is a [`Sequence`] of absolute millisecond offsets,
//! sorted and ready for playback.

pub mod melody;
pub mod midi;
pub mod timeline;

#[cfg(test)]
mod fixtures;

pub use midi::MidiData;
pub use timeline::{build_sequence, nearest_bell};

use bell_core::Sequence;

/// Melody extraction errors
#[derive(Debug, thiserror::Error)]
pub enum MelodyError {
    #[error("Failed to parse MIDI file: {0}")]
    Parse(String),

    #[error("MIDI file has no usable timing division")]
    InvalidTiming,

    #[error("No melody found in MIDI file")]
    NoMelody,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MelodyError>;

/// Extract a bell sequence from raw MIDI bytes
pub fn extract_sequence(data: &[u8]) -> Result<Sequence> {
    let midi = MidiData::from_bytes(data)?;
    extract_from_midi(&midi)
}

pub fn extract_from_midi(midi: &MidiData) -> Result<Sequence> {
    tracing::info!(tracks = midi.tracks.len(), "Analysing MIDI file");

    let selected = melody::select_melody_tracks(&midi.tracks);
    if selected.is_empty() {
        tracing::warn!("No melodic track found");
        return Err(MelodyError::NoMelody);
    }

    let notes = melody::collect_notes(&midi.tracks, &selected);
    if notes.is_empty() {
        tracing::warn!("No notes extracted");
        return Err(MelodyError::NoMelody);
    }

    let grid = melody::TimeGrid::new(&notes, midi.ticks_per_beat);
    let voice = grid.monophonic();
    let sequence = build_sequence(&voice, midi.ticks_per_beat, midi.tempo);

    tracing::info!(notes = sequence.len(), "Melody extracted");
    Ok(sequence)
}
