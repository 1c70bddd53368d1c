use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::path::Path;

use crate::{MelodyError, Result};

/// Default tempo: 120 BPM = 500000 microseconds per beat
pub const DEFAULT_TEMPO: u32 = 500_000;

/// MIDI channel 10, reserved for percussion
const PERCUSSION_CHANNEL: u8 = 9;

/// A sounding note, in absolute ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSpan {
    pub pitch: u8,
    pub start: u64,
    pub end: u64,
    pub velocity: u8,
}

#[derive(Debug, Clone)]
pub struct TrackData {
    pub index: usize,
    /// Key of every note-on with a non-zero velocity, in file order
    pub note_ons: Vec<u8>,
    /// Completed notes, in the order their note-off arrived
    pub notes: Vec<NoteSpan>,
    pub is_percussion: bool,
    /// Largest delta time seen in the track
    pub max_delta: u32,
}

pub struct MidiData {
    pub ticks_per_beat: u32,
    pub tempo: u32,
    pub tracks: Vec<TrackData>,
}

impl MidiData {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data).map_err(|e| MelodyError::Parse(e.to_string()))?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int() as u32,
            Timing::Timecode(fps, subframe) => {
                // Convert timecode to ticks per beat approximation
                (fps.as_f32() * subframe as f32 * 4.0) as u32
            }
        };
        if ticks_per_beat == 0 {
            return Err(MelodyError::InvalidTiming);
        }

        let tempo = Self::extract_tempo(&smf);
        let tracks = smf
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| collect_track(index, track))
            .collect();

        Ok(MidiData {
            ticks_per_beat,
            tempo,
            tracks,
        })
    }

    fn extract_tempo(smf: &Smf) -> u32 {
        for track in &smf.tracks {
            for event in track {
                if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                    return tempo.as_int();
                }
            }
        }
        DEFAULT_TEMPO
    }
}

fn collect_track(index: usize, track: &[midly::TrackEvent]) -> TrackData {
    let mut abs_time: u64 = 0;
    let mut max_delta = 0;
    let mut is_percussion = false;
    let mut note_ons = Vec::new();
    let mut notes = Vec::new();
    // key -> (start tick, velocity)
    let mut active: HashMap<u8, (u64, u8)> = HashMap::new();

    for event in track {
        let delta = event.delta.as_int();
        abs_time += delta as u64;
        max_delta = max_delta.max(delta);

        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        if channel.as_int() == PERCUSSION_CHANNEL {
            is_percussion = true;
        }

        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                note_ons.push(key.as_int());
                active.insert(key.as_int(), (abs_time, vel.as_int()));
            }
            // note_off, or note_on with velocity 0
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                if let Some((start, velocity)) = active.remove(&key.as_int()) {
                    notes.push(NoteSpan {
                        pitch: key.as_int(),
                        start,
                        end: abs_time,
                        velocity,
                    });
                }
            }
            _ => {}
        }
    }

    TrackData {
        index,
        note_ons,
        notes,
        is_percussion,
        max_delta,
    }
}

/// Convert ticks to whole milliseconds, truncating
pub fn ticks_to_ms(ticks: u64, ticks_per_beat: u32, tempo: u32) -> u64 {
    let micros = ticks as u128 * tempo as u128 / ticks_per_beat as u128;
    (micros / 1000) as u64
}
