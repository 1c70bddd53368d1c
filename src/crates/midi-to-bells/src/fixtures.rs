//! In-memory MIDI files for tests

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

pub enum Ev {
    On(u8, u8),
    Off(u8),
    Tempo(u32),
}

/// A track on `channel`; each entry is (delta ticks, event)
pub fn track(channel: u8, events: &[(u32, Ev)]) -> Vec<TrackEvent<'static>> {
    let mut out: Vec<TrackEvent<'static>> = events
        .iter()
        .map(|(delta, ev)| {
            let kind = match *ev {
                Ev::On(key, vel) => TrackEventKind::Midi {
                    channel: u4::new(channel),
                    message: MidiMessage::NoteOn {
                        key: u7::new(key),
                        vel: u7::new(vel),
                    },
                },
                Ev::Off(key) => TrackEventKind::Midi {
                    channel: u4::new(channel),
                    message: MidiMessage::NoteOff {
                        key: u7::new(key),
                        vel: u7::new(0),
                    },
                },
                Ev::Tempo(tempo) => TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo))),
            };
            TrackEvent {
                delta: u28::new(*delta),
                kind,
            }
        })
        .collect();

    out.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    out
}

/// Consecutive notes on one channel: (key, length in ticks), no gaps
pub fn melody_track(channel: u8, notes: &[(u8, u32)]) -> Vec<TrackEvent<'static>> {
    let mut events = Vec::new();
    for &(key, length) in notes {
        events.push((0, Ev::On(key, 100)));
        events.push((length, Ev::Off(key)));
    }
    track(channel, &events)
}

pub fn smf_bytes(ticks_per_beat: u16, tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
    let format = if tracks.len() == 1 {
        Format::SingleTrack
    } else {
        Format::Parallel
    };
    let mut smf = Smf::new(Header::new(format, Timing::Metrical(u15::new(ticks_per_beat))));
    smf.tracks = tracks;

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}
