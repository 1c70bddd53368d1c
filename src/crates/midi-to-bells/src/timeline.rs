//! Turning a monophonic melody into a bell sequence

use bell_core::{Bell, NoteEvent, Sequence};

use crate::midi::{ticks_to_ms, NoteSpan};

/// Minimum silence between two consecutive bells
pub const MIN_GAP_MS: u64 = 250;

/// Minimum time a bell is allowed to ring before the next one
pub const MIN_DURATION_MS: u64 = 300;

/// Map a MIDI pitch to the closest bell by pitch class
///
/// Pitch classes at or below C map to `Do`, at or above G to `Sol`; the rest
/// go to the nearest bell, the lower one on ties.
pub fn nearest_bell(pitch: u8) -> Bell {
    let pitch_class = pitch % 12;
    let first = Bell::ALL[0];
    let last = Bell::ALL[Bell::ALL.len() - 1];

    if pitch_class <= first.pitch_class() {
        return first;
    }
    if pitch_class >= last.pitch_class() {
        return last;
    }

    let distance = |bell: Bell| {
        let d = (pitch_class + 12 - bell.pitch_class()) % 12;
        d.min(12 - d)
    };
    Bell::ALL
        .into_iter()
        .reduce(|best, bell| if distance(bell) < distance(best) { bell } else { best })
        .unwrap_or(first)
}

/// Lay the melody out on an absolute millisecond timeline
///
/// Every note rings for at least [`MIN_DURATION_MS`] and is followed by at
/// least [`MIN_GAP_MS`] of silence, so the output can run longer than the
/// source. Times only grow, which keeps the sequence sorted.
pub fn build_sequence(melody: &[NoteSpan], ticks_per_beat: u32, tempo: u32) -> Sequence {
    let mut events = Vec::with_capacity(melody.len());
    // End of the previous bell on the output timeline
    let mut cursor: u64 = 0;
    // End of the previous note on the source timeline
    let mut previous_end: u64 = 0;

    for (i, note) in melody.iter().enumerate() {
        let start_ms = ticks_to_ms(note.start, ticks_per_beat, tempo);
        let end_ms = ticks_to_ms(note.end, ticks_per_beat, tempo);
        let duration = end_ms.saturating_sub(start_ms).max(MIN_DURATION_MS);

        let delay = if i == 0 {
            start_ms
        } else {
            start_ms.saturating_sub(previous_end).max(MIN_GAP_MS)
        };

        let time = cursor + delay;
        events.push(NoteEvent::new(nearest_bell(note.pitch), time));

        cursor = time + duration;
        previous_end = start_ms + duration;
    }

    Sequence::new(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn span(pitch: u8, start: u64, end: u64) -> NoteSpan {
        NoteSpan { pitch, start, end, velocity: 100 }
    }

    #[test]
    fn test_nearest_bell() {
        assert_eq!(nearest_bell(60), Bell::Do); // C4
        assert_eq!(nearest_bell(61), Bell::Do); // C#: tie between Do and Ré
        assert_eq!(nearest_bell(62), Bell::Re);
        assert_eq!(nearest_bell(63), Bell::Re); // D#: tie between Ré and Mi
        assert_eq!(nearest_bell(64), Bell::Mi);
        assert_eq!(nearest_bell(65), Bell::Fa);
        assert_eq!(nearest_bell(66), Bell::Fa); // F#: tie between Fa and Sol
        assert_eq!(nearest_bell(67), Bell::Sol);
        assert_eq!(nearest_bell(69), Bell::Sol); // A and above clamp to Sol
        assert_eq!(nearest_bell(71), Bell::Sol);
    }

    #[test]
    fn test_timeline_enforces_gap_and_duration() {
        // 480 ticks per beat at 120 BPM: 1 tick = 1.0416 ms, 480 ticks = 500 ms
        let melody = [
            span(60, 480, 960),   // 500..1000 ms
            span(64, 960, 1008),  // 1000..1050 ms, too short
            span(67, 1440, 1920), // 1500..2000 ms
        ];
        let sequence = build_sequence(&melody, 480, 500_000);
        let times: Vec<u64> = sequence.iter().map(|e| e.time).collect();

        // first note keeps its offset; second waits the minimum gap after the
        // first ends; third waits 1500 - (1000 + 300) = 200 -> 250 ms
        assert_eq!(times, vec![500, 500 + 500 + 250, 1250 + 300 + 250]);

        let notes: Vec<Option<Bell>> = sequence.iter().map(|e| e.note.bell()).collect();
        assert_eq!(notes, vec![Some(Bell::Do), Some(Bell::Mi), Some(Bell::Sol)]);
    }

    #[test]
    fn test_long_rest_is_preserved() {
        let melody = [span(60, 0, 480), span(62, 4800, 5280)];
        let sequence = build_sequence(&melody, 480, 500_000);
        let times: Vec<u64> = sequence.iter().map(|e| e.time).collect();
        // rest of 5000 - 500 = 4500 ms after the first note
        assert_eq!(times, vec![0, 500 + 4500]);
    }

    proptest! {
        #[test]
        fn timeline_is_sorted_and_spaced(raw in proptest::collection::vec((0u8..128, 0u64..10_000, 1u64..2_000), 1..40)) {
            let mut melody: Vec<NoteSpan> = raw
                .into_iter()
                .map(|(pitch, start, len)| span(pitch, start, start + len))
                .collect();
            melody.sort_by_key(|n| n.start);

            let sequence = build_sequence(&melody, 480, 500_000);
            prop_assert_eq!(sequence.len(), melody.len());
            prop_assert!(sequence.validate().is_ok());
            for pair in sequence.events().windows(2) {
                prop_assert!(pair[1].time - pair[0].time >= MIN_DURATION_MS + MIN_GAP_MS);
            }
        }
    }
}
