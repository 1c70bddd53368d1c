//! Note events and melody sequences

use crate::NoteId;
use serde::{Deserialize, Serialize};

/// A single bell ring, `time` milliseconds after the start of the sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub note: NoteId,
    pub time: u64,
}

impl NoteEvent {
    pub fn new(note: impl Into<NoteId>, time: u64) -> Self {
        NoteEvent {
            note: note.into(),
            time,
        }
    }
}

/// Reasons a list of events is not a playable sequence
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("Sequence is empty")]
    Empty,

    #[error("Event {index} at {time} ms comes before the previous event at {previous} ms")]
    OutOfOrder { index: usize, time: u64, previous: u64 },
}

/// An ordered melody
///
/// Times are absolute offsets and non-decreasing in array order. Playback
/// trusts that ordering; use [`Sequence::try_from_events`] or
/// [`Sequence::validate`] where the events come from outside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    events: Vec<NoteEvent>,
}

impl Sequence {
    /// Wrap events without checking them
    pub fn new(events: Vec<NoteEvent>) -> Self {
        Sequence { events }
    }

    /// Wrap events, rejecting empty or unsorted input
    pub fn try_from_events(events: Vec<NoteEvent>) -> Result<Self, SequenceError> {
        let sequence = Sequence { events };
        sequence.validate()?;
        Ok(sequence)
    }

    /// Check the non-empty and non-decreasing time invariants
    pub fn validate(&self) -> Result<(), SequenceError> {
        if self.events.is_empty() {
            return Err(SequenceError::Empty);
        }

        for (index, pair) in self.events.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(SequenceError::OutOfOrder {
                    index: index + 1,
                    time: pair[1].time,
                    previous: pair[0].time,
                });
            }
        }

        Ok(())
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Offset of the last event, 0 for an empty sequence
    pub fn total_duration(&self) -> u64 {
        self.events.last().map_or(0, |event| event.time)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteEvent> {
        self.events.iter()
    }
}

impl From<Sequence> for Vec<NoteEvent> {
    fn from(sequence: Sequence) -> Self {
        sequence.events
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a NoteEvent;
    type IntoIter = std::slice::Iter<'a, NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
