//! Core types for the five-bell melody player
//!
//! This crate holds the data model shared by the extraction, playback and
//! application crates: the closed set of bells, the note events that make up a
//! melody, and the JSON shape used at the upload boundary.
//!
//! # Examples
//!
//! ```
//! use bell_core::{Bell, NoteEvent, Sequence};
//!
//! let sequence = Sequence::try_from_events(vec![
//!     NoteEvent::new(Bell::Do, 0),
//!     NoteEvent::new(Bell::Mi, 500),
//!     NoteEvent::new(Bell::Sol, 1000),
//! ])
//! .unwrap();
//!
//! assert_eq!(sequence.total_duration(), 1000);
//! ```
//!
//! # Main Components
//!
//! - **Bell**: one of `Do`, `Ré`, `Mi`, `Fa`, `Sol`
//! - **NoteId**: the string identifier carried on the wire
//! - **NoteEvent** / **Sequence**: a melody as absolute millisecond offsets
//! - **UploadResponse**: `{ "sequence": [...] }` or `{ "error": "..." }`

pub mod bell;
pub mod event;
pub mod wire;

pub use bell::{Bell, NoteId, UnknownBell};
pub use event::{NoteEvent, Sequence, SequenceError};
pub use wire::UploadResponse;
