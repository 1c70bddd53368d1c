//! The five bells and the identifiers that name them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five bells, in scale order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bell {
    #[serde(rename = "Do")]
    Do,
    #[serde(rename = "Ré", alias = "Re")]
    Re,
    #[serde(rename = "Mi")]
    Mi,
    #[serde(rename = "Fa")]
    Fa,
    #[serde(rename = "Sol")]
    Sol,
}

impl Bell {
    /// All bells in scale order
    pub const ALL: [Bell; 5] = [Bell::Do, Bell::Re, Bell::Mi, Bell::Fa, Bell::Sol];

    /// Display name used on the wire (`"Do"`, `"Ré"`, ...)
    pub fn name(self) -> &'static str {
        match self {
            Bell::Do => "Do",
            Bell::Re => "Ré",
            Bell::Mi => "Mi",
            Bell::Fa => "Fa",
            Bell::Sol => "Sol",
        }
    }

    /// Pitch class of the bell (C = 0)
    pub fn pitch_class(self) -> u8 {
        match self {
            Bell::Do => 0,
            Bell::Re => 2,
            Bell::Mi => 4,
            Bell::Fa => 5,
            Bell::Sol => 7,
        }
    }

    /// Position of the bell in [`Bell::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase ASCII stem used for clip file names (`"re"` for `Ré`)
    pub fn file_stem(self) -> &'static str {
        match self {
            Bell::Do => "do",
            Bell::Re => "re",
            Bell::Mi => "mi",
            Bell::Fa => "fa",
            Bell::Sol => "sol",
        }
    }
}

impl fmt::Display for Bell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name one of the five bells
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown bell: {0}")]
pub struct UnknownBell(pub String);

impl FromStr for Bell {
    type Err = UnknownBell;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Do" => Ok(Bell::Do),
            "Ré" | "Re" => Ok(Bell::Re),
            "Mi" => Ok(Bell::Mi),
            "Fa" => Ok(Bell::Fa),
            "Sol" => Ok(Bell::Sol),
            other => Err(UnknownBell(other.to_string())),
        }
    }
}

/// Note identifier as it travels through a sequence
///
/// Kept as a string so that a sequence coming from the upload boundary can
/// carry names outside the bell set; those resolve to `None` in [`NoteId::bell`]
/// and are ignored when triggered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(name: impl Into<String>) -> Self {
        NoteId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the identifier to a bell
    pub fn bell(&self) -> Option<Bell> {
        self.0.parse().ok()
    }
}

impl From<Bell> for NoteId {
    fn from(bell: Bell) -> Self {
        NoteId(bell.name().to_string())
    }
}

impl From<&str> for NoteId {
    fn from(name: &str) -> Self {
        NoteId(name.to_string())
    }
}

impl From<String> for NoteId {
    fn from(name: String) -> Self {
        NoteId(name)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
