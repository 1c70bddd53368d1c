//! JSON shape of the upload boundary
//!
//! Success: `{ "sequence": [{ "note": "Do", "time": 0 }, ...] }`
//! Failure: `{ "error": "message" }`
//!
//! Extra fields (file name, per-track summaries) are ignored when decoding.

use crate::Sequence;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    // Listed first so a body carrying an error wins over a partial sequence.
    Error { error: String },
    Sequence { sequence: Sequence },
}

impl UploadResponse {
    pub fn success(sequence: Sequence) -> Self {
        UploadResponse::Sequence { sequence }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        UploadResponse::Error {
            error: error.into(),
        }
    }

    pub fn into_result(self) -> Result<Sequence, String> {
        match self {
            UploadResponse::Sequence { sequence } => Ok(sequence),
            UploadResponse::Error { error } => Err(error),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
