//! Upload boundary: MIDI file in, bell sequence out

use async_trait::async_trait;
use bell_core::{Sequence, SequenceError, UploadResponse};
use midi_to_bells::MelodyError;
use std::path::Path;

/// Largest accepted MIDI file
pub const MAX_UPLOAD_BYTES: u64 = 5_000_000;

/// Extensions accepted at the boundary, compared case-insensitively
pub const MIDI_EXTENSIONS: [&str; 2] = ["mid", "midi"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file type '{0}', expected a .mid or .midi file")]
    UnsupportedType(String),

    #[error("File is too large ({size} bytes, limit is {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Invalid sequence: {0}")]
    InvalidSequence(#[from] SequenceError),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Melody(#[from] MelodyError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check a file against the boundary rules before reading or sending it
pub fn check_upload(path: &Path, len: u64) -> Result<(), UploadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if !MIDI_EXTENSIONS.iter().any(|ext| extension.eq_ignore_ascii_case(ext)) {
        return Err(UploadError::UnsupportedType(path.display().to_string()));
    }
    check_size(len)
}

fn check_size(len: u64) -> Result<(), UploadError> {
    if len > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size: len,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Turn a MIDI file into a playable sequence
///
/// A successful result is non-empty and sorted by time.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    async fn submit(&self, bytes: Vec<u8>) -> Result<Sequence, UploadError>;
}

/// Extracts the melody in-process
#[derive(Debug, Default, Clone)]
pub struct LocalGateway;

#[async_trait]
impl UploadGateway for LocalGateway {
    async fn submit(&self, bytes: Vec<u8>) -> Result<Sequence, UploadError> {
        check_size(bytes.len() as u64)?;

        let sequence = tokio::task::spawn_blocking(move || midi_to_bells::extract_sequence(&bytes))
            .await
            .map_err(|e| UploadError::Rejected(format!("extraction task failed: {}", e)))??;

        sequence.validate()?;
        Ok(sequence)
    }
}

/// Sends the file to a remote melody extraction service
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpGateway {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/upload_midi", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl UploadGateway for HttpGateway {
    async fn submit(&self, bytes: Vec<u8>) -> Result<Sequence, UploadError> {
        check_size(bytes.len() as u64)?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("melody.mid")
            .mime_str("audio/midi")?;
        let form = reqwest::multipart::Form::new().part("midi_file", part);

        let url = self.endpoint();
        tracing::debug!(%url, "Uploading MIDI file");
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        decode_response(status, &body)
    }
}

/// Decode the extraction service's reply
///
/// A non-2xx status is treated like an error body, whatever the payload.
pub fn decode_response(status: u16, body: &str) -> Result<Sequence, UploadError> {
    let parsed = serde_json::from_str::<UploadResponse>(body);

    if !(200..300).contains(&status) {
        let message = match parsed {
            Ok(UploadResponse::Error { error }) => error,
            _ => format!("server responded with status {}", status),
        };
        return Err(UploadError::Rejected(message));
    }

    let response = parsed.map_err(|e| UploadError::Malformed(e.to_string()))?;
    let sequence = response.into_result().map_err(UploadError::Rejected)?;
    sequence.validate()?;
    Ok(sequence)
}
