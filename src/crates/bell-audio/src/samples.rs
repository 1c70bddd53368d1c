//! Bell clip loading
//!
//! Each bell has one clip on disk named after the bell (`do.wav`, `re.ogg`,
//! ...). Clips are decoded once with Symphonia into interleaved f32 PCM.

use crate::{AudioError, Bell, Result};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Extensions tried, in order, when looking for a bell clip
pub const CLIP_EXTENSIONS: [&str; 3] = ["wav", "ogg", "mp3"];

/// An audio clip with decoded PCM data
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    /// Interleaved f32 frames, normalized to [-1.0, 1.0]
    pub data: Arc<Vec<f32>>,
    pub sample_rate: u32,
    /// 1 = mono, 2 = stereo
    pub channels: u16,
}

impl Sample {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels.max(1) as usize
    }
}

/// Decode an audio file held in memory
///
/// `name` is used for the format hint and for error messages.
pub fn decode_audio(data: Vec<u8>, name: &str) -> Result<Sample> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::DecodeError(format!("{}: failed to probe format: {}", name, e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeError(format!("{}: no audio track", name)))?;

    let track_id = track.id;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeError(format!("{}: failed to create decoder: {}", name, e)))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2) as u16;
    let mut pcm: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(AudioError::DecodeError(format!("{}: {}", name, e))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // corrupt packet: skip it and keep going
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("{}: skipping packet: {}", name, e);
                continue;
            }
            Err(e) => return Err(AudioError::DecodeError(format!("{}: {}", name, e))),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        pcm.extend_from_slice(buf.samples());
    }

    if pcm.is_empty() {
        return Err(AudioError::DecodeError(format!("{}: no audio data", name)));
    }

    Ok(Sample {
        name: name.to_string(),
        data: Arc::new(pcm),
        sample_rate,
        channels,
    })
}

/// One decoded clip per bell
#[derive(Debug, Clone, Default)]
pub struct BellClips {
    clips: [Option<Arc<Sample>>; 5],
}

impl BellClips {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every bell clip found in `dir`
    ///
    /// Missing or undecodable clips are logged and left empty; that bell will
    /// stay silent but still ring visually.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(AudioError::SampleNotFound(format!(
                "clip directory {} does not exist",
                dir.display()
            )));
        }

        let mut clips = BellClips::new();
        for bell in Bell::ALL {
            let found = CLIP_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{}.{}", bell.file_stem(), ext)))
                .find(|path| path.is_file());

            let Some(path) = found else {
                tracing::warn!(%bell, "No clip found in {}", dir.display());
                continue;
            };

            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            match decode_audio(std::fs::read(&path)?, &name) {
                Ok(sample) => {
                    tracing::debug!(%bell, duration = sample.duration(), "Loaded clip {}", name);
                    clips.insert(bell, sample);
                }
                Err(e) => tracing::warn!(%bell, "Skipping clip: {}", e),
            }
        }

        Ok(clips)
    }

    pub fn insert(&mut self, bell: Bell, sample: Sample) {
        self.clips[bell.index()] = Some(Arc::new(sample));
    }

    pub fn get(&self, bell: Bell) -> Option<&Arc<Sample>> {
        self.clips[bell.index()].as_ref()
    }

    /// Number of bells that have a clip
    pub fn len(&self) -> usize {
        self.clips.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
