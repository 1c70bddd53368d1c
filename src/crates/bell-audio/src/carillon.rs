//! The set of playable bells and their mix into the output stream

use crate::trigger::ClipPlayer;
use crate::{AudioEngine, AudioError, Bell, BellClips, Result, Voice};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Voices = [Option<Voice>; 5];

/// Bell clips plus at most one playing voice per bell
///
/// Until [`Carillon::connect`] succeeds the carillon is offline and every
/// restart fails with [`AudioError::DeviceError`]. A device error reported by
/// the stream takes it offline again.
pub struct Carillon {
    clips: BellClips,
    voices: Arc<Mutex<Voices>>,
    online: Arc<AtomicBool>,
    gain: f32,
}

impl Carillon {
    pub fn new(clips: BellClips, gain: f32) -> Self {
        Carillon {
            clips,
            voices: Arc::new(Mutex::new(Default::default())),
            online: Arc::new(AtomicBool::new(false)),
            gain: gain.clamp(0.0, 1.0),
        }
    }

    pub fn clips(&self) -> &BellClips {
        &self.clips
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// The audio-thread side of the carillon
    pub fn mixer(&self, output_channels: usize) -> Mixer {
        Mixer {
            voices: Arc::clone(&self.voices),
            channels: output_channels,
        }
    }

    /// Route the carillon into a running output stream
    pub fn connect(&self, engine: &AudioEngine) -> Result<()> {
        let mixer = self.mixer(engine.channels());
        let sample_rate = engine.sample_rate();
        let online = Arc::clone(&self.online);

        engine.start(
            move |buffer| mixer.fill_buffer(buffer, sample_rate),
            move |err| {
                tracing::error!("Audio stream error: {}", err);
                online.store(false, Ordering::Release);
            },
        )?;

        self.online.store(true, Ordering::Release);
        tracing::info!(clips = self.clips.len(), "Carillon connected");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }
}

impl ClipPlayer for Carillon {
    fn restart(&self, bell: Bell) -> Result<()> {
        if !self.is_online() {
            return Err(AudioError::DeviceError("audio output is not available".to_string()));
        }
        let sample = self
            .clips
            .get(bell)
            .ok_or_else(|| AudioError::SampleNotFound(bell.file_stem().to_string()))?;

        self.voices.lock()[bell.index()] = Some(Voice::new(Arc::clone(sample)).with_gain(self.gain));
        Ok(())
    }
}

/// Fills output buffers from the carillon's voices
pub struct Mixer {
    voices: Arc<Mutex<Voices>>,
    channels: usize,
}

impl Mixer {
    pub fn fill_buffer(&self, buffer: &mut [f32], sample_rate: u32) {
        buffer.fill(0.0);

        let mut voices = self.voices.lock();
        for slot in voices.iter_mut() {
            if let Some(voice) = slot {
                voice.fill_buffer(buffer, sample_rate, self.channels);
                if !voice.is_active() {
                    *slot = None;
                }
            }
        }

        for s in buffer.iter_mut() {
            *s = s.clamp(-1.0, 1.0);
        }
    }

    /// Number of bells currently sounding
    pub fn active_voices(&self) -> usize {
        self.voices.lock().iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sample;

    fn clips() -> BellClips {
        let mut clips = BellClips::new();
        for bell in [Bell::Do, Bell::Mi] {
            clips.insert(
                bell,
                Sample {
                    name: bell.file_stem().to_string(),
                    data: Arc::new(vec![0.5; 4]),
                    sample_rate: 8000,
                    channels: 1,
                },
            );
        }
        clips
    }

    #[test]
    fn test_restart_fails_while_offline() {
        let carillon = Carillon::new(clips(), 1.0);
        assert!(matches!(carillon.restart(Bell::Do), Err(AudioError::DeviceError(_))));
    }

    #[test]
    fn test_restart_without_clip_fails() {
        let carillon = Carillon::new(clips(), 1.0);
        carillon.set_online(true);
        assert!(matches!(carillon.restart(Bell::Fa), Err(AudioError::SampleNotFound(_))));
    }

    #[test]
    fn test_restart_replaces_playing_voice() {
        let carillon = Carillon::new(clips(), 1.0);
        carillon.set_online(true);
        let mixer = carillon.mixer(1);

        carillon.restart(Bell::Do).unwrap();
        let mut buffer = vec![0.0; 3];
        mixer.fill_buffer(&mut buffer, 8000);
        assert_eq!(buffer, vec![0.5, 0.5, 0.5]);

        // restart rewinds: four more frames instead of one
        carillon.restart(Bell::Do).unwrap();
        let mut buffer = vec![0.0; 5];
        mixer.fill_buffer(&mut buffer, 8000);
        assert_eq!(buffer, vec![0.5, 0.5, 0.5, 0.5, 0.0]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_bells_mix_and_clip() {
        let carillon = Carillon::new(clips(), 1.0);
        carillon.set_online(true);
        let mixer = carillon.mixer(2);

        carillon.restart(Bell::Do).unwrap();
        carillon.restart(Bell::Mi).unwrap();
        let mut buffer = vec![0.9; 2];
        mixer.fill_buffer(&mut buffer, 8000);
        // stale buffer content is cleared before mixing
        assert_eq!(buffer, vec![1.0, 1.0]);
        assert_eq!(mixer.active_voices(), 2);
    }
}
