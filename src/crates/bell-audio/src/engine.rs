//! Audio output engine using cpal
//!
//! Owns the output device and the running stream. `cpal::Stream` is not
//! `Send`, so the engine stays on the thread that created it.

use crate::{AudioError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;

pub struct AudioEngine {
    device: Device,
    config: StreamConfig,
    stream: Mutex<Option<Stream>>,
}

impl AudioEngine {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceError("No output device available".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceError(format!("Failed to get default config: {}", e)))?;

        if let Ok(name) = device.name() {
            tracing::info!(
                device = %name,
                sample_rate = config.sample_rate().0,
                channels = config.channels(),
                "Opened audio output"
            );
        }

        Ok(AudioEngine {
            device,
            config: config.into(),
            stream: Mutex::new(None),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> usize {
        self.config.channels as usize
    }

    /// Start the output stream
    ///
    /// `callback` fills each interleaved output buffer; `on_error` is called
    /// from the audio thread when the device fails.
    pub fn start<F, E>(&self, mut callback: F, on_error: E) -> Result<()>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
        E: FnMut(cpal::StreamError) + Send + 'static,
    {
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback(data),
                on_error,
                None,
            )
            .map_err(|e| AudioError::DeviceError(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::DeviceError(format!("Failed to play stream: {}", e)))?;

        *self.stream.lock() = Some(stream);
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        if let Some(stream) = self.stream.lock().take() {
            stream
                .pause()
                .map_err(|e| AudioError::DeviceError(format!("Failed to stop stream: {}", e)))?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.stream.lock().is_some()
    }
}
