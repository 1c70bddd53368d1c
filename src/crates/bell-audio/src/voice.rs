//! A single playing bell clip

use crate::Sample;
use std::sync::Arc;

/// Playback state of one clip
///
/// A voice always starts at the beginning of its clip. Restarting a bell
/// means replacing its voice with a fresh one.
pub struct Voice {
    sample: Arc<Sample>,
    /// Current playback position, in source frames
    position: f64,
    gain: f32,
    active: bool,
}

impl Voice {
    pub fn new(sample: Arc<Sample>) -> Self {
        Voice {
            sample,
            position: 0.0,
            gain: 1.0,
            active: true,
        }
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain.clamp(0.0, 1.0);
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Next stereo frame (L, R), or `None` once the clip has finished
    pub fn next_frame(&mut self, output_sample_rate: u32) -> Option<(f32, f32)> {
        if !self.active {
            return None;
        }

        if self.position >= self.sample.frames() as f64 {
            self.active = false;
            return None;
        }

        let (left, right) = if self.sample.channels == 1 {
            let value = self.interpolate(self.position, 0);
            (value, value)
        } else {
            (self.interpolate(self.position, 0), self.interpolate(self.position, 1))
        };

        self.position += self.sample.sample_rate as f64 / output_sample_rate as f64;

        Some((left * self.gain, right * self.gain))
    }

    /// Linear interpolation between two neighbouring frames of one channel
    fn interpolate(&self, frame_position: f64, channel: usize) -> f32 {
        let data = &self.sample.data;
        let channels = self.sample.channels as usize;
        let base = (frame_position.floor() as usize) * channels + channel;

        let Some(&current) = data.get(base) else {
            return 0.0;
        };
        let Some(&next) = data.get(base + channels) else {
            return current;
        };

        let fraction = (frame_position - frame_position.floor()) as f32;
        current + (next - current) * fraction
    }

    /// Mix this voice into an interleaved output buffer
    ///
    /// Mono outputs get the average of both sides; outputs with more than two
    /// channels get the stereo pair on the first two and silence elsewhere.
    pub fn fill_buffer(&mut self, buffer: &mut [f32], output_sample_rate: u32, output_channels: usize) {
        if output_channels == 0 {
            return;
        }
        for frame in buffer.chunks_mut(output_channels) {
            let Some((left, right)) = self.next_frame(output_sample_rate) else {
                break;
            };
            match frame {
                [mono] => *mono += (left + right) * 0.5,
                [l, r, ..] => {
                    *l += left;
                    *r += right;
                }
                [] => {}
            }
        }
    }
}
